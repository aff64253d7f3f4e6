//! Session state holder.
//!
//! ARCHITECTURE
//! ============
//! `SessionHolder::start` restores the cached session, opens the identity
//! provider subscription, and spawns one worker task. The worker consumes
//! provider events and sign-out commands and handles each to completion
//! before taking the next, so notification N+1 never observes half of N's
//! side effects. State goes out through a `watch` channel: readers always
//! see exactly one `SessionSnapshot`.
//!
//! LIFECYCLE
//! =========
//! `Loading` is only ever the start-up state. While a profile lookup is in
//! flight the previous state stays visible, and a sign-out arriving in the
//! meantime abandons the lookup. Teardown (drop or `shutdown`) clears the
//! liveness flag and aborts the worker; dropping the worker's future drops
//! the `Subscription`, which unsubscribes exactly once. Cache writes and
//! publication happen under the liveness lock, so nothing lands after
//! teardown returns.
//!
//! ERROR HANDLING
//! ==============
//! Nothing escapes this module. A failed profile lookup ends the session
//! locally (fail closed) and a failed provider sign-out still clears local
//! state. Both are logged.

#[cfg(test)]
#[path = "holder_test.rs"]
mod holder_test;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::record::{Role, SessionRecord};
use super::state::{SessionSnapshot, SessionState};
use crate::config::SessionConfig;
use crate::identity::{AuthEvent, IdentityProvider, Principal, Profile, ProfileDefaults, ProfileStore, ProviderError, Subscription};
use crate::storage::{CachedSession, SessionStore, now_unix};

const COMMAND_QUEUE_CAPACITY: usize = 8;

enum Command {
    SignOut(oneshot::Sender<()>),
}

/// State shared between the holder and its worker.
struct Shared {
    snapshot: watch::Sender<SessionSnapshot>,
    alive: Mutex<bool>,
}

impl Shared {
    fn is_alive(&self) -> bool {
        *self.alive.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn kill(&self) {
        *self.alive.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }

    /// Run `write` and publish `state` as one step. No-op after teardown.
    fn commit(&self, state: SessionState, confirmed: bool, write: impl FnOnce()) {
        let alive = self.alive.lock().unwrap_or_else(PoisonError::into_inner);
        if !*alive {
            return;
        }
        write();
        self.send(state, confirmed);
    }

    fn send(&self, state: SessionState, confirmed: bool) {
        let to = state.label();
        let mut from = None;
        self.snapshot.send_modify(|snapshot| {
            if snapshot.state != state {
                from = Some(snapshot.state.label());
            }
            snapshot.state = state;
            snapshot.confirmed = confirmed;
            snapshot.revision += 1;
        });
        if let Some(from) = from {
            info!(from, to, "session state changed");
        }
    }
}

/// Single source of truth for who, if anyone, is signed in.
pub struct SessionHolder {
    shared: Arc<Shared>,
    store: Arc<dyn SessionStore>,
    commands: mpsc::Sender<Command>,
    task: Option<JoinHandle<()>>,
}

impl SessionHolder {
    /// Restore the cached session and start following the identity provider.
    ///
    /// A cached record becomes the visible state immediately, unconfirmed.
    /// Without one the state is `Loading` until the provider's first event.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(
        config: &SessionConfig,
        store: Arc<dyn SessionStore>,
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        let cached = store.load().map(|cached| cached.record);
        info!(restored = cached.is_some(), "session holder starting");

        let (snapshot, _) = watch::channel(SessionSnapshot::initial(cached));
        let shared = Arc::new(Shared { snapshot, alive: Mutex::new(true) });
        let subscription = provider.subscribe();
        let (commands, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);

        let worker = Worker {
            shared: Arc::clone(&shared),
            store: Arc::clone(&store),
            provider,
            profiles,
            default_role: config.default_role.clone(),
            revalidate_after: config.revalidate_after,
        };
        let task = tokio::spawn(worker.run(subscription, command_rx));

        Self { shared, store, commands, task: Some(task) }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.shared.snapshot.borrow().state.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Whether the provider has confirmed the current state.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.shared.snapshot.borrow().confirmed
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshot.subscribe()
    }

    /// Sign out with the provider and drop the local session.
    ///
    /// Always ends `Unauthenticated` with an empty cache, even when the
    /// provider call fails or nobody was signed in.
    pub async fn sign_out(&self) {
        let (done, finished) = oneshot::channel();
        if self.commands.send(Command::SignOut(done)).await.is_ok() && finished.await.is_ok() {
            return;
        }
        warn!("session worker unavailable; clearing local session directly");
        self.shared.commit(SessionState::Unauthenticated, true, || self.store.clear());
    }

    /// Tear down and wait for the worker to finish.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.teardown() {
            let _ = task.await;
        }
    }

    fn teardown(&mut self) -> Option<JoinHandle<()>> {
        self.shared.kill();
        let task = self.task.take()?;
        task.abort();
        debug!("session holder torn down");
        Some(task)
    }
}

impl Drop for SessionHolder {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}

struct Worker {
    shared: Arc<Shared>,
    store: Arc<dyn SessionStore>,
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    default_role: Role,
    revalidate_after: Option<Duration>,
}

impl Worker {
    async fn run(self, mut subscription: Subscription, mut commands: mpsc::Receiver<Command>) {
        let mut subscribed = true;
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::SignOut(done)) => {
                        self.sign_out().await;
                        let _ = done.send(());
                    }
                    None => break,
                },
                event = subscription.next(), if subscribed => match event {
                    Some(event) => self.handle_event(event, &mut commands).await,
                    None => {
                        debug!("identity provider closed the subscription");
                        subscribed = false;
                    }
                },
            }
        }
        subscription.cancel();
        debug!("session worker stopped");
    }

    async fn handle_event(&self, event: AuthEvent, commands: &mut mpsc::Receiver<Command>) {
        match event {
            AuthEvent::SignedOut => {
                debug!("provider reported no principal");
                self.end_session();
            }
            AuthEvent::SignedIn(principal) => self.on_signed_in(principal, commands).await,
        }
    }

    async fn on_signed_in(&self, principal: Principal, commands: &mut mpsc::Receiver<Command>) {
        if !self.shared.is_alive() {
            return;
        }
        if principal.id.trim().is_empty() {
            warn!("provider reported a principal without an id; session closed");
            self.end_session();
            return;
        }

        // PHASE: CACHE SHORT-CIRCUIT
        // A fresh cache for the same principal is trusted without a lookup.
        if let Some(cached) = self.store.load().filter(|c| c.record.identity == principal.id) {
            if self.is_fresh(&cached) {
                debug!(identity = %principal.id, "cached session confirmed by provider");
                self.shared.commit(SessionState::Authenticated(cached.record), true, || {});
                return;
            }
            debug!(identity = %principal.id, "cached session stale; revalidating");
        }

        // PHASE: PROFILE RESOLUTION
        // A sign-out during the lookup drops the lookup; nothing from it is written.
        let resolved = tokio::select! {
            biased;
            command = commands.recv() => {
                if let Some(Command::SignOut(done)) = command {
                    debug!(identity = %principal.id, "sign-out abandoned profile resolution");
                    self.sign_out().await;
                    let _ = done.send(());
                }
                return;
            }
            resolved = self.resolve(&principal) => resolved,
        };

        match resolved {
            Ok(record) => {
                info!(identity = %record.identity, role = %record.role, "session authenticated");
                let cached = CachedSession::confirmed_now(record.clone());
                self.shared.commit(SessionState::Authenticated(record), true, || self.store.save(&cached));
            }
            Err(e) => {
                warn!(identity = %principal.id, error = %e, "profile resolution failed; session closed");
                self.end_session();
            }
        }
    }

    async fn resolve(&self, principal: &Principal) -> Result<SessionRecord, ProviderError> {
        let profile = match self.profiles.get_profile(&principal.id).await? {
            Some(profile) => profile,
            None => {
                info!(identity = %principal.id, role = %self.default_role, "creating default profile");
                let defaults = ProfileDefaults::for_principal(principal, self.default_role.clone());
                self.profiles.create_profile(&principal.id, defaults).await?
            }
        };
        Ok(record_from_profile(principal, profile))
    }

    fn is_fresh(&self, cached: &CachedSession) -> bool {
        let Some(window) = self.revalidate_after else {
            return true;
        };
        let window = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
        now_unix().saturating_sub(cached.confirmed_at) < window
    }

    async fn sign_out(&self) {
        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "provider sign-out failed; clearing local session anyway");
        }
        self.end_session();
        info!("signed out");
    }

    fn end_session(&self) {
        self.shared.commit(SessionState::Unauthenticated, true, || self.store.clear());
    }
}

fn record_from_profile(principal: &Principal, profile: Profile) -> SessionRecord {
    let display_name = if profile.display_name.trim().is_empty() {
        principal.label().to_owned()
    } else {
        profile.display_name
    };
    SessionRecord {
        identity: principal.id.clone(),
        display_name,
        role: profile.role,
        email: profile.email.or_else(|| principal.email.clone()),
    }
}
