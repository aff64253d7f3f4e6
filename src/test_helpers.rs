//! Test doubles for the identity provider, profile store and session cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use crate::identity::{AuthEvent, IdentityProvider, Principal, Profile, ProfileDefaults, ProfileStore, ProviderError, Subscription};
use crate::session::{Role, SessionHolder, SessionRecord, SessionSnapshot};
use crate::storage::{CachedSession, MemoryKv, SessionCache, SessionStore};

// =============================================================================
// IDENTITY PROVIDER
// =============================================================================

#[derive(Default)]
pub(crate) struct FakeIdentity {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<AuthEvent>>>,
    cancels: Arc<AtomicUsize>,
    sign_outs: AtomicUsize,
    fail_sign_out: AtomicBool,
    credentials: Mutex<HashMap<String, String>>,
}

impl FakeIdentity {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with_account(self: Arc<Self>, id: &str, secret: &str) -> Arc<Self> {
        self.credentials.lock().unwrap().insert(id.to_owned(), secret.to_owned());
        self
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        for tx in self.subscribers.lock().unwrap().iter() {
            let _ = tx.send(event.clone());
        }
    }

    pub(crate) fn sign_in(&self, id: &str) {
        self.emit(AuthEvent::SignedIn(Principal::new(id)));
    }

    pub(crate) fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub(crate) fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_sign_out(&self) {
        self.fail_sign_out.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        let cancels = Arc::clone(&self.cancels);
        Subscription::new(rx, move || {
            cancels.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("network down".into()));
        }
        Ok(())
    }

    async fn sign_in_with_credentials(&self, id: &str, secret: &str) -> Result<(), ProviderError> {
        let known = self.credentials.lock().unwrap().get(id).cloned();
        if known.as_deref() != Some(secret) {
            return Err(ProviderError::Rejected("invalid credentials".into()));
        }
        self.emit(AuthEvent::SignedIn(Principal::new(id).with_email(id)));
        Ok(())
    }
}

// =============================================================================
// PROFILE STORE
// =============================================================================

#[derive(Default)]
pub(crate) struct FakeProfiles {
    profiles: Mutex<HashMap<String, Profile>>,
    lookups: AtomicUsize,
    creates: AtomicUsize,
    fail: AtomicBool,
    gate: Option<Notify>,
}

impl FakeProfiles {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Lookups block until `release` is called once per lookup.
    pub(crate) fn gated() -> Arc<Self> {
        Arc::new(Self { gate: Some(Notify::new()), ..Self::default() })
    }

    pub(crate) fn insert(&self, id: &str, role: Role) {
        let profile = Profile { id: id.to_owned(), display_name: format!("{id} profile"), role, email: None };
        self.profiles.lock().unwrap().insert(id.to_owned(), profile);
    }

    pub(crate) fn get(&self, id: &str) -> Option<Profile> {
        self.profiles.lock().unwrap().get(id).cloned()
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub(crate) fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub(crate) fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for FakeProfiles {
    async fn get_profile(&self, principal_id: &str) -> Result<Option<Profile>, ProviderError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("profile store offline".into()));
        }
        Ok(self.get(principal_id))
    }

    async fn create_profile(&self, principal_id: &str, defaults: ProfileDefaults) -> Result<Profile, ProviderError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let profile = Profile {
            id: principal_id.to_owned(),
            display_name: defaults.display_name,
            role: defaults.role,
            email: defaults.email,
        };
        self.profiles.lock().unwrap().insert(principal_id.to_owned(), profile.clone());
        Ok(profile)
    }
}

// =============================================================================
// SESSION STORE
// =============================================================================

/// Memory-backed session cache that counts writes.
pub(crate) struct CountingStore {
    inner: SessionCache<MemoryKv>,
    saves: AtomicUsize,
    clears: AtomicUsize,
}

impl CountingStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self { inner: SessionCache::with_default_key(MemoryKv::new()), saves: AtomicUsize::new(0), clears: AtomicUsize::new(0) })
    }

    pub(crate) fn seeded(record: SessionRecord) -> Arc<Self> {
        let store = Self::new();
        store.inner.save(&CachedSession::confirmed_now(record));
        store
    }

    pub(crate) fn seeded_at(record: SessionRecord, confirmed_at: i64) -> Arc<Self> {
        let store = Self::new();
        store.inner.save(&CachedSession::new(record, confirmed_at));
        store
    }

    pub(crate) fn cached(&self) -> Option<CachedSession> {
        self.inner.load()
    }

    pub(crate) fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub(crate) fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl SessionStore for CountingStore {
    fn load(&self) -> Option<CachedSession> {
        self.inner.load()
    }

    fn save(&self, session: &CachedSession) {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(session);
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear();
    }
}

// =============================================================================
// WAITING
// =============================================================================

const WAIT_LIMIT: Duration = Duration::from_secs(2);

/// Wait until the holder has handled `revision` events or commands.
pub(crate) async fn settle(holder: &SessionHolder, revision: u64) -> SessionSnapshot {
    let mut rx = holder.watch();
    tokio::time::timeout(WAIT_LIMIT, async move {
        rx.wait_for(|s| s.revision >= revision).await.map(|s| (*s).clone())
    })
    .await
    .expect("timed out waiting for session revision")
    .expect("session holder closed")
}

/// Poll `cond` until true, yielding to the runtime between checks.
pub(crate) async fn until(cond: impl Fn() -> bool) {
    tokio::time::timeout(WAIT_LIMIT, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}
