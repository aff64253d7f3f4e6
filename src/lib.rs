//! Session core for the SLJ Textiles admin console.
//!
//! ARCHITECTURE
//! ============
//! - `session`: the holder that owns "who is signed in" and its lifecycle.
//! - `storage`: the persistence adapter caching the last confirmed session.
//! - `guard` / `routes`: the access decision in front of every protected view.
//! - `identity`: the seams to the external identity provider and profile store.
//! - `forms` / `net`: login and password-reset validation plus the REST client.
//!
//! Nothing here is a process-wide singleton. A `SessionHolder` is built
//! explicitly and handed to whatever needs to read the session.

pub mod config;
pub mod forms;
pub mod guard;
pub mod identity;
pub mod net;
pub mod routes;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::SessionConfig;
pub use guard::{GuardDecision, RouteGuard};
pub use identity::{AuthEvent, IdentityProvider, Principal, Profile, ProfileStore, ProviderError, Subscription};
pub use session::{Role, SessionHolder, SessionRecord, SessionSnapshot, SessionState};
pub use storage::{CachedSession, SessionCache, SessionStore};
