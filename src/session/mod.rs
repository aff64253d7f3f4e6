//! Session state and its single writer.
//!
//! DESIGN
//! ======
//! State is split the same way consumers use it: `record` for the principal
//! data, `state` for the published value, `holder` for the lifecycle that
//! drives transitions.

mod holder;
mod record;
mod state;

pub use holder::SessionHolder;
pub use record::{ADMIN_ROLE, InvalidRole, Role, SessionRecord, VIEWER_ROLE};
pub use state::{SessionSnapshot, SessionState};
