//! Access-policy kernel: maps a session's role, origin and audit mode to the
//! set of actions the UI exposes.

pub mod kernel;
pub mod types;

pub use kernel::{compute_access_policy, UxPolicy};
pub use types::{Action, AuditFlags, PolicyParseError, Role, SessionOrigin};
