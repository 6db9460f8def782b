//! Collaborator contracts the pipeline drives but does not own: user-facing notifications and
//! the application session that must be torn down when the session expires.

pub mod notifier;
pub mod session;

pub use notifier::*;
pub use session::*;
