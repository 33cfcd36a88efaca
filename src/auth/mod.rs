//! Sign-in state for the local user
//!
//! There is no remote identity service: logging in records who you are in the
//! config file, and every chat and listing command acts as that user.

pub mod identity;
pub mod session;

pub use identity::IdentityProvider;
pub use session::{login, logout, status};
