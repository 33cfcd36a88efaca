//! Room identity and inbox reconstruction
//!
//! Rooms are never stored. A room exists because messages were written under
//! its key; the inbox is rebuilt from the full message log on every view.

mod error;
pub mod inbox;
pub mod key;
pub mod transcript;

pub use error::ChatError;
pub use inbox::{InboxProjector, Projection};
pub use key::{compute_key, parse_key, validate_identifier};
pub use transcript::{recipient_name, transcript};
