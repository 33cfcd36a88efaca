//! Data models for marketplace chat entities

mod ids;
mod message;
mod product;
mod room;
mod user;

pub use ids::*;
pub use message::*;
pub use product::*;
pub use room::*;
pub use user::*;
