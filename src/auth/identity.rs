//! Identity storage

use crate::models::Identity;

/// Identity store trait for different storage backends
pub trait IdentityProvider {
    fn current_user(&self) -> Option<Identity>;
    fn set_user(&mut self, identity: Identity);
    fn clear_user(&mut self);
}
