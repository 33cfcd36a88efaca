//! Login, logout and status commands

use anyhow::{bail, Context, Result};

use super::IdentityProvider;
use crate::config::Config;
use crate::models::{Identity, ParticipantId};
use crate::rooms;

/// Record the signed-in user in the config file.
pub fn login(email: &str, name: Option<&str>, user_id: Option<&str>, force: bool) -> Result<()> {
    let mut config = Config::load()?;
    let identity = issue_identity(config.current_user().as_ref(), email, name, user_id, force)?;

    tracing::info!("Signed in as {} ({})", identity.display_name, identity.id);
    config.set_user(identity.clone());
    config.save()?;

    println!("Logged in as {} <{}>", identity.display_name, identity.email);
    println!("  User ID: {}", identity.id);
    Ok(())
}

/// Clear the signed-in user.
pub fn logout() -> Result<()> {
    let mut config = Config::load()?;
    config.clear_user();
    config.save()?;
    println!("Logged out.");
    Ok(())
}

/// Display current sign-in status
pub fn status() -> Result<()> {
    let config = Config::load()?;

    match config.current_user() {
        Some(user) => {
            println!("User:        {} <{}>", user.display_name, user.email);
            println!("  id:        {}", user.id);
        }
        None => println!("User:        not logged in"),
    }

    let data_dir = config.data_dir()?;
    println!("Data dir:    {}", data_dir.display());
    println!("Placeholder: {}", config.placeholder_product_name());

    Ok(())
}

/// Decide the identity for a login.
///
/// User ids are issued once: logging in again with the same e-mail keeps the
/// stored id unless `force` is set or an explicit id is given.
fn issue_identity(
    existing: Option<&Identity>,
    email: &str,
    name: Option<&str>,
    user_id: Option<&str>,
    force: bool,
) -> Result<Identity> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        bail!("'{}' is not an e-mail address", email);
    }

    let id = match (user_id, existing) {
        (Some(id), _) => {
            rooms::validate_identifier(id).context("Unusable user id")?;
            ParticipantId::new(id)
        }
        (None, Some(current)) if current.email == email && !force => current.id.clone(),
        _ => ParticipantId::new(uuid::Uuid::new_v4().to_string()),
    };

    Ok(Identity::new(id, email, name))
}
