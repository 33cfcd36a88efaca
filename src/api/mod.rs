//! Command handlers for chats and product listings

mod chat;
pub mod client;
mod me;
mod products;

use anyhow::Result;

use crate::store::{NewProduct, ProductEdit};

/// List the signed-in user's chats
pub fn list_chats() -> Result<()> {
    chat::list_chats()
}

/// Read the conversation with another user, optionally following it
pub async fn read_messages(
    with: &str,
    product: Option<&str>,
    limit: usize,
    follow: bool,
) -> Result<()> {
    chat::read_messages(with, product, limit, follow).await
}

/// Send a message to another user
pub fn send_message(to: &str, product: Option<&str>, message: &str) -> Result<()> {
    chat::send_message(to, product, message)
}

/// Store a translation for a message
pub fn translate_message(message_id: &str, text: &str) -> Result<()> {
    chat::translate_message(message_id, text)
}

/// Follow the inbox as messages arrive
pub async fn watch() -> Result<()> {
    chat::watch().await
}

/// Show current user info
pub fn whoami() -> Result<()> {
    me::whoami()
}

/// List products in the catalog
pub fn list_products(mine_only: bool) -> Result<()> {
    products::list_products(mine_only)
}

/// Create a product listing
pub fn add_product(new: NewProduct) -> Result<()> {
    products::add_product(new)
}

/// Edit a product listing
pub fn edit_product(id: &str, edit: ProductEdit) -> Result<()> {
    products::edit_product(id, edit)
}

/// Remove a product listing
pub fn remove_product(id: &str) -> Result<()> {
    products::remove_product(id)
}
