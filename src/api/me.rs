//! Current user summary

use anyhow::Result;

use super::chat::list_chats_data;
use super::client::MarketClient;
use super::products::list_products_data;

/// Show who is signed in and what they have.
pub fn whoami() -> Result<()> {
    let client = MarketClient::new()?;
    let user = client.user();

    println!("Display name: {}", user.display_name);
    println!("Email:        {}", user.email);
    println!("User ID:      {}", user.id);
    println!("Chats:        {}", list_chats_data(&client).rooms.len());
    println!("Listings:     {}", list_products_data(&client, true).len());
    println!("Messages:     {} stored", client.store().len());

    Ok(())
}
