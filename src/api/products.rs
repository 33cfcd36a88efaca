//! Product listings: add, list, edit, remove

use anyhow::{Context, Result};

use super::client::MarketClient;
use crate::models::{ContextId, Product};
use crate::store::{NewProduct, ProductEdit};

/// List every product in the catalog (prints to stdout).
pub fn list_products(mine_only: bool) -> Result<()> {
    let client = MarketClient::new()?;
    let products = list_products_data(&client, mine_only);

    println!("\nProducts:");
    println!("{:-<60}", "");

    if products.is_empty() {
        println!("  (no products found)");
        return Ok(());
    }

    for product in products {
        print_product(product);
    }

    Ok(())
}

/// Create a listing owned by the signed-in user.
pub fn add_product(new: NewProduct) -> Result<()> {
    let mut client = MarketClient::new()?;
    let owner = client.user().clone();
    let product = client
        .catalog_mut()
        .add(new, &owner)
        .context("Failed to add product")?;

    tracing::info!("Listed {} ({})", product.name, product.id);
    println!("Product added.");
    print_product(&product);
    Ok(())
}

/// Update a listing owned by the signed-in user.
pub fn edit_product(id: &str, edit: ProductEdit) -> Result<()> {
    let mut client = MarketClient::new()?;
    let editor = client.user().clone();
    let product = client
        .catalog_mut()
        .edit(&ContextId::new(id), edit, &editor)
        .context("Failed to edit product")?;

    println!("Product updated.");
    print_product(&product);
    Ok(())
}

/// Delete a listing owned by the signed-in user.
pub fn remove_product(id: &str) -> Result<()> {
    let mut client = MarketClient::new()?;
    let editor = client.user().clone();
    let removed = client
        .catalog_mut()
        .remove(&ContextId::new(id), &editor)
        .context("Failed to remove product")?;

    println!("Removed {}.", removed.name);
    Ok(())
}

pub fn list_products_data(client: &MarketClient, mine_only: bool) -> Vec<&Product> {
    client
        .catalog()
        .list()
        .iter()
        .filter(|p| !mine_only || p.owner_id == client.user().id)
        .collect()
}

fn print_product(product: &Product) {
    println!("{} - {}", product.name, product.price);
    println!("  ID: {}", product.id);
    println!("  {}", product.description);
    println!("  Seller: {}", product.owner_email);

    let eco = &product.sustainability;
    if !eco.materials.is_empty() {
        println!("  Materials: {}", eco.materials.join(", "));
    }
    if let Some(kg) = eco.carbon_footprint_kg {
        println!("  Carbon footprint: {} kg CO2e", kg);
    }
    if eco.recyclable {
        println!("  Recyclable");
    }
    if !eco.certifications.is_empty() {
        println!("  Certified: {}", eco.certifications.join(", "));
    }
    if let Some(ref url) = product.image_url {
        println!("  Image: {}", url);
    }
    println!();
}
