//! Product catalog
//!
//! Listings live in `products.json` next to the message log. The catalog is
//! also the name resolver for chat contexts: a room's context id is the id of
//! the product being discussed.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::models::{ContextId, Identity, Product, Sustainability};

use super::{lock_file, ContextNameResolver, ResolveError};

const CATALOG_FILE: &str = "products.json";
const LOCK_FILE: &str = "products.json.lock";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Product {0} not found")]
    NotFound(String),

    #[error("Product {0} belongs to another seller")]
    NotOwner(String),
}

/// Fields a seller supplies for a new listing.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: Option<String>,
    pub sustainability: Sustainability,
}

/// Editable fields; `None` leaves the current value.
#[derive(Debug, Clone, Default)]
pub struct ProductEdit {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
}

/// Product listings persisted as a JSON array.
///
/// Every mutation re-reads the file under `products.json.lock` before it
/// writes, so clients sharing a data directory keep each other's listings.
pub struct ProductCatalog {
    path: PathBuf,
    lock_path: PathBuf,
    products: Vec<Product>,
}

impl ProductCatalog {
    /// Load the catalog from `data_dir`, starting empty if there is none.
    pub fn open(data_dir: &Path) -> Result<Self, CatalogError> {
        let path = data_dir.join(CATALOG_FILE);
        let products = read_catalog(&path)?;

        Ok(Self {
            lock_path: data_dir.join(LOCK_FILE),
            path,
            products,
        })
    }

    /// Re-read the file to pick up listings written by other clients.
    pub fn refresh(&mut self) -> Result<(), CatalogError> {
        self.products = read_catalog(&self.path)?;
        Ok(())
    }

    pub fn list(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: &ContextId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Create a listing owned by `owner`. Name, description and price are
    /// required.
    pub fn add(&mut self, new: NewProduct, owner: &Identity) -> Result<Product, CatalogError> {
        require("name", &new.name)?;
        require("description", &new.description)?;
        require("price", &new.price)?;

        let product = Product {
            id: ContextId::new(uuid::Uuid::new_v4().to_string()),
            name: new.name.trim().to_string(),
            description: new.description.trim().to_string(),
            price: new.price.trim().to_string(),
            image_url: new.image_url.filter(|url| !url.trim().is_empty()),
            owner_id: owner.id.clone(),
            owner_email: owner.email.clone(),
            sustainability: new.sustainability,
            created_at: Utc::now(),
            updated_at: None,
        };

        let added = product.clone();
        self.mutate(move |products| {
            products.push(product);
            Ok(())
        })?;
        tracing::debug!("Added product {} ({})", added.id, added.name);
        Ok(added)
    }

    /// Update name, description or price. Only the owner may edit.
    pub fn edit(
        &mut self,
        id: &ContextId,
        edit: ProductEdit,
        editor: &Identity,
    ) -> Result<Product, CatalogError> {
        if let Some(ref name) = edit.name {
            require("name", name)?;
        }
        if let Some(ref description) = edit.description {
            require("description", description)?;
        }
        if let Some(ref price) = edit.price {
            require("price", price)?;
        }

        self.mutate(|products| {
            let pos = owned_position(products, id, editor)?;
            let product = &mut products[pos];
            if let Some(name) = edit.name {
                product.name = name.trim().to_string();
            }
            if let Some(description) = edit.description {
                product.description = description.trim().to_string();
            }
            if let Some(price) = edit.price {
                product.price = price.trim().to_string();
            }
            product.updated_at = Some(Utc::now());
            Ok(product.clone())
        })
    }

    /// Delete a listing. Only the owner may remove it. Chats about the
    /// product stay; their context then resolves to the placeholder.
    pub fn remove(&mut self, id: &ContextId, editor: &Identity) -> Result<Product, CatalogError> {
        self.mutate(|products| {
            let pos = owned_position(products, id, editor)?;
            Ok(products.remove(pos))
        })
    }

    /// Apply `change` to the current file contents under the lock and save.
    /// Nothing is written if `change` fails.
    fn mutate<T>(
        &mut self,
        change: impl FnOnce(&mut Vec<Product>) -> Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let _lock = lock_file(&self.lock_path)?;

        self.products = read_catalog(&self.path)?;
        let out = change(&mut self.products)?;
        self.save()?;
        Ok(out)
    }

    fn save(&self) -> Result<(), CatalogError> {
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&self.products)?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ContextNameResolver for ProductCatalog {
    fn resolve(&self, context: &ContextId) -> Result<String, ResolveError> {
        self.get(context)
            .map(|p| p.name.clone())
            .ok_or_else(|| ResolveError::NotFound(context.to_string()))
    }
}

fn read_catalog(path: &Path) -> Result<Vec<Product>, CatalogError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Index of product `id`, provided `editor` owns it.
fn owned_position(
    products: &[Product],
    id: &ContextId,
    editor: &Identity,
) -> Result<usize, CatalogError> {
    let pos = products
        .iter()
        .position(|p| &p.id == id)
        .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
    if products[pos].owner_id != editor.id {
        return Err(CatalogError::NotOwner(id.to_string()));
    }
    Ok(pos)
}

fn require(field: &'static str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seller(id: &str) -> Identity {
        Identity::new(id.into(), &format!("{id}@example.org"), None)
    }

    fn listing(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: "Reusable and compostable".to_string(),
            price: "4.50".to_string(),
            image_url: None,
            sustainability: Sustainability {
                materials: vec!["bamboo".to_string()],
                carbon_footprint_kg: Some(0.2),
                recyclable: true,
                certifications: vec!["FSC".to_string()],
            },
        }
    }

    #[test]
    fn test_add_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = ProductCatalog::open(dir.path()).unwrap();
        let product = catalog.add(listing("Bamboo brush"), &seller("s1")).unwrap();

        assert_eq!(catalog.resolve(&product.id).unwrap(), "Bamboo brush");
        assert_eq!(product.owner_email, "s1@example.org");

        let reopened = ProductCatalog::open(dir.path()).unwrap();
        assert_eq!(reopened.list().len(), 1);
        assert_eq!(reopened.list()[0].sustainability.materials, vec!["bamboo"]);
    }

    #[test]
    fn test_product_ids_are_valid_contexts() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = ProductCatalog::open(dir.path()).unwrap();
        let product = catalog.add(listing("Jar"), &seller("s1")).unwrap();
        assert!(crate::rooms::validate_identifier(product.id.as_str()).is_ok());
    }

    #[test]
    fn test_required_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = ProductCatalog::open(dir.path()).unwrap();

        let mut missing = listing("Jar");
        missing.price = "  ".to_string();
        let err = catalog.add(missing, &seller("s1")).unwrap_err();
        assert!(matches!(err, CatalogError::MissingField("price")));
        assert!(catalog.list().is_empty());
    }

    #[test]
    fn test_unknown_context_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ProductCatalog::open(dir.path()).unwrap();
        let err = catalog.resolve(&ContextId::new("missing")).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(id) if id == "missing"));
    }

    #[test]
    fn test_only_owner_edits_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = ProductCatalog::open(dir.path()).unwrap();
        let owner = seller("s1");
        let product = catalog.add(listing("Jar"), &owner).unwrap();

        let edit = ProductEdit {
            price: Some("5.00".to_string()),
            ..Default::default()
        };
        let err = catalog.edit(&product.id, edit.clone(), &seller("s2")).unwrap_err();
        assert!(matches!(err, CatalogError::NotOwner(_)));

        let edited = catalog.edit(&product.id, edit, &owner).unwrap();
        assert_eq!(edited.price, "5.00");
        assert_eq!(edited.name, "Jar");
        assert!(edited.updated_at.is_some());

        assert!(matches!(
            catalog.remove(&product.id, &seller("s2")),
            Err(CatalogError::NotOwner(_))
        ));
        catalog.remove(&product.id, &owner).unwrap();
        assert!(catalog.resolve(&product.id).is_err());
    }

    #[test]
    fn test_clients_sharing_a_catalog_keep_each_others_listings() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = ProductCatalog::open(dir.path()).unwrap();
        let mut b = ProductCatalog::open(dir.path()).unwrap();

        a.add(listing("Jar"), &seller("s1")).unwrap();
        b.add(listing("Brush"), &seller("s2")).unwrap();
        assert_eq!(b.list().len(), 2);

        let reopened = ProductCatalog::open(dir.path()).unwrap();
        let names: Vec<&str> = reopened.list().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Jar", "Brush"]);
    }

    #[test]
    fn test_edit_sees_listing_added_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let mut stale = ProductCatalog::open(dir.path()).unwrap();
        let mut other = ProductCatalog::open(dir.path()).unwrap();
        let owner = seller("s1");
        let product = other.add(listing("Tote"), &owner).unwrap();

        let edit = ProductEdit {
            name: Some("Canvas tote".to_string()),
            ..Default::default()
        };
        let edited = stale.edit(&product.id, edit, &owner).unwrap();
        assert_eq!(edited.name, "Canvas tote");
    }

    #[test]
    fn test_refresh_picks_up_new_listings() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = ProductCatalog::open(dir.path()).unwrap();
        let mut seller_catalog = ProductCatalog::open(dir.path()).unwrap();
        let product = seller_catalog.add(listing("Glass bottle"), &seller("s1")).unwrap();

        assert!(watcher.resolve(&product.id).is_err());
        watcher.refresh().unwrap();
        assert_eq!(watcher.resolve(&product.id).unwrap(), "Glass bottle");
    }
}
