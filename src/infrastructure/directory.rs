use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::ports::{Customer, CustomerDirectory, Product, ProductCatalog};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed seed file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("Duplicate {kind} id '{id}' in seed data")]
    Duplicate { kind: &'static str, id: String },
}

#[derive(Debug, Default, Deserialize)]
struct Seed {
    #[serde(default)]
    customers: Vec<Customer>,
    #[serde(default)]
    products: Vec<Product>,
}

/// Read-only customer and product lookups held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDirectory {
    customers: HashMap<String, Customer>,
    products: HashMap<String, Product>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{"customers": [...], "products": [...]}` from a JSON file.
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_seed_json(&raw).map_err(|e| match e {
            SeedError::Parse { source, .. } => SeedError::Parse {
                path: display,
                source,
            },
            other => other,
        })
    }

    pub fn from_seed_json(raw: &str) -> Result<Self, SeedError> {
        let seed: Seed = serde_json::from_str(raw).map_err(|source| SeedError::Parse {
            path: "<inline>".into(),
            source,
        })?;

        let mut directory = Self::new();
        for customer in seed.customers {
            if directory.customers.contains_key(&customer.id) {
                return Err(SeedError::Duplicate {
                    kind: "customer",
                    id: customer.id,
                });
            }
            directory.customers.insert(customer.id.clone(), customer);
        }
        for product in seed.products {
            if directory.products.contains_key(&product.id) {
                return Err(SeedError::Duplicate {
                    kind: "product",
                    id: product.id,
                });
            }
            directory.products.insert(product.id.clone(), product);
        }
        Ok(directory)
    }

    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.customers.insert(customer.id.clone(), customer);
        self
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.insert(product.id.clone(), product);
        self
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}

impl CustomerDirectory for InMemoryDirectory {
    fn customer(&self, id: &str) -> Result<Option<Customer>, DomainError> {
        Ok(self.customers.get(id).cloned())
    }
}

impl ProductCatalog for InMemoryDirectory {
    fn product(&self, id: &str) -> Result<Option<Product>, DomainError> {
        Ok(self.products.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"{
        "customers": [{
            "id": "C1", "name": "Jane Doe", "email": "jane@example.com",
            "address": {"street": "1 Main St", "city": "Cairo", "zipCode": "11511"},
            "paymentMethods": ["PayPal"]
        }],
        "products": [
            {"id": "P1", "name": "Lamp", "price": "12.50", "stock": 4},
            {"id": "P2", "name": "Desk", "price": "80"}
        ]
    }"#;

    #[test]
    fn loads_seed_json() {
        let dir = InMemoryDirectory::from_seed_json(SEED).unwrap();
        assert_eq!(dir.customer_count(), 1);
        assert_eq!(dir.product_count(), 2);
        let c = dir.customer("C1").unwrap().unwrap();
        assert_eq!(c.payment_methods, vec!["PayPal".to_string()]);
        assert_eq!(dir.product("P2").unwrap().unwrap().stock, 0);
        assert!(dir.product("P3").unwrap().is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = r#"{"products": [
            {"id": "P1", "name": "Lamp", "price": "1"},
            {"id": "P1", "name": "Lamp again", "price": "2"}
        ]}"#;
        assert!(matches!(
            InMemoryDirectory::from_seed_json(raw),
            Err(SeedError::Duplicate { kind: "product", .. })
        ));
    }

    #[test]
    fn malformed_seed_is_an_error() {
        assert!(matches!(
            InMemoryDirectory::from_seed_json(r#"{"customers": [{"id": 1}]}"#),
            Err(SeedError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = InMemoryDirectory::from_seed_file("/nonexistent/seed.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/seed.json"));
    }
}
