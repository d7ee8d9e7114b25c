use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const DEFAULT_MANUFACTURER_MSP: &str = "ManufacturerMSP";
pub const DEFAULT_PRODUCT_COLLECTION: &str = "collectionProducts";
pub const DEFAULT_ROUTING_ATTRIBUTE: &str = "pID";
pub const DEFAULT_ORG_COLLECTION_PRIMARY: &str = "collection1PrivateProducts";
pub const DEFAULT_ORG_COLLECTION_SECONDARY: &str = "collection2PrivateProducts";

/// Maps one credential attribute value to the private collection that holds
/// organization records for callers carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRoute {
    pub attribute_value: String,
    pub collection: String,
}

impl CollectionRoute {
    pub fn new(attribute_value: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            attribute_value: attribute_value.into(),
            collection: collection.into(),
        }
    }
}

/// Process-wide configuration for a ledger handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Organization allowed to create product records.
    pub manufacturer_msp: String,
    pub product_collection: String,
    /// Credential attribute consulted for organization-record routing.
    pub routing_attribute: String,
    pub org_collections: Vec<CollectionRoute>,
    pub max_transient_bytes: usize,
    pub max_key_bytes: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            manufacturer_msp: DEFAULT_MANUFACTURER_MSP.to_string(),
            product_collection: DEFAULT_PRODUCT_COLLECTION.to_string(),
            routing_attribute: DEFAULT_ROUTING_ATTRIBUTE.to_string(),
            org_collections: vec![
                CollectionRoute::new("GRP1", DEFAULT_ORG_COLLECTION_PRIMARY),
                CollectionRoute::new("GRP2", DEFAULT_ORG_COLLECTION_SECONDARY),
            ],
            max_transient_bytes: 1024 * 1024,
            max_key_bytes: 1024,
        }
    }
}

impl LedgerConfig {
    pub fn with_manufacturer_msp(mut self, msp_id: impl Into<String>) -> Self {
        self.manufacturer_msp = msp_id.into();
        self
    }

    pub fn with_product_collection(mut self, collection: impl Into<String>) -> Self {
        self.product_collection = collection.into();
        self
    }

    pub fn with_routing_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.routing_attribute = attribute.into();
        self
    }

    /// Replaces the whole attribute routing table.
    pub fn with_org_collections(mut self, routes: Vec<CollectionRoute>) -> Self {
        self.org_collections = routes;
        self
    }

    pub fn with_max_transient_bytes(mut self, max_bytes: usize) -> Self {
        self.max_transient_bytes = max_bytes;
        self
    }

    pub fn with_max_key_bytes(mut self, max_bytes: usize) -> Self {
        self.max_key_bytes = max_bytes;
        self
    }

    /// Every collection the handler may touch, product collection first.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names = vec![self.product_collection.clone()];
        names.extend(self.org_collections.iter().map(|r| r.collection.clone()));
        names
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.manufacturer_msp.is_empty() {
            return Err(invalid("manufacturer_msp must not be empty"));
        }
        if self.product_collection.is_empty() {
            return Err(invalid("product_collection must not be empty"));
        }
        if self.routing_attribute.is_empty() {
            return Err(invalid("routing_attribute must not be empty"));
        }
        if self.max_transient_bytes == 0 {
            return Err(invalid("max_transient_bytes must be > 0"));
        }
        if self.max_key_bytes == 0 {
            return Err(invalid("max_key_bytes must be > 0"));
        }
        if self.org_collections.is_empty() {
            return Err(invalid("org_collections must contain at least one route"));
        }

        let mut values = BTreeSet::new();
        let mut collections = BTreeSet::new();
        for route in &self.org_collections {
            if route.attribute_value.is_empty() || route.collection.is_empty() {
                return Err(invalid(
                    "org collection routes need a non-empty attribute value and collection",
                ));
            }
            // Two routes for the same value leave the later collection unreachable.
            if !values.insert(route.attribute_value.as_str()) {
                return Err(invalid(format!(
                    "attribute value '{}' is routed more than once",
                    route.attribute_value
                )));
            }
            if !collections.insert(route.collection.as_str()) {
                return Err(invalid(format!(
                    "collection '{}' is the target of more than one route",
                    route.collection
                )));
            }
            if route.collection == self.product_collection {
                return Err(invalid(format!(
                    "collection '{}' cannot hold both products and organizations",
                    route.collection
                )));
            }
        }
        Ok(())
    }

    /// Parses a JSON config document; absent fields take their defaults.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, LedgerError> {
        let config: Self =
            serde_json::from_slice(bytes).map_err(|e| invalid(format!("parse: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let bytes = fs::read(path)?;
        Self::from_json_slice(&bytes)
    }
}

fn invalid(message: impl Into<String>) -> LedgerError {
    LedgerError::InvalidConfig {
        message: message.into(),
    }
}
