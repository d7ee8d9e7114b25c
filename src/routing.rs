use crate::config::{CollectionRoute, LedgerConfig};
use crate::error::LedgerError;
use crate::permission::IdentityOracle;
use std::collections::BTreeMap;

/// Lookup from credential attribute value to the private collection holding
/// organization records for that value.
///
/// Resolution is a pure function of the attribute value, so a record written
/// under one value is only reachable by callers presenting the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionTable {
    attribute: String,
    routes: BTreeMap<String, String>,
}

impl CollectionTable {
    pub fn new(attribute: impl Into<String>, routes: &[CollectionRoute]) -> Self {
        Self {
            attribute: attribute.into(),
            routes: routes
                .iter()
                .map(|r| (r.attribute_value.clone(), r.collection.clone()))
                .collect(),
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.routing_attribute.clone(), &config.org_collections)
    }

    /// Name of the credential attribute this table routes on.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn collection_for(&self, attribute_value: &str) -> Option<&str> {
        self.routes.get(attribute_value).map(String::as_str)
    }

    /// Maps an attribute lookup result to a collection. A missing attribute and
    /// an unrouted value are both treated as an unknown user.
    pub fn resolve(&self, attribute_value: Option<&str>) -> Result<&str, LedgerError> {
        attribute_value
            .and_then(|value| self.collection_for(value))
            .ok_or_else(|| LedgerError::PermissionDenied("not a valid user".into()))
    }

    /// Queries the caller's routing attribute and resolves its collection.
    pub fn resolve_caller(&self, identity: &dyn IdentityOracle) -> Result<&str, LedgerError> {
        let value = identity.attribute_value(&self.attribute)?;
        self.resolve(value.as_deref())
    }
}
