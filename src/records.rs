use crate::error::LedgerError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

pub const PRODUCT_DOC_TYPE: &str = "product";
pub const ORG_DOC_TYPE: &str = "org";

/// Persisted product listing. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "docType")]
    pub doc_type: String,
    pub name: String,
    pub color: String,
    pub owner: String,
    pub price: i64,
}

/// Persisted organization profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRecord {
    #[serde(rename = "docType")]
    pub doc_type: String,
    pub name: String,
    pub desc: String,
    pub size: i64,
}

/// Wire field names of a transient input, used to match client keys
/// case-insensitively before decoding.
pub trait TransientFields {
    const FIELDS: &'static [&'static str];
}

/// Transient payload for `addProduct`. Absent and `null` fields decode to
/// their zero value and are caught by field validation rather than by the
/// decoder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    #[serde(rename = "docType", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub color: String,
    #[serde(deserialize_with = "null_as_default")]
    pub owner: String,
    #[serde(deserialize_with = "null_as_default")]
    pub price: i64,
}

impl TransientFields for ProductInput {
    const FIELDS: &'static [&'static str] = &["docType", "name", "color", "owner", "price"];
}

/// Transient payload for `addOrgDetails`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgInput {
    #[serde(rename = "docType", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub desc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub size: i64,
}

impl TransientFields for OrgInput {
    const FIELDS: &'static [&'static str] = &["docType", "name", "desc", "size"];
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ProductInput {
    /// Builds the stored record; any client-supplied `docType` is discarded.
    pub fn into_record(self) -> ProductRecord {
        ProductRecord {
            doc_type: PRODUCT_DOC_TYPE.to_string(),
            name: self.name,
            color: self.color,
            owner: self.owner,
            price: self.price,
        }
    }
}

impl OrgInput {
    pub fn into_record(self) -> OrgRecord {
        OrgRecord {
            doc_type: ORG_DOC_TYPE.to_string(),
            name: self.name,
            desc: self.desc,
            size: self.size,
        }
    }
}

pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, LedgerError> {
    serde_json::to_vec(record).map_err(|e| LedgerError::Encode(e.to_string()))
}

pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LedgerError> {
    serde_json::from_slice(bytes).map_err(|e| LedgerError::Decode(e.to_string()))
}
