use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Failure reported by an identity provider while resolving the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct IdentityError {
    pub message: String,
}

impl IdentityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Verified facts about the caller of the current invocation.
///
/// Implementations are trusted: whatever they return is taken as proven.
/// Handlers query the oracle once per invocation and never cache the answer.
pub trait IdentityOracle {
    /// Organization (MSP) identifier of the caller.
    fn msp_id(&self) -> Result<String, IdentityError>;

    /// Value of a named credential attribute, `None` when the caller's
    /// credential does not carry it.
    fn attribute_value(&self, name: &str) -> Result<Option<String>, IdentityError>;
}

/// Fixed caller identity, used by the command-line driver and in tests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub msp_id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl CallerIdentity {
    pub fn new(msp_id: impl Into<String>) -> Self {
        Self {
            msp_id: msp_id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

impl IdentityOracle for CallerIdentity {
    fn msp_id(&self) -> Result<String, IdentityError> {
        Ok(self.msp_id.clone())
    }

    fn attribute_value(&self, name: &str) -> Result<Option<String>, IdentityError> {
        Ok(self.attributes.get(name).cloned())
    }
}

/// Succeeds only when the caller belongs to `required_msp`.
pub fn require_organization(
    identity: &dyn IdentityOracle,
    required_msp: &str,
) -> Result<String, LedgerError> {
    let msp_id = identity.msp_id()?;
    if msp_id != required_msp {
        return Err(LedgerError::PermissionDenied(format!(
            "caller organization '{msp_id}' may not perform this operation; requires '{required_msp}'"
        )));
    }
    Ok(msp_id)
}

#[cfg(test)]
mod tests {
    use super::{CallerIdentity, IdentityError, IdentityOracle, require_organization};
    use crate::error::LedgerErrorCode;

    struct BrokenOracle;

    impl IdentityOracle for BrokenOracle {
        fn msp_id(&self) -> Result<String, IdentityError> {
            Err(IdentityError::new("certificate unavailable"))
        }

        fn attribute_value(&self, _name: &str) -> Result<Option<String>, IdentityError> {
            Err(IdentityError::new("certificate unavailable"))
        }
    }

    #[test]
    fn static_identity_reports_attributes() {
        let caller = CallerIdentity::new("Org1MSP").with_attribute("pID", "GRP1");
        assert_eq!(caller.msp_id().expect("msp"), "Org1MSP");
        assert_eq!(
            caller.attribute_value("pID").expect("attr"),
            Some("GRP1".to_string())
        );
        assert_eq!(caller.attribute_value("role").expect("attr"), None);
    }

    #[test]
    fn organization_check_rejects_other_msps() {
        let caller = CallerIdentity::new("RetailerMSP");
        let err = require_organization(&caller, "ManufacturerMSP").expect_err("wrong msp");
        assert_eq!(err.code(), LedgerErrorCode::PermissionDenied);

        let caller = CallerIdentity::new("ManufacturerMSP");
        assert_eq!(
            require_organization(&caller, "ManufacturerMSP").expect("allowed"),
            "ManufacturerMSP"
        );
    }

    #[test]
    fn oracle_failure_surfaces_as_identity_error() {
        let err = require_organization(&BrokenOracle, "ManufacturerMSP").expect_err("oracle down");
        assert_eq!(err.code(), LedgerErrorCode::Identity);
        assert_eq!(err.to_string(), "identity error: certificate unavailable");
    }
}
