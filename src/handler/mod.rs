use crate::config::LedgerConfig;
use crate::error::{LedgerError, RecordKind, StoreAction};
use crate::invocation::{Function, Invocation, Response};
use crate::permission::{IdentityOracle, require_organization};
use crate::records::{OrgInput, ProductInput, encode_record};
use crate::routing::CollectionTable;
use crate::storage::PrivateDataStore;
use crate::validation::{
    check_arity, check_key_len, transient_input, validate_org_input, validate_product_input,
};
use tracing::{debug, info, warn};


/// Routes invocations to the product and organization operations.
///
/// The handler keeps no state between invocations other than its
/// configuration. Each operation validates input and checks authorization
/// before its single store write, so a failed invocation never writes.
#[derive(Debug, Clone)]
pub struct LedgerHandler {
    config: LedgerConfig,
    collections: CollectionTable,
}

impl LedgerHandler {
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let collections = CollectionTable::from_config(&config);
        Ok(Self {
            config,
            collections,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn collections(&self) -> &CollectionTable {
        &self.collections
    }

    /// Instantiation hook. Nothing is seeded.
    pub fn init(&self) -> Response {
        Response::success(Vec::new())
    }

    pub fn invoke(
        &self,
        store: &dyn PrivateDataStore,
        identity: &dyn IdentityOracle,
        invocation: &Invocation,
    ) -> Response {
        match self.dispatch(store, identity, invocation) {
            Ok(payload) => Response::success(payload),
            Err(err) => {
                warn!(
                    function = %invocation.function,
                    code = err.code_str(),
                    error = %err,
                    "invocation rejected"
                );
                Response::error(&err)
            }
        }
    }

    /// Runs exactly one operation selected by name.
    pub fn dispatch(
        &self,
        store: &dyn PrivateDataStore,
        identity: &dyn IdentityOracle,
        invocation: &Invocation,
    ) -> Result<Vec<u8>, LedgerError> {
        let Some(function) = Function::parse(&invocation.function) else {
            return Err(LedgerError::UnknownFunction(invocation.function.clone()));
        };
        debug!(%function, args = invocation.args.len(), "dispatch");
        match function {
            Function::AddProduct => self.add_product(store, identity, invocation),
            Function::AddOrgDetails => self.add_org_details(store, identity, invocation),
            Function::ReadProduct => self.read_product(store, &invocation.args),
            Function::ReadPrivateDetails => {
                self.read_private_details(store, identity, &invocation.args)
            }
        }
    }

    fn add_product(
        &self,
        store: &dyn PrivateDataStore,
        identity: &dyn IdentityOracle,
        invocation: &Invocation,
    ) -> Result<Vec<u8>, LedgerError> {
        check_arity(Function::AddProduct, &invocation.args)?;
        let input: ProductInput = transient_input(
            Function::AddProduct,
            &invocation.transient,
            self.config.max_transient_bytes,
        )?;
        validate_product_input(&input, &self.config)?;

        let msp_id = require_organization(identity, &self.config.manufacturer_msp)?;

        let collection = self.config.product_collection.as_str();
        let existing = store
            .get_private_data(collection, &input.name)
            .map_err(|source| LedgerError::Store {
                action: StoreAction::Get,
                kind: RecordKind::Product,
                key: input.name.clone(),
                source,
            })?;
        if existing.is_some() {
            return Err(LedgerError::AlreadyExists {
                kind: RecordKind::Product,
                key: input.name,
            });
        }

        let record = input.into_record();
        let bytes = encode_record(&record)?;
        store
            .put_private_data(collection, &record.name, &bytes)
            .map_err(|source| LedgerError::Store {
                action: StoreAction::Put,
                kind: RecordKind::Product,
                key: record.name.clone(),
                source,
            })?;
        info!(%collection, name = %record.name, %msp_id, "product added");
        Ok(Vec::new())
    }

    fn add_org_details(
        &self,
        store: &dyn PrivateDataStore,
        identity: &dyn IdentityOracle,
        invocation: &Invocation,
    ) -> Result<Vec<u8>, LedgerError> {
        check_arity(Function::AddOrgDetails, &invocation.args)?;
        let input: OrgInput = transient_input(
            Function::AddOrgDetails,
            &invocation.transient,
            self.config.max_transient_bytes,
        )?;
        validate_org_input(&input, &self.config)?;

        let collection = self.collections.resolve_caller(identity)?;

        // Organization records may be overwritten; there is no existence check.
        let record = input.into_record();
        let bytes = encode_record(&record)?;
        store
            .put_private_data(collection, &record.name, &bytes)
            .map_err(|source| LedgerError::Store {
                action: StoreAction::Put,
                kind: RecordKind::Organization,
                key: record.name.clone(),
                source,
            })?;
        info!(%collection, name = %record.name, "organization details added");
        Ok(Vec::new())
    }

    fn read_product(
        &self,
        store: &dyn PrivateDataStore,
        args: &[String],
    ) -> Result<Vec<u8>, LedgerError> {
        check_arity(Function::ReadProduct, args)?;
        read_record(
            store,
            &self.config.product_collection,
            &args[0],
            RecordKind::Product,
            self.config.max_key_bytes,
        )
    }

    fn read_private_details(
        &self,
        store: &dyn PrivateDataStore,
        identity: &dyn IdentityOracle,
        args: &[String],
    ) -> Result<Vec<u8>, LedgerError> {
        check_arity(Function::ReadPrivateDetails, args)?;
        let collection = self.collections.resolve_caller(identity)?;
        read_record(
            store,
            collection,
            &args[0],
            RecordKind::Organization,
            self.config.max_key_bytes,
        )
    }
}

/// Returns the stored bytes verbatim.
fn read_record(
    store: &dyn PrivateDataStore,
    collection: &str,
    name: &str,
    kind: RecordKind,
    max_key_bytes: usize,
) -> Result<Vec<u8>, LedgerError> {
    check_key_len(name, max_key_bytes)?;
    let value = store
        .get_private_data(collection, name)
        .map_err(|source| LedgerError::Store {
            action: StoreAction::Get,
            kind,
            key: name.to_string(),
            source,
        })?;
    let Some(bytes) = value else {
        return Err(LedgerError::NotFound {
            kind,
            key: name.to_string(),
        });
    };
    debug!(%collection, %name, bytes = bytes.len(), "record read");
    Ok(bytes)
}
