//! Transaction handler for product listings and organization profiles kept in
//! private collections of a permissioned key-value store.
//!
//! Each call to [`LedgerHandler::invoke`] is one transaction: the function
//! name selects an operation, the transient map carries the private payload,
//! an [`IdentityOracle`] vouches for the caller, and at most one read and one
//! write reach the [`PrivateDataStore`].

pub mod config;
pub mod error;
pub mod handler;
pub mod invocation;
pub mod permission;
pub mod records;
pub mod routing;
pub mod storage;
pub mod validation;

pub use config::{CollectionRoute, LedgerConfig};
pub use error::{LedgerError, LedgerErrorCode, RecordKind};
pub use handler::LedgerHandler;
pub use invocation::{Function, Invocation, Response, TransientMap};
pub use permission::{CallerIdentity, IdentityError, IdentityOracle};
pub use records::{OrgInput, OrgRecord, ProductInput, ProductRecord};
pub use routing::CollectionTable;
pub use storage::{MemoryStore, PrivateDataStore, StoreError};
