use crate::error::LedgerError;
use std::collections::BTreeMap;

/// Private payload channel: values are used to derive writes but are never
/// persisted as supplied.
pub type TransientMap = BTreeMap<String, Vec<u8>>;

pub const STATUS_OK: u16 = 200;
pub const STATUS_ERROR: u16 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    AddProduct,
    AddOrgDetails,
    ReadProduct,
    ReadPrivateDetails,
}

impl Function {
    pub const ALL: [Function; 4] = [
        Function::AddProduct,
        Function::AddOrgDetails,
        Function::ReadProduct,
        Function::ReadPrivateDetails,
    ];

    /// Exact-match lookup; there is no fallback for unrecognized names.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "addProduct" => Some(Function::AddProduct),
            "addOrgDetails" => Some(Function::AddOrgDetails),
            "readProduct" => Some(Function::ReadProduct),
            "readPrivateDetails" => Some(Function::ReadPrivateDetails),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Function::AddProduct => "addProduct",
            Function::AddOrgDetails => "addOrgDetails",
            Function::ReadProduct => "readProduct",
            Function::ReadPrivateDetails => "readPrivateDetails",
        }
    }

    /// Required number of public arguments.
    pub fn arity(self) -> usize {
        match self {
            Function::AddProduct => 4,
            Function::AddOrgDetails => 3,
            Function::ReadProduct | Function::ReadPrivateDetails => 1,
        }
    }

    pub fn transient_key(self) -> Option<&'static str> {
        match self {
            Function::AddProduct => Some("product"),
            Function::AddOrgDetails => Some("orgDetails"),
            Function::ReadProduct | Function::ReadPrivateDetails => None,
        }
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One client-proposed transaction: a function name, the public argument
/// list, and the transient map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    pub function: String,
    pub args: Vec<String>,
    pub transient: TransientMap,
}

impl Invocation {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
            transient: TransientMap::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_transient(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.transient.insert(key.into(), value.into());
        self
    }
}

/// Outcome of one invocation as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub payload: Vec<u8>,
    pub message: String,
}

impl Response {
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            status: STATUS_OK,
            payload,
            message: String::new(),
        }
    }

    pub fn error(err: &LedgerError) -> Self {
        Self {
            status: STATUS_ERROR,
            payload: Vec::new(),
            message: err.to_error_json(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

impl From<Result<Vec<u8>, LedgerError>> for Response {
    fn from(result: Result<Vec<u8>, LedgerError>) -> Self {
        match result {
            Ok(payload) => Response::success(payload),
            Err(err) => Response::error(&err),
        }
    }
}
