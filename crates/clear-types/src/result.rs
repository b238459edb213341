//! Result codes and responses surfaced to the host

use std::fmt;

/// Numeric result code shared with the host
///
/// Values are stable across the network; hosts key retry and reporting
/// behavior off them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Code {
    /// Success
    Ok = 0,
    /// Internal failure (corrupt store value, payload serialization failure)
    InternalError = 1,
    /// Transaction kind not handled by the invoked dispatcher
    EncodingError = 2,
    /// Permission or authentication failure
    Unauthorized = 3,
    /// Malformed or conflicting input
    InvalidInput = 4,
    /// Signature does not verify
    InvalidSignature = 5,
    /// Wallet sequence mismatch
    InvalidSequence = 6,
    /// No user or account at the given address / id
    UnknownAddress = 7,
    /// Address appears more than once among signers, or user already exists
    DuplicateAddress = 8,
}

impl Code {
    /// Numeric value of the code
    pub fn value(self) -> u32 {
        self as u32
    }

    /// Check whether the code is `Ok`
    pub fn is_ok(self) -> bool {
        self == Code::Ok
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.value())
    }
}

/// Outcome of a transaction or query execution
///
/// Errors are values: a code, a human-readable log string for diagnostics,
/// and an optional data payload (query results).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// Result code
    pub code: Code,
    /// Human-readable log string
    pub log: String,
    /// Opaque data payload (canonical JSON for query results)
    pub data: Option<Vec<u8>>,
}

impl Response {
    /// Successful response without payload
    pub fn ok() -> Self {
        Response {
            code: Code::Ok,
            log: String::new(),
            data: None,
        }
    }

    /// Successful response carrying a data payload
    pub fn ok_with_data(data: Vec<u8>) -> Self {
        Response {
            code: Code::Ok,
            log: String::new(),
            data: Some(data),
        }
    }

    /// Failed response with a code and log string
    pub fn err(code: Code, log: impl Into<String>) -> Self {
        Response {
            code,
            log: log.into(),
            data: None,
        }
    }

    /// Check whether the response is successful
    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }

    /// Check whether the response is a failure
    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// Prefix the log string with a context marker
    pub fn prepend_log(mut self, context: &str) -> Self {
        if self.log.is_empty() {
            self.log = context.to_string();
        } else {
            self.log = format!("{}: {}", context, self.log);
        }
        self
    }
}
