//! HTTP verbs and response status keys as they appear in a contract.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ContractError;

/// Status codes whose responses count as success.
pub const SUCCESS_STATUSES: [u16; 10] = [200, 201, 202, 203, 204, 205, 206, 207, 208, 226];

/// Whether `status` is one of [`SUCCESS_STATUSES`].
pub fn is_success(status: u16) -> bool {
    SUCCESS_STATUSES.contains(&status)
}

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
}

impl Verb {
    /// Every verb, in declaration order.
    pub const ALL: [Verb; 5] = [Verb::Get, Verb::Post, Verb::Put, Verb::Delete, Verb::Patch];

    /// Lowercase name, matching contract keys and transport method names.
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Delete => "delete",
            Verb::Patch => "patch",
        }
    }

    /// GET is the only verb normally bound to a read hook.
    pub fn is_query(self) -> bool {
        matches!(self, Verb::Get)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for Verb {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ContractError::UnknownVerb(s.to_string()))
    }
}

/// Key of a response entry.
///
/// Contracts spell codes either as numbers or as numeric strings; both parse
/// to the same [`StatusKey::Code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusKey {
    /// An exact status code such as `404`.
    Code(u16),
    /// A class wildcard such as `4XX`; holds the leading digit.
    Range(u8),
    /// The `default` response.
    Default,
}

impl StatusKey {
    /// Whether a response under this key is a success response.
    ///
    /// `2XX` counts as success, `default` never does.
    pub fn is_success(self) -> bool {
        match self {
            StatusKey::Code(code) => is_success(code),
            StatusKey::Range(class) => class == 2,
            StatusKey::Default => false,
        }
    }

    /// Whether an actual response `status` falls under this key.
    pub fn matches(self, status: u16) -> bool {
        match self {
            StatusKey::Code(code) => code == status,
            StatusKey::Range(class) => status / 100 == u16::from(class),
            StatusKey::Default => true,
        }
    }
}

impl From<u16> for StatusKey {
    fn from(code: u16) -> Self {
        StatusKey::Code(code)
    }
}

impl FromStr for StatusKey {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("default") {
            return Ok(StatusKey::Default);
        }
        if let Ok(code) = trimmed.parse::<u16>() {
            return Ok(StatusKey::Code(code));
        }
        let bytes = trimmed.as_bytes();
        if bytes.len() == 3
            && (b'1'..=b'5').contains(&bytes[0])
            && bytes[1..].iter().all(|b| b.eq_ignore_ascii_case(&b'x'))
        {
            return Ok(StatusKey::Range(bytes[0] - b'0'));
        }
        Err(ContractError::InvalidStatus(s.to_string()))
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKey::Code(code) => write!(f, "{code}"),
            StatusKey::Range(class) => write!(f, "{class}XX"),
            StatusKey::Default => f.write_str("default"),
        }
    }
}
