//! Errors raised while loading a contract or checking call arguments against it.

use crate::http::Verb;

/// Contract loading and argument-shape violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// The OpenAPI document could not be parsed.
    #[error("Failed to parse OpenAPI contract: {0}")]
    Parse(String),

    /// A verb name outside {get, post, put, delete, patch}.
    #[error("Unknown HTTP verb '{0}'")]
    UnknownVerb(String),

    /// A response status key that is neither a code, a range nor `default`.
    #[error("Invalid response status key '{0}'")]
    InvalidStatus(String),

    /// The same parameter name and location declared twice at one level.
    #[error("Duplicate parameter name '{name}' in {level} parameters of {verb} {endpoint}")]
    DuplicateParameter {
        /// Endpoint template.
        endpoint: String,
        /// Operation verb.
        verb: Verb,
        /// Either `path-level` or `operation-level`.
        level: &'static str,
        /// Offending parameter name.
        name: String,
    },

    /// The (endpoint, verb) pair is not declared.
    #[error("{verb} {endpoint} is not declared in the contract")]
    UnknownEndpoint {
        /// Endpoint template.
        endpoint: String,
        /// Operation verb.
        verb: Verb,
    },

    /// Required path parameters were not supplied.
    #[error("{verb} {endpoint} requires path parameters: {}", .missing.join(", "))]
    MissingPathParams {
        /// Endpoint template.
        endpoint: String,
        /// Operation verb.
        verb: Verb,
        /// Names that were not supplied.
        missing: Vec<String>,
    },

    /// Path parameters were supplied to an endpoint that declares none.
    #[error("{verb} {endpoint} does not take path parameters")]
    UnexpectedPathParams {
        /// Endpoint template.
        endpoint: String,
        /// Operation verb.
        verb: Verb,
    },

    /// The contract requires a request body but none was supplied.
    #[error("{verb} {endpoint} requires a request body")]
    MissingBody {
        /// Endpoint template.
        endpoint: String,
        /// Operation verb.
        verb: Verb,
    },

    /// A request body was supplied to an endpoint that declares none.
    #[error("{verb} {endpoint} does not take a request body")]
    UnexpectedBody {
        /// Endpoint template.
        endpoint: String,
        /// Operation verb.
        verb: Verb,
    },
}
