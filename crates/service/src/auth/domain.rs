use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The caller as established by a verified token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// `sub` claim; owner id of every task the caller touches.
    pub subject: String,
    pub claims: Map<String, Value>,
}
