//! Caller identity resolved by the authentication boundary.

use serde::{Deserialize, Serialize};

/// The already-authenticated caller of an operation.
///
/// Produced by the API's token extractor and passed through to the pipeline
/// untouched. The pipeline only uses it for attribution (`triggered_by`)
/// and never validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Opaque subject id issued by the identity provider.
    pub subject: String,
    /// Display username recorded on pulses the caller triggers.
    pub username: String,
}

impl CallerIdentity {
    pub fn new(subject: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            username: username.into(),
        }
    }
}
