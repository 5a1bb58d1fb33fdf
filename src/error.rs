//! Error types for the binding-credential and probe flows

use thiserror::Error;

/// Failures surfaced by the credential resolution lifecycle and the IP probes.
///
/// Resolution-path variants abort the request that triggered them; cleanup
/// and probe variants are reported to the caller without taking the process
/// down. Authority-facing variants carry the underlying transport or
/// protocol error text for diagnosability.
#[derive(Error, Debug)]
pub enum DiagError {
    #[error("malformed binding document: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("interpolation authority unreachable: {0}")]
    InterpolationUnavailable(String),

    #[error("interpolation authority rejected the document: {0}")]
    InterpolationRejected(String),

    #[error("service offering '{0}' not found in binding document")]
    OfferingNotFound(String),

    #[error("service offering '{0}' has no binding instances")]
    NoBindingInstances(String),

    #[error("first binding instance of '{0}' has no credentials field")]
    CredentialsFieldMissing(String),

    #[error("resolved credential set has no '{field}' field")]
    ReferenceFieldMissing { field: &'static str },

    #[error("deletion of credential '{name}' failed: {reason}")]
    DeletionFailed { name: String, reason: String },

    #[error("probe transport error for {endpoint}: {reason}")]
    ProbeTransport { endpoint: String, reason: String },
}

impl DiagError {
    /// Operator hint for the most common misconfigurations.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            DiagError::MalformedInput(_) => {
                Some("Check that VCAP_SERVICES contains a JSON object of offering -> bindings")
            }
            DiagError::InterpolationUnavailable(_) => {
                Some("Check CREDHUB_API points at a reachable interpolation authority")
            }
            DiagError::OfferingNotFound(_) => {
                Some("Check SERVICE_OFFERING_NAME matches a key in the binding document")
            }
            _ => None,
        }
    }
}
