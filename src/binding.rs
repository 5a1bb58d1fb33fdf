//! Binding document model and parser
//!
//! A binding document is the platform-injected description of bound service
//! credentials: a JSON object mapping a service-offering name to an ordered
//! list of binding instances, each carrying a `credentials` object. The
//! conventional carrier is the `VCAP_SERVICES` environment variable.
//!
//! Only the first binding instance of an offering is ever consulted, but the
//! full document shape (including fields this service does not understand)
//! is preserved so interpolation can round-trip it to the authority.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::DiagError;

/// Credential field naming the external credential-store entry backing a set.
pub const CREDENTIAL_REF_FIELD: &str = "credhub-ref";

/// Mapping from credential field name to value.
pub type CredentialSet = Map<String, Value>;

/// Parsed binding document: offering name -> ordered binding instances.
///
/// Keys are unique by construction (JSON object). Absence of a requested
/// offering is a lookup failure, never an empty default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingDocument {
    offerings: BTreeMap<String, Vec<BindingInstance>>,
}

/// One binding under a service offering.
///
/// `credentials` is optional at parse time; its absence surfaces later as
/// [`DiagError::CredentialsFieldMissing`] when the instance is selected.
/// All other fields are carried opaquely in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingInstance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialSet>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BindingDocument {
    /// Binding instances for `offering`, input order preserved.
    pub fn offering(&self, offering: &str) -> Option<&[BindingInstance]> {
        self.offerings.get(offering).map(|v| v.as_slice())
    }

    /// Offering names present in the document.
    pub fn offering_names(&self) -> impl Iterator<Item = &str> {
        self.offerings.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.offerings.is_empty()
    }

    /// Insert an offering (test and local-authority construction).
    pub fn insert(&mut self, offering: impl Into<String>, instances: Vec<BindingInstance>) {
        self.offerings.insert(offering.into(), instances);
    }
}

impl BindingInstance {
    /// Build an instance from a credentials map.
    pub fn with_credentials(credentials: CredentialSet) -> Self {
        Self {
            credentials: Some(credentials),
            extra: Map::new(),
        }
    }
}

/// Decode a raw binding document.
///
/// Malformed input fails with [`DiagError::MalformedInput`], preserving the
/// raw decode error as context. No side effects.
pub fn parse_binding_document(raw: &str) -> Result<BindingDocument, DiagError> {
    serde_json::from_str(raw).map_err(DiagError::MalformedInput)
}
