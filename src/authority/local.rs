//! In-process credential authority
//!
//! Backs interpolation with an in-memory reference store instead of a
//! network hop. This is both the library-mediated deployment mode and the
//! test double: it records every interpolation and deletion so tests can
//! assert on the exact external calls issued, and it can simulate backend
//! failure.

use super::CredentialAuthority;
use crate::binding::{BindingDocument, BindingInstance, CREDENTIAL_REF_FIELD};
use crate::error::DiagError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Authority backend resolving references from an in-memory store.
///
/// Interpolation semantics match the credential store: a `credentials`
/// object whose `credhub-ref` names a stored entry is replaced wholesale by
/// that entry's value. Unknown references and literal credential sets pass
/// through unchanged, which keeps re-interpolation of an already
/// interpolated document a no-op.
pub struct LocalAuthority {
    store: Mutex<BTreeMap<String, Value>>,
    /// Documents received by interpolate, in call order (for assertions)
    interpolations: Mutex<Vec<BindingDocument>>,
    /// Reference names received by delete_by_name, in call order
    deletions: Mutex<Vec<String>>,
    fail_next_interpolation: Mutex<Option<String>>,
    fail_next_deletion: Mutex<Option<String>>,
}

impl LocalAuthority {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(BTreeMap::new()),
            interpolations: Mutex::new(vec![]),
            deletions: Mutex::new(vec![]),
            fail_next_interpolation: Mutex::new(None),
            fail_next_deletion: Mutex::new(None),
        }
    }

    /// Seed a stored credential value under `name`.
    pub fn with_credential(self, name: impl Into<String>, value: Value) -> Self {
        self.store.lock().insert(name.into(), value);
        self
    }

    /// Number of interpolation calls issued against this authority.
    pub fn interpolation_count(&self) -> usize {
        self.interpolations.lock().len()
    }

    /// Reference names deleted, in call order.
    pub fn deleted_names(&self) -> Vec<String> {
        self.deletions.lock().clone()
    }

    /// Make the next interpolate call fail as unreachable with `reason`.
    pub fn fail_next_interpolation(&self, reason: impl Into<String>) {
        *self.fail_next_interpolation.lock() = Some(reason.into());
    }

    /// Make the next delete_by_name call fail with `reason`.
    pub fn fail_next_deletion(&self, reason: impl Into<String>) {
        *self.fail_next_deletion.lock() = Some(reason.into());
    }

    fn materialize(&self, instance: &BindingInstance) -> BindingInstance {
        let Some(credentials) = instance.credentials.as_ref() else {
            return instance.clone();
        };
        let stored = credentials
            .get(CREDENTIAL_REF_FIELD)
            .and_then(Value::as_str)
            .and_then(|reference| self.store.lock().get(reference).cloned());
        match stored {
            Some(Value::Object(value)) => BindingInstance {
                credentials: Some(value),
                extra: instance.extra.clone(),
            },
            // Unknown reference or non-object entry: literal pass-through.
            _ => instance.clone(),
        }
    }
}

impl Default for LocalAuthority {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialAuthority for LocalAuthority {
    fn name(&self) -> &str {
        "local"
    }

    async fn interpolate(&self, doc: &BindingDocument) -> Result<BindingDocument, DiagError> {
        self.interpolations.lock().push(doc.clone());

        if let Some(reason) = self.fail_next_interpolation.lock().take() {
            return Err(DiagError::InterpolationUnavailable(reason));
        }

        let mut out = BindingDocument::default();
        for offering in doc.offering_names() {
            let instances = doc
                .offering(offering)
                .unwrap_or_default()
                .iter()
                .map(|instance| self.materialize(instance))
                .collect();
            out.insert(offering, instances);
        }
        Ok(out)
    }

    async fn delete_by_name(&self, name: &str) -> Result<(), DiagError> {
        self.deletions.lock().push(name.to_string());

        if let Some(reason) = self.fail_next_deletion.lock().take() {
            return Err(DiagError::DeletionFailed {
                name: name.to_string(),
                reason,
            });
        }

        self.store.lock().remove(name);
        tracing::debug!(authority = "local", credential = %name, "deleted stored credential");
        Ok(())
    }
}
