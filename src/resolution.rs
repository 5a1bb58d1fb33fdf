//! Credential resolution and cleanup lifecycle
//!
//! [`CredentialResolver`] is the single owner of the "last resolved" slot:
//! `resolve` fills it, `cleanup` consumes it. The two entry points are two
//! halves of one coordinated unit; nothing else touches the slot.
//!
//! The slot is guarded by a mutex, making the cross-request contract an
//! explicit last-write-wins: a resolve overwrites whatever a prior request
//! stored, and a cleanup retires whichever credential set was stored most
//! recently. Successful cleanup clears the slot so a repeated cleanup does
//! not issue a second deletion for the same reference.

use crate::authority::CredentialAuthority;
use crate::binding::{parse_binding_document, CredentialSet, CREDENTIAL_REF_FIELD};
use crate::error::DiagError;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Credential set retained from the most recent successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBinding {
    /// Offering the set was extracted from
    pub offering: String,
    /// Post-interpolation credential set
    pub credentials: CredentialSet,
}

/// What a cleanup call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Nothing had been resolved yet; no deletion was issued.
    Skipped,
    /// The stored credential's backing entry was deleted by name.
    Deleted { name: String },
}

/// Resolves binding credentials through an authority and retires them later.
pub struct CredentialResolver {
    authority: Arc<dyn CredentialAuthority>,
    state: Mutex<Option<ResolvedBinding>>,
}

impl CredentialResolver {
    pub fn new(authority: Arc<dyn CredentialAuthority>) -> Self {
        Self {
            authority,
            state: Mutex::new(None),
        }
    }

    /// Parse `raw`, interpolate it, and extract the credential set of the
    /// first binding instance under `offering`.
    ///
    /// The interpolated set is stored as the current resolution (overwriting
    /// any prior one) and returned. Parse failures abort before any
    /// authority call is made.
    pub async fn resolve(&self, raw: &str, offering: &str) -> Result<CredentialSet, DiagError> {
        let doc = parse_binding_document(raw)?;
        let interpolated = self.authority.interpolate(&doc).await?;

        let instances = interpolated
            .offering(offering)
            .ok_or_else(|| DiagError::OfferingNotFound(offering.to_string()))?;
        let first = instances
            .first()
            .ok_or_else(|| DiagError::NoBindingInstances(offering.to_string()))?;
        let credentials = first
            .credentials
            .clone()
            .ok_or_else(|| DiagError::CredentialsFieldMissing(offering.to_string()))?;

        tracing::info!(
            offering = %offering,
            fields = credentials.len(),
            authority = self.authority.name(),
            "resolved binding credentials"
        );

        *self.state.lock() = Some(ResolvedBinding {
            offering: offering.to_string(),
            credentials: credentials.clone(),
        });

        Ok(credentials)
    }

    /// Retire the most recently resolved credential set.
    ///
    /// No-op when nothing has been resolved. Otherwise the stored set's
    /// `credhub-ref` field names the entry to delete; the slot is cleared
    /// only after the authority acknowledges the deletion, and only if it
    /// still holds the set that was just retired.
    pub async fn cleanup(&self) -> Result<CleanupOutcome, DiagError> {
        let stored = self.state.lock().clone();
        let Some(binding) = stored else {
            tracing::debug!("cleanup requested with nothing resolved, skipping");
            return Ok(CleanupOutcome::Skipped);
        };

        let name = match binding.credentials.get(CREDENTIAL_REF_FIELD) {
            Some(Value::String(name)) => name.clone(),
            _ => {
                return Err(DiagError::ReferenceFieldMissing {
                    field: CREDENTIAL_REF_FIELD,
                })
            }
        };

        self.authority.delete_by_name(&name).await?;

        // Consumed: a repeated cleanup must not delete the same entry twice.
        // Clear only our own generation; a resolve that landed while the
        // deletion was in flight keeps its slot for a later cleanup.
        {
            let mut slot = self.state.lock();
            if slot.as_ref() == Some(&binding) {
                *slot = None;
            }
        }
        tracing::info!(credential = %name, offering = %binding.offering, "retired credential");

        Ok(CleanupOutcome::Deleted { name })
    }

    /// Current contents of the resolution slot.
    pub fn last_resolved(&self) -> Option<ResolvedBinding> {
        self.state.lock().clone()
    }
}
