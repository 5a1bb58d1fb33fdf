//! HTTP authority speaking the CredHub wire contract
//!
//! Interpolation is `POST {base}/api/v1/interpolate` with the binding
//! document as the JSON body; the response is the same shape with every
//! credential reference expanded. Deletion is delete-by-name against
//! `{base}/api/v1/data?name={ref}`.
//!
//! The base address conventionally arrives via `CREDHUB_API`.

use super::CredentialAuthority;
use crate::binding::BindingDocument;
use crate::error::DiagError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

const INTERPOLATE_PATH: &str = "/api/v1/interpolate";
const DATA_PATH: &str = "/api/v1/data";

/// Authority backend reaching the credential store over HTTP.
pub struct HttpAuthority {
    client: reqwest::Client,
    base: Url,
}

impl HttpAuthority {
    /// Create a backend against `base` (e.g. `https://credhub.service.internal:8844`).
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .with_context(|| format!("invalid authority base URL: {base}"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path)
    }
}

#[async_trait]
impl CredentialAuthority for HttpAuthority {
    fn name(&self) -> &str {
        "http"
    }

    async fn interpolate(&self, doc: &BindingDocument) -> Result<BindingDocument, DiagError> {
        let url = self
            .endpoint(INTERPOLATE_PATH)
            .map_err(|e| DiagError::InterpolationUnavailable(e.to_string()))?;

        tracing::debug!(authority = "http", url = %url, "sending interpolate request");

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(doc)
            .send()
            .await
            .map_err(|e| DiagError::InterpolationUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                authority = "http",
                status = %status,
                error = %error_text,
                "interpolation rejected"
            );
            return Err(DiagError::InterpolationRejected(format!(
                "{status}: {error_text}"
            )));
        }

        response
            .json::<BindingDocument>()
            .await
            .map_err(|e| DiagError::InterpolationRejected(format!("invalid response shape: {e}")))
    }

    async fn delete_by_name(&self, name: &str) -> Result<(), DiagError> {
        let deletion_failed = |reason: String| DiagError::DeletionFailed {
            name: name.to_string(),
            reason,
        };

        let mut url = self
            .endpoint(DATA_PATH)
            .map_err(|e| deletion_failed(e.to_string()))?;
        url.query_pairs_mut().append_pair("name", name);

        tracing::debug!(authority = "http", url = %url, "sending deletion request");

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| deletion_failed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(deletion_failed(format!("{status}: {error_text}")));
        }

        tracing::debug!(authority = "http", credential = %name, "deletion acknowledged");
        Ok(())
    }
}
