//! # Credential Authority Abstraction
//!
//! Trait and implementations for the external credential-interpolation
//! authority.
//!
//! ## Overview
//!
//! The authority module defines how binddiag talks to the credential store
//! backing the platform's service bindings:
//!
//! - [`CredentialAuthority`] - Core trait: interpolate a document, delete a
//!   credential by name
//! - [`HttpAuthority`] - Production backend speaking the CredHub wire
//!   contract over HTTP
//! - [`LocalAuthority`] - In-process backend with an in-memory reference
//!   store; also the test double
//!
//! ## Authority Trait
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait CredentialAuthority: Send + Sync {
//!     fn name(&self) -> &str;
//!     async fn interpolate(&self, doc: &BindingDocument) -> Result<BindingDocument, DiagError>;
//!     async fn delete_by_name(&self, name: &str) -> Result<(), DiagError>;
//! }
//! ```
//!
//! Both backends satisfy the same two-operation contract, so the resolution
//! flow never knows whether interpolation happens in-process or over the
//! network.
//!
//! ## Creating Authorities
//!
//! Use [`create_authority`] to instantiate a backend by mode:
//!
//! ```rust
//! use binddiag::authority::create_authority;
//!
//! let local = create_authority("local", None);
//! assert!(local.is_ok());
//!
//! let missing_base = create_authority("http", None);
//! assert!(missing_base.is_err());
//! ```

mod http;
mod local;

pub use http::HttpAuthority;
pub use local::LocalAuthority;

use crate::binding::BindingDocument;
use crate::error::DiagError;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

// ============================================================================
// AUTHORITY TRAIT
// ============================================================================

/// External credential authority reached for interpolation and retirement.
///
/// Every `interpolate` call is a fresh resolution; implementations must not
/// cache. A document without references must come back equal to its input
/// (literal values are pass-through).
#[async_trait]
pub trait CredentialAuthority: Send + Sync {
    /// Backend name (e.g. "http", "local")
    fn name(&self) -> &str;

    /// Resolve every credential reference in `doc` into its materialized
    /// value, returning the document in the same shape.
    async fn interpolate(&self, doc: &BindingDocument) -> Result<BindingDocument, DiagError>;

    /// Delete the credential-store entry behind `name`.
    async fn delete_by_name(&self, name: &str) -> Result<(), DiagError>;
}

// ============================================================================
// AUTHORITY FACTORY
// ============================================================================

/// Create an authority backend by mode.
///
/// | Mode | Description | Requires |
/// |------|-------------|----------|
/// | `http` | CredHub wire contract over HTTP | authority base URL |
/// | `local` | In-process reference store | Nothing |
pub fn create_authority(mode: &str, base: Option<&str>) -> Result<Arc<dyn CredentialAuthority>> {
    match mode.to_lowercase().as_str() {
        "http" => {
            let base = base
                .ok_or_else(|| anyhow::anyhow!("http authority requires a base URL (CREDHUB_API)"))?;
            Ok(Arc::new(HttpAuthority::new(base)?))
        }
        "local" => Ok(Arc::new(LocalAuthority::new())),
        _ => anyhow::bail!("Unknown authority mode: '{}'. Available: http, local", mode),
    }
}

// ============================================================================
// TESTS
// ============================================================================
