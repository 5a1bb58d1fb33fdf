//! binddiag - diagnostic HTTP service for platform service bindings
//!
//! Validates that a platform correctly injects service-binding credentials
//! (resolving credential references through an interpolation authority and
//! retiring them afterwards) and that outbound traffic routes over
//! IPv4/IPv6/dual-stack paths.

pub mod authority;
pub mod binding;
pub mod config;
pub mod error;
pub mod probe;
pub mod resolution;
pub mod server;

pub use authority::{create_authority, CredentialAuthority, HttpAuthority, LocalAuthority};
pub use binding::{
    parse_binding_document, BindingDocument, BindingInstance, CredentialSet, CREDENTIAL_REF_FIELD,
};
pub use config::{AppConfig, AuthorityMode, DEFAULT_OFFERING};
pub use error::DiagError;
pub use probe::{classify_ip, IpFamily, IpProbe, ProbeReport, PROBE_ENDPOINTS};
pub use resolution::{CleanupOutcome, CredentialResolver, ResolvedBinding};
pub use server::{router, serve, AppState};
