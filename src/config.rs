//! Environment-driven service configuration
//!
//! All knobs arrive through the platform environment: the binding document
//! in `VCAP_SERVICES` (read per request, not here), the offering to extract
//! in `SERVICE_OFFERING_NAME`, the authority base in `CREDHUB_API`, the
//! backend selection in `AUTHORITY_MODE`, and the listen port in `PORT`.

use std::fmt;

/// Offering extracted when `SERVICE_OFFERING_NAME` is not set.
pub const DEFAULT_OFFERING: &str = "credhub-read";

const DEFAULT_PORT: u16 = 8080;

/// Which authority backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityMode {
    Http,
    Local,
}

impl AuthorityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorityMode::Http => "http",
            AuthorityMode::Local => "local",
        }
    }
}

impl fmt::Display for AuthorityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address the server binds, `0.0.0.0:{PORT}`
    pub listen: String,
    /// Service offering whose first instance is extracted
    pub offering: String,
    /// Authority backend selection
    pub authority_mode: AuthorityMode,
    /// Interpolation-authority base URL (http mode)
    pub credhub_api: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let offering = lookup("SERVICE_OFFERING_NAME")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_OFFERING.to_string());

        let credhub_api = lookup("CREDHUB_API").filter(|v| !v.is_empty());

        let authority_mode = match lookup("AUTHORITY_MODE").as_deref() {
            Some(v) if v.eq_ignore_ascii_case("http") => AuthorityMode::Http,
            Some(v) if v.eq_ignore_ascii_case("local") => AuthorityMode::Local,
            Some(v) => {
                tracing::warn!(mode = %v, "unknown AUTHORITY_MODE, falling back to default");
                Self::default_mode(credhub_api.is_some())
            }
            None => Self::default_mode(credhub_api.is_some()),
        };

        let port = lookup("PORT")
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            listen: format!("0.0.0.0:{port}"),
            offering,
            authority_mode,
            credhub_api,
        }
    }

    /// HTTP when an authority address is configured, local otherwise.
    fn default_mode(has_authority_base: bool) -> AuthorityMode {
        if has_authority_base {
            AuthorityMode::Http
        } else {
            AuthorityMode::Local
        }
    }
}
