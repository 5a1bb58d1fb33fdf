//! Outbound IP-family probes
//!
//! Stateless diagnostic that issues an HTTP GET against one of a fixed set
//! of external echo endpoints and classifies the returned address literal as
//! IPv4 or IPv6. Transport failures are converted into a failure report
//! carrying the error text; a probe never propagates an unhandled fault.

use once_cell::sync::Lazy;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use crate::error::DiagError;

/// One probe target: echo endpoint, the family label reported for it, and
/// the local route that triggers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeEndpoint {
    pub host: &'static str,
    pub label: &'static str,
    pub route: &'static str,
}

/// Dispatch table of echo endpoints by expected IP family.
pub static PROBE_ENDPOINTS: Lazy<Vec<ProbeEndpoint>> = Lazy::new(|| {
    vec![
        ProbeEndpoint {
            host: "api.ipify.org",
            label: "IPv4",
            route: "/ipv4-test",
        },
        ProbeEndpoint {
            host: "api6.ipify.org",
            label: "IPv6",
            route: "/ipv6-test",
        },
        ProbeEndpoint {
            host: "api64.ipify.org",
            label: "Dual stack",
            route: "/dual-stack-test",
        },
    ]
});

/// Look up the probe endpoint serving a local route.
pub fn endpoint_for_route(route: &str) -> Option<&'static ProbeEndpoint> {
    PROBE_ENDPOINTS.iter().find(|e| e.route == route)
}

/// IP family observed in a probe response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    V4,
    V6,
    /// Body present but not an address literal
    Invalid,
    /// No body observed (transport failure)
    Unknown,
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => write!(f, "IPv4"),
            IpFamily::V6 => write!(f, "IPv6"),
            IpFamily::Invalid => write!(f, "Invalid IP"),
            IpFamily::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Classify a response body as an IPv4 literal, IPv6 literal, or neither.
pub fn classify_ip(body: &str) -> IpFamily {
    match body.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => IpFamily::V4,
        Ok(IpAddr::V6(_)) => IpFamily::V6,
        Err(_) => IpFamily::Invalid,
    }
}

/// Result of one probe invocation. Created per call, never retained.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub endpoint: String,
    pub label: String,
    pub family: IpFamily,
    pub success: bool,
    pub error: Option<String>,
}

impl ProbeReport {
    fn failure(endpoint: &str, label: &str, error: String) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            label: label.to_string(),
            family: IpFamily::Unknown,
            success: false,
            error: Some(error),
        }
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} validation resulted in {}. Detected IP type is {}. Error message: {}.",
            self.label,
            if self.success { "success" } else { "failure" },
            self.family,
            self.error.as_deref().unwrap_or("none"),
        )
    }
}

/// Issues outbound probes with a short per-request timeout.
pub struct IpProbe {
    client: reqwest::Client,
}

/// Transport bound for one probe round trip.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

impl IpProbe {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build()?;
        Ok(Self { client })
    }

    /// GET `http://{host}/` and classify the body.
    ///
    /// Success requires a 2xx status, no transport error, and a non-empty
    /// body. Every failure mode is folded into the report.
    pub async fn probe(&self, host: &str, label: &str) -> ProbeReport {
        let url = format!("http://{host}/");
        tracing::debug!(endpoint = %host, %url, "probing endpoint");

        let (status, body) = match self.fetch(&url, host).await {
            Ok(ok) => ok,
            Err(err) => {
                tracing::warn!(endpoint = %host, error = %err, "probe transport failed");
                let reason = match err {
                    DiagError::ProbeTransport { reason, .. } => reason,
                    other => other.to_string(),
                };
                return ProbeReport::failure(host, label, reason);
            }
        };

        let family = classify_ip(&body);
        let success = status.is_success() && !body.trim().is_empty();
        tracing::info!(
            endpoint = %host,
            status = %status,
            family = %family,
            success,
            "probe completed"
        );

        ProbeReport {
            endpoint: host.to_string(),
            label: label.to_string(),
            family,
            success,
            error: None,
        }
    }

    /// One round trip; send and body-read failures surface as
    /// [`DiagError::ProbeTransport`].
    async fn fetch(&self, url: &str, host: &str) -> Result<(reqwest::StatusCode, String), DiagError> {
        let transport_err = |e: reqwest::Error| DiagError::ProbeTransport {
            endpoint: host.to_string(),
            reason: e.to_string(),
        };
        let response = self.client.get(url).send().await.map_err(transport_err)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_err)?;
        Ok((status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ipv4() {
        assert_eq!(classify_ip("93.184.216.34"), IpFamily::V4);
        assert_eq!(classify_ip("  10.0.0.1\n"), IpFamily::V4);
    }

    #[test]
    fn test_classify_ipv6() {
        assert_eq!(classify_ip("2606:4700:4700::1111"), IpFamily::V6);
        assert_eq!(classify_ip("::1"), IpFamily::V6);
    }

    #[test]
    fn test_classify_invalid() {
        assert_eq!(classify_ip(""), IpFamily::Invalid);
        assert_eq!(classify_ip("<html>nope</html>"), IpFamily::Invalid);
        assert_eq!(classify_ip("999.1.2.3"), IpFamily::Invalid);
    }

    #[test]
    fn test_endpoint_table_routes() {
        assert_eq!(endpoint_for_route("/ipv4-test").unwrap().host, "api.ipify.org");
        assert_eq!(endpoint_for_route("/ipv6-test").unwrap().host, "api6.ipify.org");
        assert_eq!(
            endpoint_for_route("/dual-stack-test").unwrap().label,
            "Dual stack"
        );
        assert!(endpoint_for_route("/nope").is_none());
    }

    #[test]
    fn test_report_success_message() {
        let report = ProbeReport {
            endpoint: "api6.ipify.org".to_string(),
            label: "IPv6".to_string(),
            family: IpFamily::V6,
            success: true,
            error: None,
        };
        assert_eq!(
            format!("{report}"),
            "IPv6 validation resulted in success. Detected IP type is IPv6. Error message: none."
        );
    }

    #[test]
    fn test_report_failure_message_carries_error() {
        let report = ProbeReport::failure("api.ipify.org", "IPv4", "connection refused".to_string());
        let msg = format!("{report}");
        assert!(msg.contains("IPv4 validation resulted in failure"));
        assert!(msg.contains("Detected IP type is Unknown"));
        assert!(msg.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_probe_connection_error_is_caught() {
        let probe = IpProbe::new().unwrap();
        // Port 9 (discard) is not listening; connect fails fast.
        let report = probe.probe("127.0.0.1:9", "IPv4").await;

        assert!(!report.success);
        assert_eq!(report.family, IpFamily::Unknown);
        assert!(report.error.is_some());
        assert!(!report.error.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_probe_transport() {
        let probe = IpProbe::new().unwrap();
        let err = probe
            .fetch("http://127.0.0.1:9/", "127.0.0.1:9")
            .await
            .unwrap_err();
        match err {
            DiagError::ProbeTransport { endpoint, reason } => {
                assert_eq!(endpoint, "127.0.0.1:9");
                assert!(!reason.is_empty());
            }
            other => panic!("expected ProbeTransport, got {other:?}"),
        }
    }
}
