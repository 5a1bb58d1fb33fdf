//! # Credential Lifecycle Integration Tests
//!
//! End-to-end coverage of the resolve -> cleanup flow through the public
//! library API, using the in-process authority as the recording backend:
//!
//! 1. Resolution returns the interpolated credential set unchanged in key set
//! 2. Lookup failures never fall back to defaults
//! 3. Parse failures abort before any authority call
//! 4. Cleanup issues exactly one deletion, keyed by the stored reference

use binddiag::{
    parse_binding_document, CleanupOutcome, CredentialResolver, DiagError, LocalAuthority,
    CREDENTIAL_REF_FIELD,
};
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// TEST HELPERS
// ============================================================================

const SCENARIO_RAW: &str =
    r#"{"credhub-read":[{"credentials":{"credhub-ref":"abc123","username":"u"}}]}"#;

fn resolver(authority: &Arc<LocalAuthority>) -> CredentialResolver {
    CredentialResolver::new(authority.clone())
}

// ============================================================================
// RESOLUTION
// ============================================================================

#[tokio::test]
async fn resolve_returns_credentials_with_key_set_unchanged() {
    let authority = Arc::new(LocalAuthority::new());
    let resolver = resolver(&authority);

    let creds = resolver.resolve(SCENARIO_RAW, "credhub-read").await.unwrap();

    let keys: Vec<&str> = creds.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["credhub-ref", "username"]);
    assert_eq!(creds.get("credhub-ref"), Some(&json!("abc123")));
    assert_eq!(creds.get("username"), Some(&json!("u")));
}

#[tokio::test]
async fn resolve_with_materialized_reference() {
    let authority = Arc::new(
        LocalAuthority::new().with_credential("abc123", json!({"username": "real", "secret": "s"})),
    );
    let resolver = resolver(&authority);

    let creds = resolver.resolve(SCENARIO_RAW, "credhub-read").await.unwrap();
    assert_eq!(creds.get("username"), Some(&json!("real")));
    assert_eq!(creds.get("secret"), Some(&json!("s")));
}

#[tokio::test]
async fn resolve_absent_offering_is_not_found_never_empty() {
    let authority = Arc::new(LocalAuthority::new());
    let resolver = resolver(&authority);

    let raw = r#"{"other-service":[{"credentials":{"a":"b"}}]}"#;
    let err = resolver.resolve(raw, "credhub-read").await.unwrap_err();

    match err {
        DiagError::OfferingNotFound(name) => assert_eq!(name, "credhub-read"),
        other => panic!("expected OfferingNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn resolve_malformed_input_makes_no_authority_call() {
    let authority = Arc::new(LocalAuthority::new());
    let resolver = resolver(&authority);

    let err = resolver.resolve(r#"{"broken""#, "credhub-read").await.unwrap_err();
    assert!(matches!(err, DiagError::MalformedInput(_)));
    assert_eq!(authority.interpolation_count(), 0);
}

// ============================================================================
// CLEANUP
// ============================================================================

#[tokio::test]
async fn cleanup_before_resolve_issues_no_deletion() {
    let authority = Arc::new(LocalAuthority::new());
    let resolver = resolver(&authority);

    assert_eq!(resolver.cleanup().await.unwrap(), CleanupOutcome::Skipped);
    assert!(authority.deleted_names().is_empty());
}

#[tokio::test]
async fn cleanup_after_resolve_deletes_exact_reference_once() {
    let authority = Arc::new(LocalAuthority::new());
    let resolver = resolver(&authority);

    resolver.resolve(SCENARIO_RAW, "credhub-read").await.unwrap();
    let outcome = resolver.cleanup().await.unwrap();

    assert_eq!(
        outcome,
        CleanupOutcome::Deleted {
            name: "abc123".to_string()
        }
    );
    assert_eq!(authority.deleted_names(), vec!["abc123".to_string()]);

    // The slot is consumed; a second cleanup is a clean no-op.
    assert_eq!(resolver.cleanup().await.unwrap(), CleanupOutcome::Skipped);
    assert_eq!(authority.deleted_names().len(), 1);
}

#[tokio::test]
async fn cleanup_failure_is_an_error_not_a_crash() {
    let authority = Arc::new(LocalAuthority::new());
    let resolver = resolver(&authority);

    resolver.resolve(SCENARIO_RAW, "credhub-read").await.unwrap();
    authority.fail_next_deletion("503 Service Unavailable");

    let err = resolver.cleanup().await.unwrap_err();
    match err {
        DiagError::DeletionFailed { name, reason } => {
            assert_eq!(name, "abc123");
            assert!(reason.contains("503"));
        }
        other => panic!("expected DeletionFailed, got {other:?}"),
    }
}

// ============================================================================
// INTERPOLATION IDEMPOTENCE
// ============================================================================

#[tokio::test]
async fn interpolating_literal_document_twice_is_identity() {
    use binddiag::CredentialAuthority;

    let authority = LocalAuthority::new();
    let doc =
        parse_binding_document(r#"{"svc":[{"credentials":{"username":"u","password":"p"}}]}"#)
            .unwrap();

    let once = authority.interpolate(&doc).await.unwrap();
    assert_eq!(once, doc);
    let twice = authority.interpolate(&once).await.unwrap();
    assert_eq!(twice, once);
}

#[test]
fn reference_field_constant_matches_binding_convention() {
    assert_eq!(CREDENTIAL_REF_FIELD, "credhub-ref");
}
