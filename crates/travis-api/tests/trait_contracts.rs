//! Contract tests for `TravisApi` implementations, run against the fake.

use std::sync::Arc;

use travis_api::fakes::{enabled_payload, FakeTravisApi};
use travis_api::{ApiError, TravisApi};

fn slugs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn resolution_report_is_balanced_and_disjoint() {
    let api: Arc<dyn TravisApi> = Arc::new(
        FakeTravisApi::new()
            .with_repo("math-io/erf", 11)
            .with_repo("math-io/erfc", 12),
    );

    let requested = slugs(&["math-io/erf", "math-io/erfc", "unknown/repo"]);
    let report = api.resolve_repos(&requested).await.unwrap();

    assert!(report.is_balanced());
    for slug in &requested {
        let in_data = report.data.contains_key(slug);
        let in_failures = report.failures.contains_key(slug);
        assert!(in_data ^ in_failures, "{} must appear exactly once", slug);
    }
}

#[tokio::test]
async fn resolve_error_fails_as_a_whole() {
    let api: Arc<dyn TravisApi> =
        Arc::new(FakeTravisApi::new().with_resolve_error(ApiError::Transport("reset".into())));

    let err = api
        .resolve_repos(&slugs(&["math-io/erf"]))
        .await
        .unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn hook_errors_carry_status_classification() {
    let api: Arc<dyn TravisApi> = Arc::new(
        FakeTravisApi::new()
            .with_hook(1, Err(ApiError::status_error(404, "Not Found")))
            .with_hook(2, Err(ApiError::status_error(500, "Internal Server Error"))),
    );

    let recoverable = api.enable_hook(1).await.unwrap_err();
    assert!(!recoverable.is_fatal());

    let fatal = api.enable_hook(2).await.unwrap_err();
    assert!(fatal.is_fatal());

    assert_eq!(api.enable_hook(3).await.unwrap(), enabled_payload());
}
