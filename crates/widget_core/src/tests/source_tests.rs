use axum::{http::StatusCode, routing::get, Json, Router};
use tokio::net::TcpListener;

use super::*;

async fn spawn_pair_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route(
            "/",
            get(|| async { Json(vec![["Common", "888888"], ["Rare", "3cf4c8"]]) }),
        )
        .route(
            "/object",
            get(|| async { Json(serde_json::json!({"Common": "888888"})) }),
        )
        .route(
            "/short",
            get(|| async { Json(serde_json::json!([["Common"]])) }),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn http_source_decodes_pair_list() {
    let base = spawn_pair_server().await;
    let source = HttpPairSource::new(&format!("{base}/")).expect("source");

    let pairs = source.fetch_pairs().await.expect("pairs");

    assert_eq!(
        pairs,
        vec![
            TogglePair::new("Common", "888888"),
            TogglePair::new("Rare", "3cf4c8"),
        ]
    );
}

#[tokio::test]
async fn http_source_rejects_unexpected_shapes() {
    let base = spawn_pair_server().await;

    for path in ["object", "short"] {
        let source = HttpPairSource::new(&format!("{base}/{path}")).expect("source");
        let err = source.fetch_pairs().await.expect_err("should fail");
        assert!(matches!(err, SourceError::Decode { .. }), "{path}: {err}");
    }
}

#[tokio::test]
async fn http_source_treats_error_status_as_request_failure() {
    let base = spawn_pair_server().await;
    let source = HttpPairSource::with_timeout(&format!("{base}/broken"), Duration::from_secs(5))
        .expect("source");

    let err = source.fetch_pairs().await.expect_err("should fail");

    assert!(matches!(err, SourceError::Request { .. }));
}

#[test]
fn http_source_validates_url() {
    let err = HttpPairSource::new("not a url").err().expect("invalid url");
    assert!(matches!(err, SourceError::InvalidUrl { .. }));
}

#[tokio::test]
async fn static_and_missing_sources() {
    let pairs = vec![TogglePair::new("Common", "888888")];
    assert_eq!(
        StaticPairSource::new(pairs.clone())
            .fetch_pairs()
            .await
            .expect("pairs"),
        pairs
    );
    assert!(matches!(
        MissingPairSource.fetch_pairs().await,
        Err(SourceError::Unavailable)
    ));
}
