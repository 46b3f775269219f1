//! HTTP surface: routes under `/api`, header policy and API documentation.

mod docs;
mod error;
mod routes;
pub mod schema;

pub use self::docs::{ApiDoc, OPENAPI_PATH};
pub use self::error::ApiError;
use crate::service::AssetService;
use axum::Router;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::http::header::CACHE_CONTROL;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub type AppState = Arc<AssetService>;

/// Build the application router.
///
/// Every `/api` response gets `Cache-Control: no-cache` unless the handler
/// already set the header. Requests from any origin are allowed.
pub fn router(service: AppState) -> Router {
    let api = Router::new()
        .route("/assets.json", get(routes::list_assets))
        .route("/assets/by-kuid/{kuid}", get(routes::get_by_kuid))
        .route("/assets/by-file/{fileId}", get(routes::get_by_file_id))
        .route("/assets/details", get(routes::storage_details))
        .route("/openapi.json", get(docs::openapi))
        .with_state(service);

    Router::new()
        .nest("/api", api)
        .merge(docs::router())
        .layer(middleware::from_fn(api_no_cache))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

/// Default `Cache-Control: no-cache` for everything under `/api/`, unmatched
/// paths included. A header set by the handler is kept.
async fn api_no_cache(request: Request, next: Next) -> Response {
    let is_api = request.uri().path().starts_with("/api/");
    let mut response = next.run(request).await;
    if is_api {
        response
            .headers_mut()
            .entry(CACHE_CONTROL)
            .or_insert(HeaderValue::from_static("no-cache"));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode, header};
    use http_body_util::BodyExt;
    use rstest::rstest;
    use serde_json::Value;
    use std::time::Duration;
    use time::UtcDateTime;
    use tower::ServiceExt;
    use trainz_config::StorageConfig;
    use trainz_store::{Database, MockStore, NewAsset, Repository};

    const FILE_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const FILE_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    // 2024-05-01 12:00:00 UTC
    fn t(offset: i64) -> UtcDateTime {
        UtcDateTime::from_unix_timestamp(1_714_564_800 + offset).unwrap()
    }

    fn mock() -> Arc<MockStore> {
        Arc::new(MockStore::with_assets([
            MockStore::asset("bob", "kuid2:2:2:2", FILE_B, 20, t(200)),
            MockStore::asset("alice", "kuid:1:1", FILE_A, 10, t(100)),
        ]))
    }

    fn app(store: Arc<MockStore>, storage: StorageConfig) -> Router {
        router(AssetService::new(store, storage, ResponseCache::new(Duration::from_secs(300))).into_shared())
    }

    fn default_app(store: Arc<MockStore>) -> Router {
        app(store, StorageConfig::default())
    }

    async fn get(app: Router, uri: &str) -> Response<Body> {
        app.oneshot(Request::get(uri).header(header::ORIGIN, "https://example.com").body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn header_value<'a>(response: &'a Response<Body>, name: header::HeaderName) -> Option<&'a str> {
        response.headers().get(name).and_then(|value| value.to_str().ok())
    }

    #[tokio::test]
    async fn test_list_assets() {
        let response = get(default_app(mock()), "/api/assets.json").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_value(&response, header::CACHE_CONTROL), Some("no-cache"));
        assert_eq!(header_value(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
        let body = json(response).await;
        assert_eq!(body["lastRevision"], 20);
        assert_eq!(body["assets"][0]["username"], "alice");
        assert_eq!(body["assets"][0]["lastUpdate"], "2024-05-01T12:01:40Z");
        assert_eq!(body["assets"][1]["fileId"], FILE_B);
    }

    #[rstest]
    #[case("/api/assets.json?revision=10", 1)]
    #[case("/api/assets.json?lastUpdate=1714564900", 1)]
    #[case("/api/assets.json?last_update=2024-05-01T12:00:00Z", 2)]
    #[case("/api/assets.json?lastUpdate=2024-05-01T14:00:00%2B02:00&revision=0", 2)]
    #[tokio::test]
    async fn test_list_filters(#[case] uri: &str, #[case] expected: usize) {
        let response = get(default_app(mock()), uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["assets"].as_array().unwrap().len(), expected);
    }

    #[rstest]
    #[case("/api/nope")]
    #[case("/api/assets/by-kuid")]
    #[case("/api/assets/details/extra")]
    #[tokio::test]
    async fn test_unknown_api_paths_are_not_cached(#[case] uri: &str) {
        let store = mock();
        let response = get(default_app(Arc::clone(&store)), uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(header_value(&response, header::CACHE_CONTROL), Some("no-cache"));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_found() {
        let response = get(default_app(mock()), "/api/assets.json?revision=20").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["detail"], "Asset not found");
    }

    #[rstest]
    #[case("/api/assets.json?revision=latest")]
    #[case("/api/assets.json?lastUpdate=yesterday")]
    #[case("/api/assets/by-kuid/not-a-valid-kuid")]
    #[case("/api/assets/by-file/too-short")]
    #[tokio::test]
    async fn test_validation_never_reaches_store(#[case] uri: &str) {
        let store = mock();
        let response = get(default_app(Arc::clone(&store)), uri).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json(response).await["detail"].is_string());
        assert_eq!(store.calls(), 0);
    }

    #[rstest]
    #[case("/api/assets/by-kuid/kuid:1:1", StatusCode::OK)]
    #[case("/api/assets/by-kuid/kuid2:2:2:2", StatusCode::OK)]
    #[case("/api/assets/by-kuid/kuid:-5:1", StatusCode::NOT_FOUND)]
    #[case("/api/assets/by-file/bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", StatusCode::OK)]
    #[case("/api/assets/by-file/ffffffffffffffffffffffffffffffff", StatusCode::NOT_FOUND)]
    #[tokio::test]
    async fn test_lookups(#[case] uri: &str, #[case] expected: StatusCode) {
        let response = get(default_app(mock()), uri).await;
        assert_eq!(response.status(), expected);
    }

    #[tokio::test]
    async fn test_storage_details() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("full")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("low")).unwrap();
        std::fs::write(temp_dir.path().join("full/asset.cdp"), [0u8; 2048]).unwrap();
        let storage = StorageConfig {
            full_path: temp_dir.path().join("full"),
            low_path: temp_dir.path().join("low"),
        };
        let store = mock();
        let app = app(Arc::clone(&store), storage);

        let response = get(app.clone(), "/api/assets/details").await;
        assert_eq!(response.status(), StatusCode::OK);
        let cache_control = header_value(&response, header::CACHE_CONTROL).unwrap().to_string();
        assert!(cache_control.starts_with("max-age="), "{cache_control}");
        let body = json(response).await;
        assert_eq!(body["currentRevision"], 20);
        assert_eq!(body["fullBytes"], 2048);
        assert_eq!(body["fullHuman"], "2.0 KB");
        assert_eq!(body["lowHuman"], "0 B");

        get(app, "/api/assets/details").await;
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_storage_is_a_server_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            full_path: temp_dir.path().join("missing"),
            low_path: temp_dir.path().to_path_buf(),
        };
        let response = get(app(mock(), storage), "/api/assets/details").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(response).await["detail"], "Internal Server Error");
    }

    #[tokio::test]
    async fn test_documentation() {
        let response = get(default_app(mock()), OPENAPI_PATH).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["info"]["title"], "Trainz-DL");
        assert!(body["paths"]["/api/assets.json"]["get"].is_object());

        let response = get(default_app(mock()), "/docs/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_value(&response, header::CACHE_CONTROL), None);
        let response = get(default_app(mock()), "/redoc").await;
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(header_value(&response, header::LOCATION), Some("/redoc/"));
    }

    #[tokio::test]
    async fn test_against_sqlite() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        for (username, kuid, file_id, revision) in [("zed", "kuid:9:9", FILE_A, 3), ("amy", "kuid:8:8", FILE_B, 4)] {
            let asset = NewAsset {
                username: username.to_string(),
                kuid: kuid.parse().unwrap(),
                sha1: "0".repeat(40),
                file_id: file_id.parse().unwrap(),
                revision,
            };
            assert!(repo.upsert(&asset).await.unwrap());
        }
        let service = AssetService::new(Arc::new(repo), StorageConfig::default(), ResponseCache::new(Duration::from_secs(1)));
        let app = router(service.into_shared());

        let body = json(get(app.clone(), "/api/assets.json?revision=2").await).await;
        assert_eq!(body["assets"][0]["username"], "amy");
        assert_eq!(body["lastRevision"], 4);
        let body = json(get(app, "/api/assets/by-kuid/kuid:9:9").await).await;
        assert_eq!(body["fileId"], FILE_A);
        db.close().await;
    }
}
