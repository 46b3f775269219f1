//! OpenAPI document and the pages that render it.

use crate::http::routes;
use crate::http::schema::{AssetListSchema, AssetSchema, ErrorBody, StorageDetailsSchema};
use axum::Json;
use axum::Router;
use axum::response::{Html, Redirect};
use axum::routing::get;
use utoipa::OpenApi;

pub const OPENAPI_PATH: &str = "/api/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trainz-DL",
        description = "Read-only catalogue of Trainz assets for clients checking for updates.",
        license(name = "GPLv3", url = "https://www.gnu.org/licenses/gpl-3.0.html"),
    ),
    paths(routes::list_assets, routes::get_by_kuid, routes::get_by_file_id, routes::storage_details),
    components(schemas(AssetSchema, AssetListSchema, StorageDetailsSchema, ErrorBody)),
    tags((name = "assets", description = "Asset metadata and storage statistics")),
)]
pub struct ApiDoc;

pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

const SWAGGER_UI: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Trainz-DL - Swagger UI</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({ url: "/api/openapi.json", dom_id: "#swagger-ui" });
  </script>
</body>
</html>
"##;

const REDOC: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Trainz-DL - ReDoc</title>
</head>
<body>
  <redoc spec-url="/api/openapi.json"></redoc>
  <script src="https://cdn.jsdelivr.net/npm/redoc@2/bundles/redoc.standalone.js"></script>
</body>
</html>
"##;

/// `/docs/` and `/redoc/`, plus redirects from the slash-less forms.
pub fn router() -> Router {
    Router::new()
        .route("/docs/", get(|| async { Html(SWAGGER_UI) }))
        .route("/docs", get(|| async { Redirect::permanent("/docs/") }))
        .route("/redoc/", get(|| async { Html(REDOC) }))
        .route("/redoc", get(|| async { Redirect::permanent("/redoc/") }))
}
