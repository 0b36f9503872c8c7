//! HTTP serving of rendered documents and static assets.
//!
//! Routes, for the default routing config:
//! - `GET /content/` and `GET /content/{*path}`: rendered documents
//! - `OPTIONS` on the same paths: empty preflight answer
//! - `/assets/*`: files from the assets directory

use std::sync::{Arc, PoisonError, RwLock};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::services::ServeDir;

use crate::build::Library;
use crate::config::{RoutingConfig, SiteConfig};

/// State shared by all request handlers.
pub struct AppState {
    library: RwLock<Arc<Library>>,
    routing: RoutingConfig,
}

impl AppState {
    pub fn new(library: Library, routing: RoutingConfig) -> Self {
        Self {
            library: RwLock::new(Arc::new(library)),
            routing,
        }
    }

    /// The current library. Requests keep the snapshot they started with.
    pub fn library(&self) -> Arc<Library> {
        self.library
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a freshly loaded library.
    pub fn replace(&self, library: Library) {
        *self.library.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(library);
    }

    /// Reload the library on a blocking worker. On failure the current
    /// library stays in place.
    pub async fn refresh(&self, config: Arc<SiteConfig>) {
        tracing::info!(dir = %config.directories.documents.display(), "reading directory");
        match tokio::task::spawn_blocking(move || Library::from_config(&config)).await {
            Ok(Ok(library)) => self.replace(library),
            Ok(Err(e)) => tracing::warn!("refresh failed, keeping previous documents: {e}"),
            Err(e) => tracing::error!("refresh task failed: {e}"),
        }
    }
}

/// Build the router for `config`.
pub fn router(state: Arc<AppState>, config: &SiteConfig) -> Router {
    let routing = &config.routing;
    let assets = ServeDir::new(&config.directories.assets);

    Router::new()
        .route(
            &routing.route_prefix,
            get(serve_index).options(preflight),
        )
        .route(
            &format!("{}{{*path}}", routing.route_prefix),
            get(serve_document).options(preflight),
        )
        .nest_service(routing.assets_prefix.trim_end_matches('/'), assets)
        .with_state(state)
}

async fn serve_index(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    respond(&state, "", uri.path())
}

async fn serve_document(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    uri: Uri,
) -> Response {
    respond(&state, &path, uri.path())
}

async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")])
}

/// Answer with the document served as `file_name`.
fn respond(state: &AppState, file_name: &str, request_path: &str) -> Response {
    let suffix = &state.routing.url_file_suffix;
    let file_name = if file_name.is_empty() {
        format!("index{suffix}")
    } else {
        file_name.to_string()
    };

    let library = state.library();
    match library.find_by_file_name(&file_name, suffix) {
        Some(document) => {
            tracing::info!(path = request_path, bytes = document.rendered.len(), "transferred");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html")],
                document.rendered.clone(),
            )
                .into_response()
        }
        None => {
            tracing::info!(path = request_path, bytes = 0, "not found");
            (StatusCode::NOT_FOUND, [(header::CONTENT_TYPE, "text/plain")], "").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;

    struct Site {
        _dir: tempfile::TempDir,
        config: SiteConfig,
    }

    fn site() -> Site {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::default();
        config.directories.documents = dir.path().join("content");
        config.directories.templates = dir.path().join("templates");
        config.directories.assets = dir.path().join("assets");

        let content = &config.directories.documents;
        std::fs::create_dir_all(content.join("guides")).unwrap();
        std::fs::create_dir_all(&config.directories.assets).unwrap();
        std::fs::write(content.join("index.md"), "<attributes title=\"Home\"></attributes>\n\nWelcome\n").unwrap();
        std::fs::write(
            content.join("guides/setup.md"),
            "<attributes title=\"Setup\"></attributes>\n\nSteps\n",
        )
        .unwrap();
        std::fs::write(config.directories.assets.join("custom.css"), "body {}").unwrap();

        Site { _dir: dir, config }
    }

    fn app(config: &SiteConfig) -> (Router, Arc<AppState>) {
        let library = Library::from_config(config).unwrap();
        let state = Arc::new(AppState::new(library, config.routing.clone()));
        (router(state.clone(), config), state)
    }

    async fn send(router: Router, method: Method, uri: &str) -> (StatusCode, String, String) {
        let response = router
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_prefix_serves_index() {
        let site = site();
        let (router, _) = app(&site.config);

        let (status, content_type, body) = send(router, Method::GET, "/content/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/html");
        assert!(body.contains("<title>Home</title>"));
    }

    #[tokio::test]
    async fn test_nested_document() {
        let site = site();
        let (router, _) = app(&site.config);

        let (status, _, body) = send(router, Method::GET, "/content/guides/setup.html").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Setup</title>"));
    }

    #[tokio::test]
    async fn test_unknown_document_is_empty_404() {
        let site = site();
        let (router, _) = app(&site.config);

        for uri in ["/content/missing.html", "/content/index", "/content/index.html.bak"] {
            let (status, content_type, body) = send(router.clone(), Method::GET, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(content_type, "text/plain");
            assert_eq!(body, "");
        }
    }

    #[tokio::test]
    async fn test_options_is_ok() {
        let site = site();
        let (router, _) = app(&site.config);

        let (status, content_type, body) =
            send(router, Method::OPTIONS, "/content/anything.html").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/plain");
        assert_eq!(body, "");
    }

    #[tokio::test]
    async fn test_assets_are_served() {
        let site = site();
        let (router, _) = app(&site.config);

        let (status, _, body) = send(router.clone(), Method::GET, "/assets/custom.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body {}");

        let (status, _, _) = send(router, Method::GET, "/assets/missing.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_suffix_routing() {
        let mut site = site();
        site.config.routing.url_file_suffix = String::new();
        let (router, _) = app(&site.config);

        let (status, _, _) = send(router.clone(), Method::GET, "/content/guides/setup").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, _) = send(router, Method::GET, "/content/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_refresh_swaps_library() {
        let site = site();
        let (router, state) = app(&site.config);
        std::fs::write(
            site.config.directories.documents.join("new.md"),
            "<attributes title=\"New\"></attributes>\n",
        )
        .unwrap();

        state.refresh(Arc::new(site.config.clone())).await;

        let (status, _, body) = send(router, Method::GET, "/content/new.html").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>New</title>"));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_library() {
        let site = site();
        let (_, state) = app(&site.config);
        let mut broken = site.config.clone();
        broken.directories.documents = site.config.directories.documents.join("missing");

        state.refresh(Arc::new(broken)).await;

        assert_eq!(state.library().len(), 2);
    }
}
