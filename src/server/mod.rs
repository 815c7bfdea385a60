//! Blog server
//!
//! Serves the generated site from the public directory and answers the two
//! dynamic requests a static export cannot: the next listing page for the
//! "load more" control, and posts published after the last generation.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::detail::{self, Route};
use crate::generator::Generator;
use crate::listing::Listing;
use crate::source::{ContentSource, SourceError};
use crate::Blog;

/// Most slugs tracked at once by the fallback
const MAX_RESOLUTIONS: usize = 256;

/// How long a failed lookup waits to be reported before it is dropped
const MISSING_TTL: Duration = Duration::from_secs(30);

/// State of a slug resolved at request time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Pending,
    /// No post has this slug, or the lookup failed
    Missing(Instant),
}

/// Server state
struct ServerState {
    public_dir: PathBuf,
    doc_type: String,
    fallback: bool,
    generator: Generator,
    source: Arc<dyn ContentSource>,
    resolutions: Mutex<HashMap<String, Resolution>>,
    max_resolutions: usize,
    missing_ttl: Duration,
}

impl ServerState {
    fn new(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Self> {
        Ok(Self {
            public_dir: blog.public_dir.clone(),
            doc_type: blog.config.prismic.document_type.clone(),
            fallback: blog.config.fallback,
            generator: Generator::new(blog)?,
            source,
            resolutions: Mutex::new(HashMap::new()),
            max_resolutions: MAX_RESOLUTIONS,
            missing_ttl: MISSING_TTL,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MoreQuery {
    cursor: Option<String>,
}

/// Build the router serving `blog`
pub fn router(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Router> {
    let state = ServerState::new(blog, source)?;
    Ok(app(Arc::new(state)))
}

fn app(state: Arc<ServerState>) -> Router {
    let static_files = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/posts/more", get(more_handler))
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(blog: &Blog, source: Arc<dyn ContentSource>, ip: &str, port: u16) -> Result<()> {
    let app = router(blog, source)?;

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Render the page behind a listing cursor as a fragment
async fn more_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<MoreQuery>,
) -> Response {
    let Some(cursor) = query.cursor.filter(|c| !c.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing cursor").into_response();
    };

    let mut listing = Listing::resume(&cursor);
    match listing.load_more(state.source.as_ref()).await {
        Ok(_) => {}
        Err(e @ SourceError::ForeignCursor(_)) => {
            tracing::warn!("Rejected cursor: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid cursor").into_response();
        }
        Err(e) => {
            tracing::warn!("Failed to load more posts: {}", e);
            return (StatusCode::BAD_GATEWAY, "Failed to load more posts").into_response();
        }
    }

    match state.generator.render_more(&listing) {
        Ok(html) => Html(html).into_response(),
        Err(e) => server_error(e),
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    let output_path = state.generator.post_output_path(&slug);
    let prerendered = detail::is_valid_slug(&slug) && output_path.is_file();

    match detail::route(&slug, prerendered, state.fallback) {
        Route::Prerendered => match tokio::fs::read_to_string(&output_path).await {
            Ok(html) => Html(html).into_response(),
            Err(_) => not_found(),
        },
        Route::Fallback => fallback(state, slug).await,
        Route::NotFound => not_found(),
    }
}

/// Serve the placeholder while the slug is resolved in the background
///
/// Once the lookup finishes, the post page is written to the public
/// directory and later requests take the pre-rendered path. A slug that
/// resolves to nothing is answered with 404 once and then forgotten, so a
/// post published afterwards can still be found. Unreported misses expire
/// after `missing_ttl`, and no more than `max_resolutions` slugs are
/// tracked; further unknown slugs get a 404 without a lookup.
async fn fallback(state: Arc<ServerState>, slug: String) -> Response {
    let mut resolutions = state.resolutions.lock().await;

    let now = Instant::now();
    resolutions.retain(|_, resolution| match resolution {
        Resolution::Pending => true,
        Resolution::Missing(at) => now.duration_since(*at) < state.missing_ttl,
    });

    match resolutions.get(&slug).copied() {
        Some(Resolution::Pending) => {}
        Some(Resolution::Missing(_)) => {
            resolutions.remove(&slug);
            return not_found();
        }
        None if resolutions.len() >= state.max_resolutions => {
            tracing::warn!("Too many post lookups in flight, refusing {:?}", slug);
            return not_found();
        }
        None => {
            resolutions.insert(slug.clone(), Resolution::Pending);
            tokio::spawn(resolve(state.clone(), slug));
        }
    }
    drop(resolutions);

    match state.generator.render_loading() {
        Ok(html) => Html(html).into_response(),
        Err(e) => server_error(e),
    }
}

async fn resolve(state: Arc<ServerState>, slug: String) {
    let found = match detail::resolve_post(state.source.as_ref(), &state.doc_type, &slug).await {
        Ok(Some(post)) => {
            let writer = state.clone();
            let written = tokio::task::spawn_blocking(move || writer.generator.write_post(&post))
                .await
                .map_err(anyhow::Error::from)
                .and_then(|result| result);

            match written {
                Ok(path) => {
                    tracing::info!("Generated post {:?} on request: {:?}", slug, path);
                    true
                }
                Err(e) => {
                    tracing::error!("Failed to write post {:?}: {}", slug, e);
                    false
                }
            }
        }
        Ok(None) => {
            tracing::debug!("No post with slug {:?}", slug);
            false
        }
        Err(e) => {
            tracing::warn!("Failed to resolve post {:?}: {}", slug, e);
            false
        }
    };

    let mut resolutions = state.resolutions.lock().await;
    if found {
        resolutions.remove(&slug);
    } else {
        resolutions.insert(slug, Resolution::Missing(Instant::now()));
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

fn server_error(e: anyhow::Error) -> Response {
    tracing::error!("Render error: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::source::{Document, MemorySource};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    fn post(uid: &str) -> Document {
        Document {
            id: format!("id-{}", uid),
            uid: Some(uid.to_string()),
            doc_type: "post".to_string(),
            first_publication_date: Some("2021-03-25T19:25:28+0000".to_string()),
            last_publication_date: None,
            data: json!({
                "title": format!("Post {}", uid),
                "subtitle": "sub",
                "author": "Ana",
                "banner": {"url": "https://images.prismic.io/banner.png"},
                "content": [{"heading": "Intro", "body": [
                    {"type": "paragraph", "text": "Olá", "spans": []}
                ]}]
            }),
        }
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn setup(
        documents: Vec<Document>,
        fallback: bool,
    ) -> (tempfile::TempDir, Blog, Arc<MemorySource>) {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig {
            fallback,
            ..SiteConfig::default()
        };
        let blog = Blog::with_config(dir.path(), config);
        (dir, blog, Arc::new(MemorySource::new(documents)))
    }

    async fn wait_for(path: &std::path::Path) {
        for _ in 0..100 {
            if path.exists() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{:?} was never written", path);
    }

    #[tokio::test]
    async fn test_load_more_fragment() {
        let (_dir, blog, source) = setup(vec![post("a"), post("b"), post("c")], true);
        let app = router(&blog, source.clone()).unwrap();

        let cursor = "memory%3A%2F%2Fpost%3Fpage%3D2%26pageSize%3D1";
        let (status, body) = get(&app, &format!("/posts/more?cursor={}", cursor)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Post b"));
        assert!(!body.contains("Post a"));
        assert!(body.contains("Carregar mais posts"));
        assert_eq!(source.requests(), 1);
    }

    #[tokio::test]
    async fn test_load_more_errors() {
        let (_dir, blog, source) = setup(vec![post("a"), post("b")], true);
        let app = router(&blog, source.clone()).unwrap();

        let (status, _) = get(&app, "/posts/more").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        source.set_offline(true);
        let cursor = "memory%3A%2F%2Fpost%3Fpage%3D2%26pageSize%3D1";
        let (status, _) = get(&app, &format!("/posts/more?cursor={}", cursor)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_prerendered_post() {
        let (_dir, blog, source) = setup(vec![post("a")], false);
        let generator = Generator::new(&blog).unwrap();
        generator.generate(source.as_ref()).await.unwrap();
        let app = router(&blog, source).unwrap();

        let (status, body) = get(&app, "/post/a").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Post a"));

        let (status, body) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Post a"));
    }

    #[tokio::test]
    async fn test_unknown_slug_without_fallback() {
        let (_dir, blog, source) = setup(vec![post("a")], false);
        let app = router(&blog, source.clone()).unwrap();

        let (status, _) = get(&app, "/post/a").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(source.requests(), 0);
    }

    #[tokio::test]
    async fn test_fallback_shows_placeholder_then_post() {
        let (_dir, blog, source) = setup(vec![post("novo")], true);
        let app = router(&blog, source).unwrap();

        let (status, body) = get(&app, "/post/novo/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Carregando..."));

        wait_for(&blog.public_dir.join("post/novo/index.html")).await;

        let (status, body) = get(&app, "/post/novo").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Post novo"));
        assert!(!body.contains("Carregando..."));
    }

    #[tokio::test]
    async fn test_fallback_for_missing_post_ends_in_not_found() {
        let (_dir, blog, source) = setup(vec![post("a")], true);
        let app = router(&blog, source.clone()).unwrap();

        let (status, body) = get(&app, "/post/nada").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Carregando..."));

        let mut status = StatusCode::OK;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            status = get(&app, "/post/nada").await.0;
            if status != StatusCode::OK {
                break;
            }
        }
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    fn state_with(
        blog: &Blog,
        source: Arc<MemorySource>,
        max_resolutions: usize,
        missing_ttl: Duration,
    ) -> Arc<ServerState> {
        let mut state = ServerState::new(blog, source).unwrap();
        state.max_resolutions = max_resolutions;
        state.missing_ttl = missing_ttl;
        Arc::new(state)
    }

    async fn settle(state: &ServerState) {
        for _ in 0..100 {
            let pending = state
                .resolutions
                .lock()
                .await
                .values()
                .any(|r| *r == Resolution::Pending);
            if !pending {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("lookups never finished");
    }

    #[tokio::test]
    async fn test_unknown_slugs_keep_the_table_bounded() {
        let (_dir, blog, source) = setup(vec![post("a")], true);
        let state = state_with(&blog, source.clone(), 8, MISSING_TTL);

        let mut placeholders = 0;
        for i in 0..50 {
            let response = fallback(state.clone(), format!("junk-{}", i)).await;
            if response.status() == StatusCode::OK {
                placeholders += 1;
            }
        }
        settle(&state).await;

        assert_eq!(placeholders, 8);
        assert_eq!(state.resolutions.lock().await.len(), 8);
        assert_eq!(source.requests(), 8);
    }

    #[tokio::test]
    async fn test_unreported_misses_expire() {
        let (_dir, blog, source) = setup(vec![post("a")], true);
        let state = state_with(&blog, source, 8, Duration::ZERO);

        for i in 0..5 {
            fallback(state.clone(), format!("junk-{}", i)).await;
        }
        settle(&state).await;
        assert_eq!(state.resolutions.lock().await.len(), 5);

        let response = fallback(state.clone(), "junk-new".to_string()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.resolutions.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_load_more_with_cursor_past_the_end() {
        let (_dir, blog, source) = setup(vec![], true);
        let app = router(&blog, source).unwrap();

        let cursor = "memory%3A%2F%2Fpost%3Fpage%3D4294967295%26pageSize%3D2";
        let (status, body) = get(&app, &format!("/posts/more?cursor={}", cursor)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("Carregar mais posts"));
    }

    #[tokio::test]
    async fn test_invalid_slug_is_not_found() {
        let (_dir, blog, source) = setup(vec![], true);
        let app = router(&blog, source.clone()).unwrap();

        let (status, _) = get(&app, "/post/a%2F..").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(source.requests(), 0);
    }
}
