use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{Html, Response},
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::state::AppState;

/// Number of requests served from the static file tree. Owned by the server.
#[derive(Debug, Clone, Default)]
pub struct HitCounter(Arc<AtomicU64>);

impl HitCounter {
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/metrics", get(metrics))
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/reset", post(reset_hits))
}

/// Middleware for the static file tree: counts the hit and disables caching.
pub async fn count_hits(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.hits.increment();
    let mut res = next.run(req).await;
    res.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    res
}

pub async fn healthz() -> &'static str {
    "OK"
}

pub async fn metrics(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n\n<body>\n\t<h1>Welcome, Chirpy Admin</h1>\n\t<p>Chirpy has been visited {} times!</p>\n</body>\n\n</html>",
        state.hits.get()
    ))
}

pub async fn reset_hits(State(state): State<AppState>) -> StatusCode {
    state.hits.reset();
    info!("hit counter reset");
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_shared_between_clones() {
        let hits = HitCounter::default();
        let other = hits.clone();
        hits.increment();
        other.increment();
        assert_eq!(hits.get(), 2);

        other.reset();
        assert_eq!(hits.get(), 0);
    }
}
