use std::net::SocketAddr;

use axum::{middleware, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{admin, auth, chirps, state::AppState};

pub fn build_app(state: AppState) -> Router {
    let static_files = Router::new()
        .nest_service("/app", ServeDir::new(&state.config.static_dir))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin::count_hits,
        ));

    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(chirps::router())
                .merge(admin::api_routes()),
        )
        .merge(admin::admin_routes())
        .merge(static_files)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
