//! HTTP surface: the JSON metrics endpoint and the bundled dashboard.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::error::ServerError;
use crate::metrics;
use crate::registry::HostRegistry;

const DASHBOARD_HTML: &str = include_str!("../static/index.html");

pub fn routes(
    registry: Arc<HostRegistry>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let metrics = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_registry(registry))
        .and_then(serve_metrics);

    // Everything else falls back to the single-page dashboard.
    let dashboard = warp::get().map(|| warp::reply::html(DASHBOARD_HTML));

    metrics.or(dashboard)
}

fn with_registry(
    registry: Arc<HostRegistry>,
) -> impl Filter<Extract = (Arc<HostRegistry>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&registry))
}

async fn serve_metrics(registry: Arc<HostRegistry>) -> Result<warp::reply::Response, Infallible> {
    let snapshot = metrics::snapshot(&registry).await;
    match serde_json::to_vec(&snapshot) {
        Ok(body) => Ok(
            warp::reply::with_header(body, "content-type", "application/json").into_response(),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize metrics");
            Ok(
                warp::reply::with_status("Internal error", StatusCode::INTERNAL_SERVER_ERROR)
                    .into_response(),
            )
        }
    }
}

/// Bind the HTTP server. The returned future runs until `shutdown` resolves.
pub fn bind(
    addr: SocketAddr,
    registry: Arc<HostRegistry>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()>), ServerError> {
    let routes = routes(registry).with(warp::trace::request());
    let (bound, server) =
        warp::serve(routes).try_bind_with_graceful_shutdown(addr, shutdown)?;
    tracing::info!("Dashboard: http://{}", bound);
    Ok((bound, server))
}
