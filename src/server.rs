//! Inbound HTTP surface: an axum router that hands every request to the [`Forwarder`].

// std
use std::net::SocketAddr;
// crates.io
use axum::{
	Router,
	body::Body,
	extract::State,
	http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header::CONTENT_TYPE},
	response::{IntoResponse, Response},
	routing::get,
};
use tokio::net::TcpListener;
use tower_http::{
	cors::{AllowHeaders, Any, CorsLayer},
	trace::TraceLayer,
};
// self
use crate::{
	_prelude::*,
	error::NetworkError,
	proxy::{Forwarder, ProxyRequest, ProxyResponse},
};

/// Path answered locally for liveness probes.
pub const HEALTH_PATH: &str = "/healthz";

/// Builds the router: `/healthz`, then everything else through the forwarder.
pub fn router(forwarder: Arc<Forwarder>) -> Router {
	let cors = CorsLayer::new()
		.allow_origin(Any)
		.allow_methods([
			Method::GET,
			Method::POST,
			Method::PUT,
			Method::PATCH,
			Method::DELETE,
			Method::HEAD,
			Method::OPTIONS,
		])
		.allow_headers(AllowHeaders::mirror_request());

	Router::new()
		.route(HEALTH_PATH, get(healthz))
		.fallback(proxy)
		.with_state(forwarder)
		.layer(TraceLayer::new_for_http())
		.layer(cors)
}

/// Binds `bind` and serves `router` until Ctrl-C.
pub async fn serve(bind: SocketAddr, router: Router) -> Result<()> {
	let listener = TcpListener::bind(bind).await.map_err(NetworkError::from)?;

	tracing::info!(%bind, "Catalog proxy listening.");

	axum::serve(listener, router)
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(NetworkError::from)?;

	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
	}

	tracing::info!("Shutting down.");
}

async fn healthz() -> &'static str {
	"ok"
}

async fn proxy(
	State(forwarder): State<Arc<Forwarder>>,
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
) -> ProxyResponse {
	if method == Method::OPTIONS {
		return ProxyResponse::empty();
	}

	let mut request =
		ProxyRequest::new(method, uri.path()).with_headers(headers).with_body(body);

	if let Some(query) = uri.query() {
		request = request.with_query(query);
	}

	forwarder.forward(request).await
}

impl IntoResponse for ProxyResponse {
	fn into_response(self) -> Response {
		let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
		let mut response = (status, Body::from(self.body)).into_response();

		if let Some(value) = self.content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
			response.headers_mut().insert(CONTENT_TYPE, value);
		}

		response
	}
}
