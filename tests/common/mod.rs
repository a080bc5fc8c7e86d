//! Shared fixtures for the relay integration tests.

#![allow(dead_code)]

// std
use std::{collections::HashMap, io, sync::Arc};
// crates.io
use axum::{
	Router,
	body::{self, Body},
	http::{Request, Response, header::CONTENT_TYPE},
};
use httpmock::MockServer;
use parking_lot::Mutex;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;
// self
use oauth2_relay::{
	config::RelayConfig,
	relay::{self, Relay},
};

pub const CLIENT_ID: &str = "client-relay";
pub const APP_REDIRECT: &str = "https://app.example/done";

/// Plain-http base URL of the stub provider; loopback http is an accepted login URL.
pub fn provider_base(server: &MockServer) -> String {
	format!("http://{}", server.address())
}

/// Config whose default (and only extra) provider is the mock server.
pub fn config_for(server: &MockServer, overrides: &[(&str, &str)]) -> RelayConfig {
	let mut env: HashMap<String, String> = HashMap::from([
		("CLIENT_ID".to_owned(), CLIENT_ID.to_owned()),
		("LOGIN_URL".to_owned(), provider_base(server)),
		("LOGIN_URLS".to_owned(), provider_base(server)),
	]);

	for (key, value) in overrides {
		env.insert((*key).to_owned(), (*value).to_owned());
	}

	RelayConfig::from_lookup(|key| env.get(key).cloned())
		.expect("Relay config fixture should load successfully.")
}

pub fn router_for(server: &MockServer, overrides: &[(&str, &str)]) -> Router {
	let relay = Relay::new(config_for(server, overrides))
		.expect("Relay fixture should build successfully.");

	relay::router(relay)
}

pub async fn get(router: &Router, uri: &str) -> Response<Body> {
	let request = Request::builder()
		.uri(uri)
		.body(Body::empty())
		.expect("GET request fixture should build successfully.");

	router.clone().oneshot(request).await.expect("Router should always produce a response.")
}

pub async fn post_form(router: &Router, uri: &str, form: &str) -> Response<Body> {
	let request = Request::builder()
		.method("POST")
		.uri(uri)
		.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(Body::from(form.to_owned()))
		.expect("POST request fixture should build successfully.");

	router.clone().oneshot(request).await.expect("Router should always produce a response.")
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Response body should be readable.");

	serde_json::from_slice(&bytes).expect("Response body should be JSON.")
}

pub fn location(response: &Response<Body>) -> String {
	response
		.headers()
		.get("location")
		.and_then(|value| value.to_str().ok())
		.map(str::to_owned)
		.expect("Redirect response should carry a Location header.")
}

pub fn query(pairs: &[(&str, &str)]) -> String {
	url::form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish()
}

/// In-memory sink for `tracing` output.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);
impl LogCapture {
	/// Subscriber writing plain-text events at `info` and above into this capture.
	pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
		tracing_subscriber::fmt()
			.with_writer(self.clone())
			.with_ansi(false)
			.with_max_level(tracing::Level::INFO)
			.finish()
	}

	pub fn contents(&self) -> String {
		String::from_utf8_lossy(&self.0.lock()).into_owned()
	}
}
impl<'a> MakeWriter<'a> for LogCapture {
	type Writer = LogWriter;

	fn make_writer(&'a self) -> Self::Writer {
		LogWriter(self.0.clone())
	}
}

pub struct LogWriter(Arc<Mutex<Vec<u8>>>);
impl io::Write for LogWriter {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().extend_from_slice(buf);

		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}
