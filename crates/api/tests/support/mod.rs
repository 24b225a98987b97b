//! Shared helpers for app integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use shelfsight_domain::{AnalysisConfig, ApiConfig, Config};
use shelfsight_lib::AppContext;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Context wired to `server` with a one-second poll interval.
pub fn context_for(server: &MockServer) -> AppContext {
    let config = Config {
        api: ApiConfig { base_url: server.uri(), base_backoff_ms: 1, ..ApiConfig::default() },
        analysis: AnalysisConfig { poll_interval_secs: 1, ..AnalysisConfig::default() },
        ..Config::default()
    };
    AppContext::new_with_config(config).expect("context")
}

/// Serve `listing` from `GET /get-rois`.
pub async fn mount_saved_rois(server: &MockServer, listing: Value) {
    Mock::given(method("GET"))
        .and(path("/get-rois"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .mount(server)
        .await;
}

pub fn triangle_listing(video: &str, name: &str) -> Value {
    json!({ video: [{"name": name, "points": [[10, 10], [80, 10], [40, 60]]}] })
}
