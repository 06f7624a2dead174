//! Request builder, response parser and blocking facade for the
//! Healthchecks.io management API.
//!
//! # Design
//! Each operation is split in three: a `build_*` method that produces an
//! `HttpRequest`, a `parse_*` method that turns an `HttpResponse` into a
//! typed value or an `ApiError`, and the facade method (`list_checks`,
//! `create_check`, ...) that runs the request through the configured
//! `Transport` in between. The client keeps no mutable state; everything it
//! holds is fixed at construction.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::logger::{Logger, NoOpLogger};
use crate::types::{Channel, ChannelList, Check, CheckList, CheckResponse, ErrorBody};

const CHECKS_PATH: &str = "/checks/";
const CHANNELS_PATH: &str = "/channels/";

/// Blocking client for the Healthchecks.io management API.
///
/// One call is one HTTP round trip. Nothing is retried, paginated or cached;
/// errors are returned exactly as the transport or the service produced them.
pub struct HealthchecksClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
    logger: Arc<dyn Logger>,
}

impl HealthchecksClient<UreqTransport> {
    /// Client for the public service with a silent logger.
    pub fn new(api_key: &str) -> Self {
        Self::builder(api_key).build()
    }

    pub fn with_logger(api_key: &str, logger: Arc<dyn Logger>) -> Self {
        Self::builder(api_key).logger(logger).build()
    }

    pub fn builder(api_key: &str) -> ClientBuilder {
        ClientBuilder {
            config: ClientConfig::new(api_key),
            logger: Arc::new(NoOpLogger),
            timeout: None,
        }
    }
}

impl<T: Transport> HealthchecksClient<T> {
    pub fn from_parts(config: ClientConfig, transport: T, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            transport,
            logger,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Facade
    // -----------------------------------------------------------------------

    /// All checks in the order the service returns them.
    pub fn list_checks(&self) -> Result<Vec<CheckResponse>, ApiError> {
        let request = self.build_list_checks();
        let response = self.send(&request)?;
        self.parse_check_list(&request, response)
    }

    pub fn create_check(&self, check: &Check) -> Result<CheckResponse, ApiError> {
        let request = self.build_create_check(check)?;
        let response = self.send(&request)?;
        self.parse_check(&request, response)
    }

    /// Update the check `id`. Fields left as `None` keep their server value.
    pub fn update_check(&self, id: &str, check: &Check) -> Result<CheckResponse, ApiError> {
        let request = self.build_update_check(id, check)?;
        let response = self.send(&request)?;
        self.parse_check(&request, response)
    }

    pub fn pause_check(&self, id: &str) -> Result<CheckResponse, ApiError> {
        let request = self.build_pause_check(id);
        let response = self.send(&request)?;
        self.parse_check(&request, response)
    }

    /// Delete the check `id`, returning its last known state.
    pub fn delete_check(&self, id: &str) -> Result<CheckResponse, ApiError> {
        let request = self.build_delete_check(id);
        let response = self.send(&request)?;
        self.parse_check(&request, response)
    }

    pub fn list_channels(&self) -> Result<Vec<Channel>, ApiError> {
        let request = self.build_list_channels();
        let response = self.send(&request)?;
        self.parse_channel_list(&request, response)
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_list_checks(&self) -> HttpRequest {
        self.request(HttpMethod::Get, CHECKS_PATH.to_string(), None)
    }

    pub fn build_create_check(&self, check: &Check) -> Result<HttpRequest, ApiError> {
        let body = encode(check)?;
        Ok(self.request(HttpMethod::Post, CHECKS_PATH.to_string(), Some(body)))
    }

    pub fn build_update_check(&self, id: &str, check: &Check) -> Result<HttpRequest, ApiError> {
        let body = encode(check)?;
        Ok(self.request(HttpMethod::Post, check_path(id), Some(body)))
    }

    pub fn build_pause_check(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Post, format!("{}/pause", check_path(id)), None)
    }

    pub fn build_delete_check(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, check_path(id), None)
    }

    pub fn build_list_channels(&self) -> HttpRequest {
        self.request(HttpMethod::Get, CHANNELS_PATH.to_string(), None)
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    pub fn parse_check(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<CheckResponse, ApiError> {
        decode(request, &response)
    }

    pub fn parse_check_list(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<Vec<CheckResponse>, ApiError> {
        decode::<CheckList>(request, &response).map(|list| list.checks)
    }

    pub fn parse_channel_list(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<Vec<Channel>, ApiError> {
        decode::<ChannelList>(request, &response).map(|list| list.channels)
    }

    fn request(&self, method: HttpMethod, path: String, body: Option<Vec<u8>>) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.config.base_url.trim_end_matches('/')),
            headers: vec![
                ("Content-Type".to_string(), self.config.content_type.clone()),
                ("X-Api-Key".to_string(), self.config.api_key.clone()),
            ],
            body,
        }
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.logger.debug(format_args!("HTTP {} {}", request.method, request.url));

        self.transport
            .execute(request)
            .map_err(|e| ApiError::Transport {
                message: e.to_string(),
                method: request.method,
                url: request.url.clone(),
            })
    }
}

impl<T> fmt::Debug for HealthchecksClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthchecksClient")
            .field("base_url", &self.config.base_url)
            .field("content_type", &self.config.content_type)
            .finish_non_exhaustive()
    }
}

/// Builder for a client backed by `UreqTransport` or a custom transport.
pub struct ClientBuilder {
    config: ClientConfig,
    logger: Arc<dyn Logger>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.config = self.config.with_base_url(base_url);
        self
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.config = self.config.with_content_type(content_type);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Overall per-request timeout for the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> HealthchecksClient<UreqTransport> {
        let transport = UreqTransport::with_timeout(self.timeout);
        HealthchecksClient::from_parts(self.config, transport, self.logger)
    }

    /// Finish with a caller-supplied transport. `timeout` is ignored.
    pub fn transport<T: Transport>(self, transport: T) -> HealthchecksClient<T> {
        HealthchecksClient::from_parts(self.config, transport, self.logger)
    }
}

fn check_path(id: &str) -> String {
    format!("{CHECKS_PATH}{id}")
}

fn encode(check: &Check) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(check).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Turn a status >= 300 into an `ApiError`, decoding the `{"error": ...}`
/// body when possible.
fn check_status(request: &HttpRequest, response: &HttpResponse) -> Result<(), ApiError> {
    if response.status < 300 {
        return Ok(());
    }
    let status = response.status_text();
    match serde_json::from_slice::<ErrorBody>(&response.body) {
        Ok(body) => Err(ApiError::Api {
            message: body.error,
            method: request.method,
            url: request.url.clone(),
            status,
            status_code: response.status,
        }),
        Err(e) => Err(ApiError::Decode {
            message: e.to_string(),
            method: request.method,
            url: request.url.clone(),
            status,
            status_code: Some(response.status),
        }),
    }
}

fn decode<D: DeserializeOwned>(
    request: &HttpRequest,
    response: &HttpResponse,
) -> Result<D, ApiError> {
    check_status(request, response)?;
    serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode {
        message: e.to_string(),
        method: request.method,
        url: request.url.clone(),
        status: response.status_text(),
        status_code: Some(response.status),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::http::TransportError;
    use std::sync::Mutex;

    const BASE_URL: &str = "https://healthchecks.io/api/v1";

    /// Replays one canned outcome and records every request it sees.
    struct MockTransport {
        outcome: Result<(u16, &'static str), &'static str>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        fn responding(status: u16, body: &'static str) -> Self {
            Self {
                outcome: Ok((status, body)),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                outcome: Err(message),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn last_request(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for MockTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            match self.outcome {
                Ok((status, body)) => Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.as_bytes().to_vec(),
                }),
                Err(message) => Err(TransportError(message.to_string())),
            }
        }
    }

    /// Records debug lines.
    #[derive(Default)]
    struct CountingLogger(Mutex<Vec<String>>);

    impl Logger for CountingLogger {
        fn debug(&self, args: fmt::Arguments<'_>) {
            self.0.lock().unwrap().push(args.to_string());
        }
        fn info(&self, _args: fmt::Arguments<'_>) {}
        fn error(&self, _args: fmt::Arguments<'_>) {}
    }

    fn client(transport: MockTransport) -> HealthchecksClient<MockTransport> {
        HealthchecksClient::builder("secret").transport(transport)
    }

    fn body_json(req: &HttpRequest) -> serde_json::Value {
        serde_json::from_slice(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn build_list_checks_produces_correct_request() {
        let req = client(MockTransport::failing("unused")).build_list_checks();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, format!("{BASE_URL}/checks/"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("x-api-key"), Some("secret"));
        assert!(req.body.is_none());
    }

    #[test]
    fn list_checks_parses_envelope() {
        let c = client(MockTransport::responding(
            200,
            r#"{"checks":[{"name":"x","update_url":"https://healthchecks.io/api/v1/checks/1"}]}"#,
        ));
        let checks = c.list_checks().unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].name, "x");
        assert_eq!(checks[0].id(), "1");
    }

    #[test]
    fn list_checks_keeps_server_order() {
        let c = client(MockTransport::responding(
            200,
            r#"{"checks":[{"name":"b"},{"name":"a"},{"name":"c"}]}"#,
        ));
        let names: Vec<String> = c.list_checks().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn create_check_posts_present_fields_only() {
        let c = client(MockTransport::responding(
            201,
            r#"{"name":"backups","timeout":3600,"status":"new","update_url":"https://healthchecks.io/api/v1/checks/9f1"}"#,
        ));
        let check = Check {
            name: Some("backups".to_string()),
            timeout: Some(3600),
            unique: Some(vec!["name".to_string()]),
            ..Check::default()
        };
        let created = c.create_check(&check).unwrap();
        assert_eq!(created.status, "new");
        assert_eq!(created.id(), "9f1");

        let req = c.transport().last_request();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("{BASE_URL}/checks/"));
        assert_eq!(
            body_json(&req),
            serde_json::json!({"name": "backups", "timeout": 3600, "unique": ["name"]})
        );
    }

    #[test]
    fn update_check_targets_check_path() {
        let c = client(MockTransport::responding(200, r#"{"name":"renamed"}"#));
        let updated = c.update_check("abc", &Check::named("renamed")).unwrap();
        assert_eq!(updated.name, "renamed");

        let req = c.transport().last_request();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("{BASE_URL}/checks/abc"));
        assert_eq!(body_json(&req), serde_json::json!({"name": "renamed"}));
    }

    #[test]
    fn update_with_cleared_channels_sends_empty_string() {
        let c = client(MockTransport::responding(200, r#"{"channels":""}"#));
        let mut check = Check::default();
        check.clear_channels();
        c.update_check("abc", &check).unwrap();

        let req = c.transport().last_request();
        assert_eq!(body_json(&req), serde_json::json!({"channels": ""}));
    }

    #[test]
    fn update_with_unset_channels_omits_field() {
        let c = client(MockTransport::responding(200, r#"{}"#));
        c.update_check("abc", &Check::default()).unwrap();

        let req = c.transport().last_request();
        assert_eq!(body_json(&req), serde_json::json!({}));
    }

    #[test]
    fn pause_check_posts_without_body() {
        let c = client(MockTransport::responding(200, r#"{"status":"paused"}"#));
        let paused = c.pause_check("abc").unwrap();
        assert_eq!(paused.status, "paused");

        let req = c.transport().last_request();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("{BASE_URL}/checks/abc/pause"));
        assert!(req.body.is_none());
    }

    #[test]
    fn delete_check_returns_final_state() {
        let c = client(MockTransport::responding(
            200,
            r#"{"name":"gone","update_url":"https://healthchecks.io/api/v1/checks/abc"}"#,
        ));
        let deleted = c.delete_check("abc").unwrap();
        assert_eq!(deleted.name, "gone");

        let req = c.transport().last_request();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, format!("{BASE_URL}/checks/abc"));
        assert!(req.body.is_none());
    }

    #[test]
    fn list_channels_parses_envelope() {
        let c = client(MockTransport::responding(
            200,
            r#"{"channels":[{"id":"4ec5a071","name":"ops","kind":"email"}]}"#,
        ));
        let channels = c.list_channels().unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].kind, "email");

        let req = c.transport().last_request();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, format!("{BASE_URL}/channels/"));
    }

    #[test]
    fn not_found_becomes_api_error() {
        let c = client(MockTransport::responding(404, r#"{"error":"not found"}"#));
        let err = c.delete_check("missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.message(), "not found");
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.status(), "404 Not Found");
        assert_eq!(err.method(), Some(HttpMethod::Delete));
        assert_eq!(err.url(), format!("{BASE_URL}/checks/missing"));
    }

    #[test]
    fn unparseable_error_body_becomes_decode_error() {
        let c = client(MockTransport::responding(502, "<html>bad gateway</html>"));
        let err = c.list_checks().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(err.status(), "502 Bad Gateway");
        assert!(!err.message().is_empty());
    }

    #[test]
    fn redirect_status_is_an_error() {
        let c = client(MockTransport::responding(301, r#"{"error":"moved"}"#));
        let err = c.list_channels().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.message(), "moved");
    }

    #[test]
    fn unparseable_success_body_becomes_decode_error() {
        let c = client(MockTransport::responding(200, "not json"));
        let err = c.pause_check("abc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.status_code(), Some(200));
    }

    #[test]
    fn transport_failure_has_request_context_and_no_status() {
        let c = client(MockTransport::failing("connection refused"));
        let err = c.list_checks().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), "");
        assert_eq!(err.status_code(), None);
        assert_eq!(err.method(), Some(HttpMethod::Get));
        assert_eq!(err.url(), format!("{BASE_URL}/checks/"));
        assert_eq!(err.message(), "connection refused");
    }

    #[test]
    fn logs_each_request_at_debug() {
        let logger = Arc::new(CountingLogger::default());
        let c = HealthchecksClient::builder("secret")
            .logger(logger.clone())
            .transport(MockTransport::responding(200, r#"{"checks":[]}"#));
        c.list_checks().unwrap();
        c.list_checks().unwrap();

        let lines = logger.0.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("HTTP GET {BASE_URL}/checks/"));
    }

    #[test]
    fn custom_base_url_is_used() {
        let c = HealthchecksClient::builder("secret")
            .base_url("http://localhost:8000/api/v3/")
            .transport(MockTransport::failing("unused"));
        assert_eq!(c.build_pause_check("x").url, "http://localhost:8000/api/v3/checks/x/pause");
    }

    #[test]
    fn from_parts_ignores_trailing_slash_on_base_url() {
        let mut config = ClientConfig::new("secret");
        config.base_url = "http://localhost:8000/api/v3/".to_string();
        let c = HealthchecksClient::from_parts(
            config,
            MockTransport::failing("unused"),
            Arc::new(NoOpLogger),
        );
        assert_eq!(c.build_pause_check("x").url, "http://localhost:8000/api/v3/checks/x/pause");
        assert_eq!(c.build_list_checks().url, "http://localhost:8000/api/v3/checks/");
    }

    #[test]
    fn api_error_without_error_field_has_empty_message() {
        let c = client(MockTransport::responding(400, r#"{"detail":"bad"}"#));
        let err = c.list_checks().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.message(), "");
        assert_eq!(err.status_code(), Some(400));
    }

    #[test]
    fn api_error_with_null_error_field_has_empty_message() {
        let c = client(MockTransport::responding(409, r#"{"error":null}"#));
        let err = c.delete_check("abc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.message(), "");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let c = client(MockTransport::failing("unused"));
        let rendered = format!("{c:?}");
        assert!(rendered.contains("healthchecks.io"));
        assert!(!rendered.contains("secret"));
    }
}
