//! Authenticated request/response round trips against the Kaiten API.
//!
//! # Design
//! Every operation is split the same way: `build_request` turns a method,
//! path and parameters into an `HttpRequest`, and `parse_response` turns an
//! `HttpResponse` into decoded JSON or a typed `ApiError`. Both halves are
//! pure. `request` glues them around one `Transport::send` call, which is the
//! only I/O the crate performs.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::config::SessionConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Fixed entry point every resource path lives under.
pub const API_PREFIX: &str = "/api/v1";

/// Client identifier sent in the `User-Agent` header.
pub const USER_AGENT: &str = "KaitenAPIClientRust";

/// Request parameters: query string for GET, JSON body for everything else.
pub type Params = Map<String, Value>;

/// Owns the credentials and the transport; the only component that talks
/// to the network.
pub struct Engine {
    config: SessionConfig,
    authorization: String,
    transport: Box<dyn Transport>,
}

impl Engine {
    pub fn new(config: SessionConfig, transport: impl Transport + 'static) -> Self {
        let authorization = basic_auth(config.username(), config.password());
        Self {
            config,
            authorization,
            transport: Box::new(transport),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Build the request for `method` on `path` without sending it.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: &Params,
    ) -> Result<HttpRequest, ApiError> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        let (path, body) = match method {
            HttpMethod::Get => (with_query(path, params), None),
            _ => (path, Some(serde_json::to_string(params)?)),
        };

        Ok(HttpRequest {
            method,
            url: format!("{}{API_PREFIX}{path}", self.config.base_url()),
            path,
            headers: vec![
                ("Authorization".to_string(), self.authorization.clone()),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
            ],
            body,
        })
    }

    /// Classify `response` by status and decode its body.
    pub fn parse_response(
        &self,
        method: HttpMethod,
        path: &str,
        response: HttpResponse,
    ) -> Result<Value, ApiError> {
        match response.status {
            200 => serde_json::from_str(&response.body).map_err(|_| {
                ApiError::InvalidResponseFormat {
                    path: path.to_string(),
                    method,
                    body: response.body,
                }
            }),
            401 => Err(ApiError::Unauthorized {
                username: self.config.username().to_string(),
            }),
            403 => Err(ApiError::AccessDenied {
                username: self.config.username().to_string(),
                path: path.to_string(),
                method,
            }),
            status => Err(ApiError::UnexpectedError {
                status,
                path: path.to_string(),
                method,
                body: response.body,
            }),
        }
    }

    /// Perform one authenticated round trip and return the decoded body.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        params: &Params,
    ) -> Result<Value, ApiError> {
        let request = self.build_request(method, path, params)?;

        if self.config.debug() {
            tracing::debug!(
                method = %request.method,
                path = %request.path,
                body = request.body.as_deref().unwrap_or(""),
                "sending request"
            );
        }

        let response = self
            .transport
            .send(&request)
            .map_err(|source| ApiError::TransportFailure {
                path: request.path.clone(),
                method,
                source,
            })?;

        if self.config.debug() {
            tracing::debug!(
                status = response.status,
                body = %response.body,
                "received response"
            );
        }

        self.parse_response(method, &request.path, response)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Append `params` to `path` as a form-encoded query string.
fn with_query(path: String, params: &Params) -> String {
    if params.is_empty() {
        return path;
    }
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        query.append_pair(key, &query_value(value));
    }
    format!("{path}?{}", query.finish())
}

fn query_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(query_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::ScriptedTransport;

    fn engine() -> Engine {
        let config = SessionConfig::new("team.kaiten.io", "alice", "s3cret");
        Engine::new(config, ScriptedTransport::new())
    }

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    #[test]
    fn get_serializes_params_as_query_string() {
        let req = engine()
            .build_request(
                HttpMethod::Get,
                "/cards",
                &params(json!({"board_id": 7, "query": "two words"})),
            )
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "/cards?board_id=7&query=two+words");
        assert_eq!(
            req.url,
            "https://team.kaiten.io/api/v1/cards?board_id=7&query=two+words"
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn get_without_params_has_no_question_mark() {
        let req = engine()
            .build_request(HttpMethod::Get, "/spaces", &Params::new())
            .unwrap();
        assert_eq!(req.url, "https://team.kaiten.io/api/v1/spaces");
    }

    #[test]
    fn non_get_serializes_params_as_json_body() {
        for method in [HttpMethod::Post, HttpMethod::Patch, HttpMethod::Delete] {
            let req = engine()
                .build_request(method, "/cards/42", &params(json!({"title": "X"})))
                .unwrap();
            assert_eq!(req.url, "https://team.kaiten.io/api/v1/cards/42");
            let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(body, json!({"title": "X"}), "{method}");
        }
    }

    #[test]
    fn empty_params_still_send_an_object_body() {
        let req = engine()
            .build_request(HttpMethod::Delete, "/boards/3", &Params::new())
            .unwrap();
        assert_eq!(req.body.as_deref(), Some("{}"));
    }

    #[test]
    fn relative_path_gains_leading_slash() {
        let req = engine()
            .build_request(HttpMethod::Get, "users", &Params::new())
            .unwrap();
        assert_eq!(req.path, "/users");
    }

    #[test]
    fn every_request_carries_fixed_headers() {
        let req = engine()
            .build_request(HttpMethod::Post, "/spaces", &Params::new())
            .unwrap();
        // base64("alice:s3cret")
        assert_eq!(req.header("Authorization"), Some("Basic YWxpY2U6czNjcmV0"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.header("User-Agent"), Some(USER_AGENT));
    }

    #[test]
    fn query_values_flatten_arrays_and_nulls() {
        let req = engine()
            .build_request(
                HttpMethod::Get,
                "/cards",
                &params(json!({"archived": false, "owner": null, "states": [1, 2]})),
            )
            .unwrap();
        assert_eq!(req.path, "/cards?archived=false&owner=&states=1%2C2");
    }

    #[test]
    fn status_200_decodes_json() {
        let value = engine()
            .parse_response(HttpMethod::Get, "/tags", HttpResponse::new(200, r#"[{"id":1}]"#))
            .unwrap();
        assert_eq!(value, json!([{"id": 1}]));
    }

    #[test]
    fn status_200_with_garbage_is_invalid_format() {
        let err = engine()
            .parse_response(HttpMethod::Get, "/tags", HttpResponse::new(200, "<html>"))
            .unwrap_err();
        match err {
            ApiError::InvalidResponseFormat { path, method, body } => {
                assert_eq!(path, "/tags");
                assert_eq!(method, HttpMethod::Get);
                assert_eq!(body, "<html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn status_401_carries_username() {
        let err = engine()
            .parse_response(HttpMethod::Get, "/spaces", HttpResponse::new(401, ""))
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { username } if username == "alice"));
    }

    #[test]
    fn status_403_carries_path_and_method() {
        let err = engine()
            .parse_response(HttpMethod::Patch, "/cards/1", HttpResponse::new(403, ""))
            .unwrap_err();
        match err {
            ApiError::AccessDenied { username, path, method } => {
                assert_eq!(username, "alice");
                assert_eq!(path, "/cards/1");
                assert_eq!(method, HttpMethod::Patch);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn other_status_is_unexpected_error() {
        let err = engine()
            .parse_response(HttpMethod::Get, "/spaces", HttpResponse::new(999, "weird"))
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::UnexpectedError { status: 999, ref body, .. } if body == "weird"
        ));
    }

    #[test]
    fn request_routes_through_transport() {
        let transport = ScriptedTransport::new();
        transport.push(HttpResponse::new(200, r#"{"id": 5}"#));
        let engine = Engine::new(
            SessionConfig::new("team.kaiten.io", "alice", "s3cret"),
            transport.clone(),
        );

        let value = engine
            .request(HttpMethod::Get, "/spaces/5", &Params::new())
            .unwrap();
        assert_eq!(value, json!({"id": 5}));

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://team.kaiten.io/api/v1/spaces/5");
    }

    #[test]
    fn transport_failure_is_typed() {
        let transport = ScriptedTransport::new();
        transport.fail("connection refused");
        let engine = Engine::new(SessionConfig::new("h", "u", "p"), transport);

        let err = engine
            .request(HttpMethod::Delete, "/tags/1", &Params::new())
            .unwrap_err();
        match err {
            ApiError::TransportFailure { path, method, source } => {
                assert_eq!(path, "/tags/1");
                assert_eq!(method, HttpMethod::Delete);
                assert_eq!(source.message(), "connection refused");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tracing_test::traced_test]
    #[test]
    fn debug_mode_traces_request_and_response() {
        let transport = ScriptedTransport::new();
        transport.push(HttpResponse::new(200, r#"{"id": 9}"#));
        let engine = Engine::new(
            SessionConfig::new("h", "u", "p").with_debug(true),
            transport,
        );

        engine
            .request(HttpMethod::Post, "/spaces", &params(json!({"title": "Ops"})))
            .unwrap();

        assert!(logs_contain("sending request"));
        assert!(logs_contain("received response"));
    }

    #[tracing_test::traced_test]
    #[test]
    fn quiet_mode_does_not_trace() {
        let transport = ScriptedTransport::new();
        transport.push(HttpResponse::new(200, "[]"));
        let engine = Engine::new(SessionConfig::new("h", "u", "p"), transport);

        engine
            .request(HttpMethod::Get, "/spaces", &Params::new())
            .unwrap();

        assert!(!logs_contain("sending request"));
    }
}
