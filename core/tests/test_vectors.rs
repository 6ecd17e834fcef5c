//! Verify `build_request` / `parse_response` against JSON test vectors stored
//! in `test-vectors/`.
//!
//! Bodies are compared as parsed JSON so field order never matters; query
//! strings are compared verbatim since params come out key-sorted.

use kaiten::{ApiError, Engine, HttpMethod, HttpResponse, Params, SessionConfig, UreqTransport};
use serde_json::{json, Value};

fn engine(vectors: &Value) -> Engine {
    let config = &vectors["config"];
    let config = SessionConfig::new(
        config["host"].as_str().unwrap(),
        config["username"].as_str().unwrap(),
        config["password"].as_str().unwrap(),
    );
    Engine::new(config, UreqTransport::new())
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

/// Flatten an error into the JSON shape the vectors describe.
fn describe(err: ApiError) -> Value {
    match err {
        ApiError::InvalidResponseFormat { path, method, body } => json!({
            "error": "InvalidResponseFormat", "path": path, "method": method.as_str(), "body": body,
        }),
        ApiError::Unauthorized { username } => json!({"error": "Unauthorized", "username": username}),
        ApiError::AccessDenied { username, path, method } => json!({
            "error": "AccessDenied", "username": username, "path": path, "method": method.as_str(),
        }),
        ApiError::UnexpectedError { status, path, method, body } => json!({
            "error": "UnexpectedError", "status": status, "path": path, "method": method.as_str(), "body": body,
        }),
        other => panic!("unexpected error kind: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let engine = engine(&vectors);

    let expected_headers: Vec<(String, String)> = vectors["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method = parse_method(case["method"].as_str().unwrap());
        let params: Params = serde_json::from_value(case["params"].clone()).unwrap();
        let expected = &case["expected"];

        let req = engine
            .build_request(method, case["path"].as_str().unwrap(), &params)
            .unwrap();

        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.path, expected["path"].as_str().unwrap(), "{name}: path");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        match &expected["body"] {
            Value::Null => assert!(req.body.is_none(), "{name}: body should be absent"),
            body => {
                let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&sent, body, "{name}: body");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let engine = engine(&vectors);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method = parse_method(case["method"].as_str().unwrap());
        let path = case["path"].as_str().unwrap();
        let response = HttpResponse::new(
            case["response"]["status"].as_u64().unwrap() as u16,
            case["response"]["body"].as_str().unwrap(),
        );
        let expected = &case["expected"];

        match engine.parse_response(method, path, response) {
            Ok(value) => assert_eq!(value, expected["ok"], "{name}: decoded body"),
            Err(err) => {
                assert!(expected.get("ok").is_none(), "{name}: unexpected error {err:?}");
                assert_eq!(&describe(err), expected, "{name}: error");
            }
        }
    }
}
