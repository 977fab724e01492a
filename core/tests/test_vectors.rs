//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes a collection binding, the request an operation
//! must build, a simulated response, and either the resulting model state or
//! the kind of error the response must produce. Bodies are compared as parsed
//! JSON so field order does not matter.

use restmodel_core::{ApiError, Collection, Field, FieldKind, HttpMethod, HttpRequest, HttpResponse, Model, Tracked, UreqTransport};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct User {
    id: Option<u64>,
    name: Option<String>,
    email: Option<String>,
}

impl Model for User {
    const COLLECTION: &'static str = "users";
    const FIELDS: &'static [Field] = &[
        Field::new("id", FieldKind::Integer).primary(),
        Field::new("name", FieldKind::String),
        Field::new("email", FieldKind::String),
    ];
}

fn collection(case: &Value) -> Collection<User, UreqTransport> {
    Collection::new(case["base_url"].as_str().unwrap(), UreqTransport::new())
}

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn string_pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .map(|pairs| {
            pairs
                .iter()
                .map(|pair| {
                    let pair = pair.as_array().unwrap();
                    (pair[0].as_str().unwrap().to_string(), pair[1].as_str().unwrap().to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}

fn simulated_response(case: &Value) -> HttpResponse {
    let response = &case["response"];
    HttpResponse {
        status: response["status"].as_u64().unwrap() as u16,
        headers: string_pairs(&response["headers"]),
        body: response["body"].as_str().unwrap().as_bytes().to_vec(),
    }
}

fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");

    if let Some(headers) = expected.get("headers") {
        assert_eq!(req.headers, string_pairs(headers), "{name}: headers");
    }
    match expected.get("body") {
        Some(body) => {
            let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&sent, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: unexpected body"),
    }
}

fn error_kind(err: &ApiError) -> &'static str {
    match err {
        ApiError::Http { .. } => "http",
        ApiError::Decode(_) => "decode",
        ApiError::ExpectedArray { .. } => "expected_array",
        ApiError::Validation(_) => "validation",
        ApiError::MissingIdentity { .. } => "missing_identity",
        ApiError::Serialization(_) => "serialization",
        ApiError::Transport(_) => "transport",
    }
}

fn assert_error(name: &str, err: &ApiError, expected: &Value) {
    assert_eq!(error_kind(err), expected["kind"].as_str().unwrap(), "{name}: error kind ({err})");
    if let Some(status) = expected.get("status") {
        assert_eq!(err.status().map(u64::from), status.as_u64(), "{name}: status");
    }
}

fn assert_model(name: &str, obj: &Tracked<User>, expected: &Value) {
    assert!(obj.is_persisted(), "{name}: persisted");
    assert_eq!(&serde_json::to_value(obj.model()).unwrap(), expected, "{name}: result");
}

#[test]
fn list_test_vectors() {
    for case in cases(include_str!("../../test-vectors/list.json")) {
        let name = case["name"].as_str().unwrap();
        let c = collection(&case);

        let params = string_pairs(&case["params"]);
        let params: Vec<(&str, &str)> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let req = if params.is_empty() { c.build_all() } else { c.build_query(&params) };
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_list(simulated_response(&case));
        if let Some(expected) = case.get("expected_error") {
            assert_error(name, &result.unwrap_err(), expected);
            continue;
        }
        let users = result.unwrap();
        let expected = case["expected_result"].as_array().unwrap();
        assert_eq!(users.len(), expected.len(), "{name}: length");
        for (user, expected) in users.iter().zip(expected) {
            assert_model(name, user, expected);
        }
    }
}

#[test]
fn get_test_vectors() {
    for case in cases(include_str!("../../test-vectors/get.json")) {
        let name = case["name"].as_str().unwrap();
        let c = collection(&case);

        let req = c.build_get(case["id"].as_str().unwrap());
        assert_request(name, &req, &case["expected_request"]);

        match (c.parse_get(simulated_response(&case)), case.get("expected_error")) {
            (Err(err), Some(expected)) => assert_error(name, &err, expected),
            (Ok(user), None) => assert_model(name, &user, &case["expected_result"]),
            (result, _) => panic!("{name}: unexpected outcome {result:?}"),
        }
    }
}

#[test]
fn add_test_vectors() {
    for case in cases(include_str!("../../test-vectors/add.json")) {
        let name = case["name"].as_str().unwrap();
        let c = collection(&case);

        let input: User = serde_json::from_value(case["input"].clone()).unwrap();
        let obj = if case["persisted"].as_bool().unwrap() {
            Tracked::persisted(input)
        } else {
            Tracked::new(input)
        };

        let req = c.build_add(&obj).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        match (c.parse_add(obj, simulated_response(&case)), case.get("expected_error")) {
            (Err(err), Some(expected)) => assert_error(name, &err, expected),
            (Ok(user), None) => assert_model(name, &user, &case["expected_result"]),
            (result, _) => panic!("{name}: unexpected outcome {result:?}"),
        }
    }
}

#[test]
fn delete_test_vectors() {
    for case in cases(include_str!("../../test-vectors/delete.json")) {
        let name = case["name"].as_str().unwrap();
        let c = collection(&case);

        let input: User = serde_json::from_value(case["input"].clone()).unwrap();
        let req = c.build_delete(&Tracked::persisted(input)).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        match (c.parse_delete(simulated_response(&case)), case.get("expected_error")) {
            (Err(err), Some(expected)) => assert_error(name, &err, expected),
            (Ok(()), None) => {}
            (result, _) => panic!("{name}: unexpected outcome {result:?}"),
        }
    }
}

#[test]
fn delete_without_primary_key_fails_before_io() {
    let c: Collection<User, UreqTransport> = Collection::new("http://localhost:3000/users", UreqTransport::new());
    let err = c.build_delete(&Tracked::persisted(User::default())).unwrap_err();
    assert!(matches!(err, ApiError::MissingIdentity { model: "User" }));
}
