//! Tests for creator identity mocking
//!
//! Identity lifecycle: set, observed by chaincode, cleared by policy.

use chaincode_mock_core_rs::dispatch::{ChaincodeError, Context, Router};
use chaincode_mock_core_rs::{Creator, MockStub, MockStubConfig, SerializedIdentity};
use serde_json::Value;

/// Chaincode that returns the caller's msp id
fn whoami() -> Router {
    Router::new("whoami").route("whoami", |ctx: &mut Context<'_>| -> Result<String, ChaincodeError> {
        Ok(ctx.creator()?.mspid)
    })
}

#[test]
fn test_identity_absent_until_set() {
    let stub = MockStub::new("whoami", whoami());
    assert!(stub.creator().is_none());

    let response = stub.invoke("whoami", ());
    assert!(response.is_err());
    assert_eq!(response.message, "creator identity is not set");
}

#[test]
fn test_identity_persists_across_calls() {
    let stub = MockStub::new("whoami", whoami());
    stub.mock_creator("org1", "cert1");

    for _ in 0..3 {
        let response = stub.invoke("whoami", ());
        assert_eq!(response.payload_json::<String>().unwrap(), "org1");
    }
    assert_eq!(stub.creator(), Some(SerializedIdentity::new("org1", "cert1")));
}

#[test]
fn test_identity_replaced_by_next_set() {
    let stub = MockStub::new("whoami", whoami());
    stub.from_creator(("org1", "cert1"));
    stub.from_creator(["org2", "cert2"]);

    let response = stub.invoke("whoami", ());
    assert_eq!(response.payload_json::<String>().unwrap(), "org2");
}

#[test]
fn test_identity_cleared_after_call_under_policy() {
    let config = MockStubConfig::default().with_clear_creator_after_invoke(true);
    let stub = MockStub::with_config("whoami", whoami(), config);

    let response = stub.from_creator(("org1", "cert1")).invoke("whoami", ());
    assert_eq!(response.payload_json::<String>().unwrap(), "org1");
    assert!(stub.creator().is_none());

    assert!(stub.invoke("whoami", ()).is_err());
}

#[test]
fn test_identity_cleared_even_when_call_fails() {
    let config = MockStubConfig::default().with_clear_creator_after_invoke(true);
    let stub = MockStub::with_config("whoami", whoami(), config);

    let response = stub.from_creator(("org1", "cert1")).invoke("unknown", ());
    assert!(response.is_err());
    assert!(stub.creator().is_none());
}

#[test]
fn test_transform_takes_precedence() {
    let stub = MockStub::new("whoami", whoami());
    stub.register_creator_transformer(|values: &[Value]| {
        let org = values[0].as_str().unwrap_or("unknown").to_uppercase();
        (format!("{}MSP", org), "transformed-cert".to_string())
    });

    stub.from_creator(Creator::custom(vec![Value::from("magneto")]));
    assert_eq!(stub.creator().unwrap().mspid, "MAGNETOMSP");

    stub.from_creator(("digibank", "ignored"));
    let identity = stub.creator().unwrap();
    assert_eq!(identity.mspid, "DIGIBANKMSP");
    assert_eq!(identity.cert(), "transformed-cert");
}

#[test]
#[should_panic(expected = "unknown args type")]
fn test_custom_shape_without_transform_panics() {
    let stub = MockStub::new("whoami", whoami());
    stub.from_creator(Creator::custom(vec![Value::from(42)]));
}

#[test]
fn test_try_from_creator_reports_misuse() {
    let stub = MockStub::new("whoami", whoami());
    assert!(stub
        .try_from_creator(Creator::custom(Vec::<Value>::new()))
        .is_err());
    assert!(stub.creator().is_none());
}
