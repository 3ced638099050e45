//! Typed facade clients against patched dispatch functions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;
use tether_api::params::{
    Action, ActionResult, ActionResults, Actions, ActionsByReceiver, ActionsByReceivers, Entities,
    ErrorResult, ErrorResults, ServiceMetricCredentials,
};
use tether_api::{action, service, ApiCaller, ApiError, Error, Result};
use tether_core::Value;

/// Fails every call; patched clients must never reach it.
struct Unreachable;

impl ApiCaller for Unreachable {
    fn api_call(
        &self,
        facade: &str,
        _version: u32,
        request: &str,
        _params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        Err(Error::Transport {
            op: format!("{facade}.{request}"),
            reason: "connection is shut down".to_string(),
        })
    }
}

// ============================================================================
// Service facade
// ============================================================================

#[test]
fn test_set_service_metric_credentials() {
    let called = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&called);
    let mut client = service::Client::new(Arc::new(Unreachable));
    client.patch_facade_call(Arc::new(move |request: &str, params: serde_json::Value| {
        seen.store(true, Ordering::SeqCst);
        assert_eq!(request, "SetMetricCredentials");
        let args: ServiceMetricCredentials = serde_json::from_value(params).unwrap();
        assert_eq!(args.creds.len(), 1);
        assert_eq!(args.creds[0].service_name, "serviceA");
        assert_eq!(args.creds[0].metric_credentials, b"creds 1");

        Ok(serde_json::to_value(ErrorResults {
            results: vec![ErrorResult::default()],
        })
        .unwrap())
    }));

    client.set_metric_credentials("serviceA", b"creds 1").unwrap();
    assert!(called.load(Ordering::SeqCst));
}

#[test]
fn test_set_service_metric_credentials_fails() {
    let called = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&called);
    let mut client = service::Client::new(Arc::new(Unreachable));
    client.patch_facade_call(Arc::new(move |request: &str, _: serde_json::Value| {
        seen.store(true, Ordering::SeqCst);
        assert_eq!(request, "SetMetricCredentials");
        let results = ErrorResults {
            results: vec![ErrorResult::failed(ApiError::perm())],
        };
        results.clone().one_error()?;
        Ok(serde_json::to_value(results).unwrap())
    }));

    let err = client.set_metric_credentials("service", b"creds").unwrap_err();
    assert_eq!(err.to_string(), "permission denied");
    assert!(err.is_unauthorized());
    assert!(called.load(Ordering::SeqCst));
}

#[test]
fn test_set_service_metric_credentials_error_in_results() {
    let mut client = service::Client::new(Arc::new(Unreachable));
    client.patch_facade_call(Arc::new(|_: &str, _: serde_json::Value| {
        Ok(json!({"results": [{"error": {"message": "permission denied", "code": "unauthorized access"}}]}))
    }));

    let err = client.set_metric_credentials("service", b"creds").unwrap_err();
    assert_eq!(err.to_string(), "permission denied");
}

#[test]
fn test_set_service_metric_credentials_wrong_count() {
    let mut client = service::Client::new(Arc::new(Unreachable));
    client.patch_facade_call(Arc::new(|_: &str, _: serde_json::Value| {
        Ok(json!({"results": []}))
    }));

    let err = client.set_metric_credentials("service", b"creds").unwrap_err();
    assert_eq!(err, Error::CountMismatch { expected: 1, actual: 0 });
}

#[test]
fn test_transport_error_passes_through() {
    let client = service::Client::new(Arc::new(Unreachable));
    let err = client.set_metric_credentials("service", b"creds").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Service.SetMetricCredentials: connection is shut down"
    );
}

// ============================================================================
// Action facade
// ============================================================================

#[test]
fn test_enqueue_sends_actions_in_order() {
    let mut client = action::Client::new(Arc::new(Unreachable));
    client.patch_facade_call(Arc::new(|request: &str, params: serde_json::Value| {
        assert_eq!(request, "Enqueue");
        let args: Actions = serde_json::from_value(params).unwrap();
        let results = args
            .actions
            .iter()
            .map(|a| ActionResult::failed(ApiError::message(a.name.clone())))
            .collect();
        Ok(serde_json::to_value(ActionResults { results }).unwrap())
    }));

    let actions = Actions {
        actions: ["backup", "restore"]
            .into_iter()
            .map(|name| Action {
                receiver: "unit-mysql-0".to_string(),
                name: name.to_string(),
                parameters: Value::Null,
            })
            .collect(),
    };
    let results = client.enqueue(actions).unwrap();
    let names: Vec<String> = results
        .results
        .into_iter()
        .map(|r| r.error.unwrap().message)
        .collect();
    assert_eq!(names, ["backup", "restore"]);
}

#[test]
fn test_list_actions_checks_count() {
    let mut client = action::Client::new(Arc::new(Unreachable));
    client.patch_facade_call(Arc::new(|request: &str, _: serde_json::Value| {
        assert_eq!(request, "ListAll");
        Ok(serde_json::to_value(ActionsByReceivers {
            actions: vec![ActionsByReceiver {
                receiver: "unit-mysql-0".to_string(),
                ..ActionsByReceiver::default()
            }],
        })
        .unwrap())
    }));

    let one = client
        .actions(Entities::from_tags(["unit-mysql-0"]))
        .unwrap();
    assert_eq!(one.actions[0].receiver, "unit-mysql-0");

    let err = client
        .actions(Entities::from_tags(["unit-mysql-0", "unit-mysql-1"]))
        .unwrap_err();
    assert_eq!(err, Error::CountMismatch { expected: 2, actual: 1 });
}
