//! End-to-end facade tests: typed clients over an in-process connection to
//! a dispatcher backed by real state. No mocks.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tether_api::params::{Action, Actions, Entities};
use tether_api::{action, service, Error};
use tether_apiserver::{Authorizer, Dispatcher, InProcessConnection};
use tether_core::{ActionTag, Tag, Value};
use tether_state::State;
use tether_storage::DocumentStore;
use uuid::Uuid;

// ============================================================================
// Test Helpers
// ============================================================================

fn new_state() -> State {
    State::new(DocumentStore::new(), Uuid::new_v4())
}

fn connect(st: &State, authorizer: Authorizer) -> Arc<InProcessConnection> {
    Arc::new(InProcessConnection::new(Dispatcher::new(st.clone(), authorizer)))
}

fn admin(st: &State) -> Arc<InProcessConnection> {
    connect(st, Authorizer::client("user-admin"))
}

fn action_for(receiver: &str, name: &str) -> Action {
    Action {
        receiver: receiver.to_string(),
        name: name.to_string(),
        parameters: Value::Null,
    }
}

// ============================================================================
// Service facade
// ============================================================================

#[test]
fn test_set_metric_credentials_no_mocks() {
    let st = new_state();
    let mut svc = st.add_service("mysql").unwrap();
    let client = service::Client::new(admin(&st));

    client.set_metric_credentials(svc.name(), b"creds").unwrap();

    svc.refresh().unwrap();
    assert_eq!(svc.metric_credentials().unwrap(), b"creds");
}

#[test]
fn test_set_metric_credentials_unknown_service() {
    let st = new_state();
    let client = service::Client::new(admin(&st));

    let err = client.set_metric_credentials("wordpress", b"creds").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "service \"wordpress\" not found");
}

#[test]
fn test_set_metric_credentials_permission_denied() {
    let st = new_state();
    st.add_service("mysql").unwrap();
    let deny_services = Authorizer::client("user-bob")
        .with_access(Arc::new(|tag: &Tag| !matches!(tag, Tag::Service(_))));
    let client = service::Client::new(connect(&st, deny_services));

    let err = client.set_metric_credentials("mysql", b"creds").unwrap_err();
    assert_eq!(err.to_string(), "permission denied");
    assert!(st.service("mysql").unwrap().metric_credentials().unwrap().is_empty());
}

#[test]
fn test_agents_cannot_use_client_facades() {
    let st = new_state();
    st.add_service("mysql").unwrap();
    let client = service::Client::new(connect(&st, Authorizer::agent("unit-mysql-0")));

    let err = client.set_metric_credentials("mysql", b"creds").unwrap_err();
    assert!(err.is_unauthorized());
}

// ============================================================================
// Action facade
// ============================================================================

#[test]
fn test_enqueue_with_one_missing_receiver() {
    let st = new_state();
    st.add_service("mysql").unwrap().add_unit().unwrap();
    let client = action::Client::new(admin(&st));

    let results = client
        .enqueue(Actions {
            actions: vec![
                action_for("unit-mysql-0", "backup"),
                action_for("unit-mysql-1", "backup"),
            ],
        })
        .unwrap();

    assert_eq!(results.results.len(), 2);
    let first = &results.results[0];
    assert!(first.error.is_none());
    let tag = ActionTag::parse(&first.action.as_ref().unwrap().tag).unwrap();
    assert_eq!(st.action(tag.id()).unwrap().receiver(), "mysql/0");

    let second = &results.results[1];
    assert!(second.action.is_none());
    assert!(second.error.as_ref().unwrap().is_not_found());
}

#[test]
fn test_enqueue_rejects_bad_items_individually() {
    let st = new_state();
    st.add_service("mysql").unwrap().add_unit().unwrap();
    let client = action::Client::new(admin(&st));

    let mut bad_params = action_for("unit-mysql-0", "backup");
    bad_params.parameters = Value::from("not an object");
    let results = client
        .enqueue(Actions {
            actions: vec![
                action_for("service-mysql", "backup"),
                action_for("unit-mysql-0", "Backup!"),
                bad_params,
                action_for("unit-mysql-0", "backup"),
            ],
        })
        .unwrap();

    let errors: Vec<bool> = results.results.iter().map(|r| r.error.is_some()).collect();
    assert_eq!(errors, [true, true, true, false]);
    assert_eq!(
        results.results[1].error.as_ref().unwrap().message,
        "invalid action name \"Backup!\""
    );
}

#[test]
fn test_list_all_returns_queued_actions() {
    let st = new_state();
    st.add_service("mysql").unwrap().add_unit().unwrap();
    let client = action::Client::new(admin(&st));

    let mut with_params = action_for("unit-mysql-0", "snapshot");
    with_params.parameters = with_params_value();
    client
        .enqueue(Actions {
            actions: vec![action_for("unit-mysql-0", "backup"), with_params],
        })
        .unwrap();

    let listed = client
        .actions(Entities::from_tags(["unit-mysql-0", "unit-mysql-5", "bogus"]))
        .unwrap();
    assert_eq!(listed.actions.len(), 3);

    let queued = &listed.actions[0];
    assert!(queued.error.is_none());
    let names: Vec<&str> = queued
        .actions
        .iter()
        .map(|r| r.action.as_ref().unwrap().name.as_str())
        .collect();
    assert_eq!(names, ["backup", "snapshot"]);
    assert_eq!(queued.actions[0].status, "pending");
    assert_eq!(
        queued.actions[1].action.as_ref().unwrap().parameters,
        with_params_value()
    );

    // A unit with nothing queued lists empty; a malformed tag is an error.
    assert!(listed.actions[1].error.is_none());
    assert!(listed.actions[1].actions.is_empty());
    assert!(listed.actions[2].error.is_some());
}

fn with_params_value() -> Value {
    Value::Object(
        [("outfile".to_string(), Value::from("out.tar"))]
            .into_iter()
            .collect(),
    )
}

// ============================================================================
// Transport
// ============================================================================

#[test]
fn test_call_timeout_leaves_effect_unknown() {
    let st = new_state();
    st.add_service("mysql").unwrap();
    let conn = Arc::new(
        InProcessConnection::new(Dispatcher::new(
            st.clone(),
            Authorizer::client("user-admin"),
        ))
        .with_call_timeout(Duration::from_millis(20)),
    );
    st.set_before_hooks(vec![Box::new(|| thread::sleep(Duration::from_millis(300)))]);
    let client = service::Client::new(conn);

    let err = client.set_metric_credentials("mysql", b"late").unwrap_err();
    assert!(matches!(err, Error::Transport { ref op, .. } if op == "Service.SetMetricCredentials"));

    // The abandoned call still commits once the hook returns.
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        if st.service("mysql").unwrap().metric_credentials().unwrap() == b"late" {
            break;
        }
        assert!(std::time::Instant::now() < deadline, "abandoned call never committed");
        thread::sleep(Duration::from_millis(10));
    }
}
