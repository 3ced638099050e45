//! Operator workflow through the facade connection

use std::sync::Arc;

use tether::api::params::{Action, Actions, Entities};
use tether::api::{action, service};
use tether::apiserver::{Authorizer, Dispatcher, InProcessConnection};
use tether::storage::DocumentStore;
use tether::types::ActionTag;
use tether::{State, Value};

fn connect(st: &State) -> Arc<InProcessConnection> {
    Arc::new(InProcessConnection::new(Dispatcher::new(
        st.clone(),
        Authorizer::client("user-admin"),
    )))
}

fn params(pairs: &[(&str, Value)]) -> Value {
    Value::Object(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    )
}

#[test]
fn queue_then_list_actions() {
    let st = State::new(DocumentStore::new(), uuid::Uuid::new_v4());
    let unit = st.add_service("mysql").unwrap().add_unit().unwrap();
    let receiver = unit.tag().unwrap().to_string();
    let client = action::Client::new(connect(&st));

    let results = client
        .enqueue(Actions {
            actions: vec![Action {
                receiver: receiver.clone(),
                name: "backup".to_string(),
                parameters: params(&[("size", Value::Int(10)), ("3", Value::from("three"))]),
            }],
        })
        .unwrap();
    let queued = results.one_result().unwrap();
    assert!(queued.error.is_none());
    let tag = ActionTag::parse(&queued.action.unwrap().tag).unwrap();

    let listing = client.actions(Entities::from_tags([receiver.clone()])).unwrap();
    let by_unit = &listing.actions[0];
    assert_eq!(by_unit.receiver, receiver);
    assert_eq!(by_unit.actions.len(), 1);
    let listed = by_unit.actions[0].action.as_ref().unwrap();
    assert_eq!(listed.tag, tag.to_string());
    assert_eq!(listed.name, "backup");
    assert_eq!(by_unit.actions[0].status, "pending");

    let stored = st.action(tag.id()).unwrap();
    assert_eq!(stored.parameters().as_object().unwrap().get("size"), Some(&Value::Int(10)));
}

#[test]
fn metric_credentials_round_trip() {
    let st = State::new(DocumentStore::new(), uuid::Uuid::new_v4());
    st.add_service("mysql").unwrap();
    let client = service::Client::new(connect(&st));

    client.set_metric_credentials("mysql", &[0, 1, 2, 255]).unwrap();
    assert_eq!(
        st.service("mysql").unwrap().metric_credentials().unwrap(),
        vec![0, 1, 2, 255]
    );

    let err = client.set_metric_credentials("wordpress", b"x").unwrap_err();
    assert!(err.is_not_found(), "{err}");
}
