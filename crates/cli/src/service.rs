//! `add-service`, `add-unit` and `set-metric-credentials`.

use std::io::Write;
use std::path::Path;

use tether_api::service::Client;
use tether_state::State;

use crate::error::CommandError;

/// Create a service.
pub fn add_service(st: &State, name: &str, out: &mut dyn Write) -> Result<(), CommandError> {
    let svc = st.add_service(name)?;
    writeln!(out, "added service {}", svc.name()).map_err(CommandError::output)
}

/// Add the next unit to a service and print its name.
pub fn add_unit(st: &State, service: &str, out: &mut dyn Write) -> Result<(), CommandError> {
    let unit = st.service(service)?.add_unit()?;
    writeln!(out, "added unit {}", unit.name()).map_err(CommandError::output)
}

/// Store the contents of `path` as a service's metric credentials.
pub fn set_metric_credentials(
    client: &Client,
    service: &str,
    path: &Path,
) -> Result<(), CommandError> {
    let creds = std::fs::read(path).map_err(|e| CommandError::read_file(path, e))?;
    client.set_metric_credentials(service, &creds)?;
    tracing::debug!(service, bytes = creds.len(), "metric credentials set");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tether_apiserver::{Authorizer, Dispatcher, InProcessConnection};
    use tether_storage::DocumentStore;
    use uuid::Uuid;

    fn new_state() -> State {
        State::new(DocumentStore::new(), Uuid::new_v4())
    }

    fn client(st: &State) -> Client {
        let conn = InProcessConnection::new(Dispatcher::new(
            st.clone(),
            Authorizer::client("user-admin"),
        ));
        Client::new(Arc::new(conn))
    }

    fn printed(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_add_service_and_units() {
        let st = new_state();
        let mut out = Vec::new();
        add_service(&st, "mysql", &mut out).unwrap();
        add_unit(&st, "mysql", &mut out).unwrap();
        add_unit(&st, "mysql", &mut out).unwrap();
        assert_eq!(
            printed(out),
            "added service mysql\nadded unit mysql/0\nadded unit mysql/1\n"
        );
    }

    #[test]
    fn test_add_service_twice_fails() {
        let st = new_state();
        add_service(&st, "mysql", &mut Vec::new()).unwrap();
        let err = add_service(&st, "mysql", &mut Vec::new()).unwrap_err();
        match err {
            CommandError::State(e) => assert!(e.cause().is_already_exists(), "{e}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_add_unit_unknown_service() {
        let st = new_state();
        let err = add_unit(&st, "wordpress", &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "service \"wordpress\" not found");
    }

    #[test]
    fn test_set_metric_credentials_from_file() {
        let st = new_state();
        st.add_service("mysql").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds");
        std::fs::write(&path, b"\x00secret\xff").unwrap();

        set_metric_credentials(&client(&st), "mysql", &path).unwrap();

        let svc = st.service("mysql").unwrap();
        assert_eq!(svc.metric_credentials().unwrap(), b"\x00secret\xff");
    }

    #[test]
    fn test_set_metric_credentials_unknown_service() {
        let st = new_state();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds");
        std::fs::write(&path, b"secret").unwrap();

        let err = set_metric_credentials(&client(&st), "mysql", &path).unwrap_err();
        match err {
            CommandError::Api(e) => assert!(e.is_not_found(), "{e}"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
