//! Tether CLI
//!
//! Opens the environment described by `tether.toml`, serves facade calls
//! in-process and runs one command against it.
//!
//! ```text
//! tether add-service mysql
//! tether add-unit mysql
//! tether do mysql/0 backup --params params.yml --format json
//! tether show-actions mysql/0
//! ```

mod action;
mod commands;
mod conform;
mod error;
mod format;
mod service;

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::ArgMatches;
use tether_api::{action as action_api, service as service_api};
use tether_apiserver::{Authorizer, Dispatcher, InProcessConnection};
use tether_core::TetherError;
use tether_state::{State, TetherConfig, CONFIG_FILE_NAME};
use tether_storage::DocumentStore;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::action::DoCommand;
use crate::commands::build_cli;
use crate::error::CommandError;
use crate::format::OutputFormat;

/// Identity the in-process server grants to the local operator.
const LOCAL_USER: &str = "user-admin";

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    let exit_code = match run(&matches) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second initialization only fails because a subscriber exists.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

/// An opened environment and where to persist it.
struct Env {
    st: State,
    conn: Arc<InProcessConnection>,
    snapshot: PathBuf,
}

impl Env {
    fn open(config_path: &Path) -> Result<Self, CommandError> {
        let config = load_config(config_path)?;
        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            TetherError::storage(format!(
                "cannot create data directory '{}': {}",
                config.data_dir.display(),
                e
            ))
        })?;

        let snapshot = config.snapshot_path();
        let store = DocumentStore::open_snapshot(&snapshot)?;
        let st = State::open(store, &config)?;
        tracing::debug!(env = %st.env_uuid(), snapshot = %snapshot.display(), "opened environment");

        let dispatcher = Dispatcher::new(st.clone(), Authorizer::client(LOCAL_USER));
        let conn = InProcessConnection::new(dispatcher).with_call_timeout(config.call_timeout());
        Ok(Self {
            st,
            conn: Arc::new(conn),
            snapshot,
        })
    }

    fn save(&self) -> Result<(), CommandError> {
        self.st.store().save_snapshot(&self.snapshot)?;
        Ok(())
    }
}

/// Read the config file, creating it and assigning an environment on first use.
///
/// A relative `data_dir` is resolved against the config file's directory.
fn load_config(path: &Path) -> Result<TetherConfig, CommandError> {
    TetherConfig::write_default_if_missing(path)?;
    let mut config = TetherConfig::from_file(path)?;
    if config.environment.is_none() {
        let env = Uuid::new_v4();
        config.environment = Some(env.to_string());
        config.write_to_file(path)?;
        tracing::info!(environment = %env, config = %path.display(), "created environment");
    }
    if config.data_dir.is_relative() {
        if let Some(parent) = path.parent() {
            config.data_dir = parent.join(&config.data_dir);
        }
    }
    Ok(config)
}

fn format_of(matches: &ArgMatches) -> Result<OutputFormat, CommandError> {
    matches
        .get_one::<String>("format")
        .map_or(Ok(OutputFormat::default()), |s| s.parse())
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str, CommandError> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| CommandError::usage(format!("missing <{}>", id)))
}

fn run(matches: &ArgMatches) -> Result<(), CommandError> {
    let config_path = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| CommandError::usage("no command specified"))?;

    // Validate `do` arguments before touching any state.
    let do_cmd = if name == "do" {
        let args: Vec<String> = sub
            .get_many::<String>("args")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default();
        let params = sub.get_one::<String>("params").map(PathBuf::from);
        Some(DoCommand::init(&args, params, format_of(sub)?)?)
    } else {
        None
    };

    let env = Env::open(&config_path)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match (name, do_cmd) {
        ("do", Some(cmd)) => {
            let client = action_api::Client::new(env.conn.clone());
            let result = cmd.run(&client, &mut out);
            env.save()?;
            result?;
        }
        ("show-actions", _) => {
            let client = action_api::Client::new(env.conn.clone());
            action::show_actions(&client, required(sub, "unit")?, format_of(sub)?, &mut out)?;
        }
        ("add-service", _) => {
            service::add_service(&env.st, required(sub, "name")?, &mut out)?;
            env.save()?;
        }
        ("add-unit", _) => {
            service::add_unit(&env.st, required(sub, "service")?, &mut out)?;
            env.save()?;
        }
        ("set-metric-credentials", _) => {
            let client = service_api::Client::new(env.conn.clone());
            let file = Path::new(required(sub, "file")?);
            service::set_metric_credentials(&client, required(sub, "service")?, file)?;
            env.save()?;
        }
        (other, _) => return Err(CommandError::usage(format!("unknown command {:?}", other))),
    }
    out.flush().map_err(CommandError::output)
}
