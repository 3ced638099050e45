//! Clap command tree definition.

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, Command};

use crate::format::OutputFormat;

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("tether")
        .about("Cluster control-plane client")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Config file (default: tether.toml)")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log at debug level")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(build_add_service())
        .subcommand(build_add_unit())
        .subcommand(build_do())
        .subcommand(build_set_metric_credentials())
        .subcommand(build_show_actions())
}

fn format_arg() -> Arg {
    Arg::new("format")
        .long("format")
        .help("Output format")
        .value_parser(PossibleValuesParser::new(OutputFormat::NAMES))
        .default_value("smart")
}

fn build_add_service() -> Command {
    Command::new("add-service")
        .about("Create a service")
        .arg(Arg::new("name").required(true).help("Service name"))
}

fn build_add_unit() -> Command {
    Command::new("add-unit")
        .about("Add a unit to a service")
        .arg(Arg::new("service").required(true).help("Service name"))
}

fn build_do() -> Command {
    Command::new("do")
        .about("Queue an action for execution on a unit")
        .long_about(
            "Queue an action for execution on a unit, with parameters read from \
             a YAML file. Prints the id of the queued action.\n\n\
             Example:\n  tether do mysql/3 backup --params parameters.yml",
        )
        // Positional arguments are validated by the command itself.
        .arg(
            Arg::new("args")
                .num_args(0..)
                .value_name("ARG")
                .help("Receiving unit and action name"),
        )
        .arg(
            Arg::new("params")
                .long("params")
                .value_name("FILE")
                .help("Path to a YAML file of action parameters"),
        )
        .arg(format_arg())
}

fn build_set_metric_credentials() -> Command {
    Command::new("set-metric-credentials")
        .about("Set a service's metric credentials from a file")
        .arg(Arg::new("service").required(true).help("Service name"))
        .arg(Arg::new("file").required(true).help("Credentials file"))
}

fn build_show_actions() -> Command {
    Command::new("show-actions")
        .about("List the actions queued for a unit")
        .arg(Arg::new("unit").required(true).help("Unit name"))
        .arg(format_arg())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_do_collects_positionals() {
        let matches = build_cli()
            .try_get_matches_from([
                "tether", "do", "mysql/3", "backup", "--params", "p.yml", "--format", "json",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "do");
        let args: Vec<&String> = sub.get_many::<String>("args").unwrap().collect();
        assert_eq!(args, ["mysql/3", "backup"]);
        assert_eq!(sub.get_one::<String>("params").unwrap(), "p.yml");
        assert_eq!(sub.get_one::<String>("format").unwrap(), "json");
    }

    #[test]
    fn test_do_without_positionals_parses() {
        let matches = build_cli().try_get_matches_from(["tether", "do"]).unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert!(sub.get_many::<String>("args").is_none());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = build_cli().try_get_matches_from([
            "tether", "show-actions", "mysql/0", "--format", "xml",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["tether", "add-service", "mysql", "--verbose"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
    }
}
