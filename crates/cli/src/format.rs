//! Output formatting.
//!
//! Three formats:
//! - **Smart** (default): bare scalars, YAML for maps and lists
//! - **JSON** (`--format json`): single-line JSON
//! - **YAML** (`--format yaml`): YAML document

use std::str::FromStr;

use serde::Serialize;

use crate::error::CommandError;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Smart,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Names accepted on the command line.
    pub const NAMES: [&'static str; 3] = ["smart", "json", "yaml"];
}

impl FromStr for OutputFormat {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smart" => Ok(OutputFormat::Smart),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            other => Err(CommandError::usage(format!(
                "unknown format {:?}; expected one of {:?}",
                other,
                OutputFormat::NAMES
            ))),
        }
    }
}

/// Render `value` in `format`, without a trailing newline.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String, CommandError> {
    match format {
        OutputFormat::Json => serde_json::to_string(value).map_err(CommandError::output),
        OutputFormat::Yaml => to_yaml(value),
        OutputFormat::Smart => {
            let json = serde_json::to_value(value).map_err(CommandError::output)?;
            match json {
                serde_json::Value::Null => Ok(String::new()),
                serde_json::Value::String(s) => Ok(s),
                serde_json::Value::Bool(b) => Ok(if b { "True" } else { "False" }.to_string()),
                serde_json::Value::Number(n) => Ok(n.to_string()),
                collection => to_yaml(&collection),
            }
        }
    }
}

fn to_yaml<T: Serialize>(value: &T) -> Result<String, CommandError> {
    let out = serde_yaml::to_string(value).map_err(CommandError::output)?;
    Ok(out.trim_end().to_string())
}
