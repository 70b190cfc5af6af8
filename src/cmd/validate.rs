//! `servergate validate` — check a configuration file offline.
//!
//! Runs the same parse and validation steps as `servergate run` and
//! prints either a route summary or the list of problems found.

use std::path::Path;

use serde::Serialize;

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::model::Config;
use crate::config::sources::parse_config_str;
use crate::config::validation;
use crate::error::{GatewayError, ValidationError};

/// Machine-readable result for `--format json`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Report<'a> {
    Valid {
        valid: bool,
        routes: Vec<String>,
        cockpit_upstream: &'a str,
    },
    Invalid {
        valid: bool,
        errors: &'a [ValidationError],
    },
}

pub fn execute(args: &ValidateArgs) -> Result<(), GatewayError> {
    let config = read_config(&args.config)?;
    let shown = args.config.display().to_string();

    match (validation::validate(&config), &args.format) {
        (Ok(()), ValidateFormat::Text) => {
            println!("\u{2713} {}", validation::format_validation_report(&shown, &config));
            Ok(())
        }
        (Ok(()), ValidateFormat::Json) => {
            print_json(&Report::Valid {
                valid: true,
                routes: config.route_paths(),
                cockpit_upstream: config.cockpit.upstream_base(),
            });
            Ok(())
        }
        (Err(errors), format) => {
            match format {
                ValidateFormat::Text => {
                    eprintln!("\u{2717} {shown} has {} errors\n", errors.len());
                    errors.iter().for_each(|e| eprintln!("{e}"));
                }
                ValidateFormat::Json => print_json(&Report::Invalid {
                    valid: false,
                    errors: &errors,
                }),
            }
            Err(GatewayError::ConfigValidation { errors })
        }
    }
}

fn read_config(path: &Path) -> Result<Config, GatewayError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => GatewayError::ConfigFileNotFound {
            path: path.to_path_buf(),
        },
        _ => GatewayError::Io(e),
    })?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    parse_config_str(ext, &content, &path.display().to_string())
}

fn print_json(report: &Report<'_>) {
    match serde_json::to_string(report) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("failed to encode report: {e}"),
    }
}
