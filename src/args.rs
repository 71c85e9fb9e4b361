//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Command-line argument parsing.
//!

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

mod cmdline {
    pub const ENABLE_LOGGING: &str = "log";
    pub const CONFIG_FILE: &str = "config";
    pub const DURATION: &str = "duration";
}

const DEFAULT_DURATION: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq)]
pub enum ArgsError {
    #[error("unknown command-line option: {0}")]
    UnknownOption(String),

    #[error("unexpected value: {0}")]
    UnexpectedValue(String),

    #[error("option --{0} requires a single value")]
    MissingValue(String),

    #[error("invalid value of --{option}: {value}")]
    InvalidValue{ option: String, value: String }
}

#[derive(Debug, PartialEq)]
pub struct Args {
    pub logging: bool,
    /// If `None`, the default configuration file location is used.
    pub config_file: Option<PathBuf>,
    /// How long to run the simulation.
    pub duration: Duration
}

impl Default for Args {
    fn default() -> Args {
        Args{
            logging: false,
            config_file: None,
            duration: DEFAULT_DURATION
        }
    }
}

pub fn parse_command_line<I: Iterator<Item=String>>(stream: I) -> Result<Args, ArgsError> {
    let allowed_options = [
        cmdline::ENABLE_LOGGING,
        cmdline::CONFIG_FILE,
        cmdline::DURATION
    ];

    // key: option name
    let mut option_values = std::collections::HashMap::<String, Vec<String>>::new();

    let mut current: Option<&mut Vec<String>> = None;

    for arg in stream.skip(1) /*skip the binary name*/ {
        if let Some(option) = arg.strip_prefix("--") {
            if !allowed_options.contains(&option) {
                return Err(ArgsError::UnknownOption(option.to_string()));
            }
            current = Some(option_values.entry(option.to_string()).or_default());
        } else {
            match current.as_mut() {
                Some(values) => values.push(arg),
                None => return Err(ArgsError::UnexpectedValue(arg))
            }
        }
    }

    let single_value = |option: &str| -> Result<Option<String>, ArgsError> {
        match option_values.get(option) {
            None => Ok(None),
            Some(values) if values.len() == 1 => Ok(Some(values[0].clone())),
            Some(_) => Err(ArgsError::MissingValue(option.to_string()))
        }
    };

    let duration = match single_value(cmdline::DURATION)? {
        None => DEFAULT_DURATION,
        Some(value) => match value.parse::<f64>() {
            Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Duration::from_secs_f64(seconds),
            _ => return Err(ArgsError::InvalidValue{ option: cmdline::DURATION.to_string(), value })
        }
    };

    Ok(Args{
        logging: option_values.contains_key(cmdline::ENABLE_LOGGING),
        config_file: single_value(cmdline::CONFIG_FILE)?.map(PathBuf::from),
        duration
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        parse_command_line(std::iter::once("dometrack").chain(args.iter().copied()).map(String::from))
    }

    #[test]
    fn given_no_options_use_defaults() {
        assert_eq!(Ok(Args::default()), parse(&[]));
    }

    #[test]
    fn given_all_options_parse_them() {
        let args = parse(&["--log", "--config", "/tmp/dome.yaml", "--duration", "2.5"]).unwrap();

        assert!(args.logging);
        assert_eq!(Some(PathBuf::from("/tmp/dome.yaml")), args.config_file);
        assert_eq!(Duration::from_millis(2500), args.duration);
    }

    #[test]
    fn given_invalid_input_fail() {
        assert_eq!(Err(ArgsError::UnknownOption("verbose".to_string())), parse(&["--verbose"]));
        assert_eq!(Err(ArgsError::UnexpectedValue("x".to_string())), parse(&["x", "--log"]));
        assert_eq!(Err(ArgsError::MissingValue("config".to_string())), parse(&["--config"]));
        assert!(matches!(parse(&["--duration", "-1"]), Err(ArgsError::InvalidValue{ .. })));
    }
}
