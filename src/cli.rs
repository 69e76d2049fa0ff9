//! Command-line interface definitions for the configuration checker binary.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use miette::{miette, Context, IntoDiagnostic, Result};



/// Command-line arguments.
#[derive(Parser)]
#[command(
    name = "mail2workitem",
    author,
    about = "Loads a mail2workitem configuration and reports what each instance resolves to.",
    version
)]
pub struct CLIArgs {
    /// This is the path to the configuration file to use.
    /// If unspecified, this defaults to `./data/configuration.toml`.
    #[arg(
        short = 'c',
        long = "configuration-file-path",
        help = "Path to the configuration file to use. Defaults to ./data/configuration.toml"
    )]
    pub configuration_file_path: Option<PathBuf>,

    #[arg(
        short = 'i',
        long = "instance",
        help = "Only report on the instance with this name."
    )]
    pub instance: Option<String>,

    #[arg(
        short = 'd',
        long = "date",
        help = "Reference date (YYYY-MM-DD) for date-based overrides. \
                Defaults to the current UTC date and time."
    )]
    pub reference_date: Option<String>,

    #[arg(
        long = "check-files",
        help = "If this flag is present, every configured password, query and template \
                file is read to verify it is accessible. Contents are never printed."
    )]
    pub check_files: bool,

    #[arg(
        long = "log-level",
        help = "Tracing filter directive, e.g. \"debug\" or \"mail2workitem=trace\". \
                Defaults to RUST_LOG, or \"info\" if that is not set."
    )]
    pub log_level: Option<String>,

    #[arg(
        long = "log-file-directory",
        help = "If specified, logs are also written to a daily log file in this directory."
    )]
    pub log_file_directory: Option<PathBuf>,
}


/// Parse a string of the format `2020-06-01` into a [`NaiveDate`].
pub fn parse_str_as_date(value: &str) -> Result<NaiveDate> {
    value
        .trim()
        .parse::<NaiveDate>()
        .into_diagnostic()
        .wrap_err_with(|| {
            miette!(
                "Failed to decode string to date: expected format YYYY-MM-DD, got {}.",
                value
            )
        })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reference_dates() {
        assert_eq!(
            parse_str_as_date(" 2020-06-01 ").unwrap(),
            NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()
        );
        assert!(parse_str_as_date("06/01/2020").is_err());
    }

    #[test]
    fn accepts_all_flags() {
        let args = CLIArgs::try_parse_from([
            "mail2workitem",
            "-c",
            "data/configuration.toml",
            "--instance",
            "Contoso",
            "--date",
            "2020-06-01",
            "--check-files",
        ])
        .unwrap();

        assert_eq!(args.instance.as_deref(), Some("Contoso"));
        assert_eq!(args.reference_date.as_deref(), Some("2020-06-01"));
        assert!(args.check_files);
        assert!(args.log_file_directory.is_none());
    }
}
