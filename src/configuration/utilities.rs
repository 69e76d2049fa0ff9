use std::{collections::HashMap, env::current_dir, path::PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

use super::ConfigurationError;


/// Returns the default configuration filepath, which is at
/// `{current directory}/data/configuration.toml`.
pub fn get_default_configuration_file_path() -> Result<PathBuf, ConfigurationError> {
    let mut configuration_filepath =
        current_dir().map_err(|error| ConfigurationError::Io {
            path: PathBuf::from("."),
            source: error,
        })?;
    configuration_filepath.push("data/configuration.toml");

    if !configuration_filepath.exists() {
        return Err(ConfigurationError::Io {
            path: configuration_filepath,
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not find configuration.toml in data directory",
            ),
        });
    }

    Ok(configuration_filepath)
}

#[must_use = "function returns the modified path"]
pub fn replace_placeholders_in_path<S>(
    original_path: S,
    placeholders: &HashMap<&'static str, String>,
) -> PathBuf
where
    S: Into<String>,
{
    let mut path_string: String = original_path.into();

    for (key, value) in placeholders.iter() {
        path_string = path_string.replace(key, value);
    }

    PathBuf::from(path_string)
}


/// Ensures a required text field is present and not blank.
pub(crate) fn require_non_empty(
    field_name: &str,
    value: Option<String>,
) -> Result<String, ConfigurationError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigurationError::validation(format!(
            "Required field {field_name} is missing or empty."
        ))),
    }
}


/// Parses a start date literal: either `YYYY-MM-DD` (meaning midnight)
/// or `YYYY-MM-DDTHH:MM:SS` with optional fractional seconds.
/// A literal with a UTC offset is converted to UTC.
pub(crate) fn parse_start_date(
    field_name: &str,
    value: &str,
) -> Result<NaiveDateTime, ConfigurationError> {
    let value = value.trim();

    if let Ok(date) = value.parse::<NaiveDate>() {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }

    value
        .parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|datetime| datetime.naive_utc()))
        .map_err(|error| {
            ConfigurationError::parse(format!(
                "Field {field_name} contains an invalid date \"{value}\": {error}."
            ))
        })
}

/// Inverse of [`parse_start_date`]: dates at midnight are written without a time.
pub(crate) fn format_start_date(value: &NaiveDateTime) -> String {
    if value.time().num_seconds_from_midnight() == 0 && value.time().nanosecond() == 0 {
        value.date().format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_only_literal_means_midnight() {
        let parsed = parse_start_date("start_date", "2020-06-01").unwrap();

        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2020, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(format_start_date(&parsed), "2020-06-01");
    }

    #[test]
    fn date_time_literal_keeps_time_of_day() {
        let parsed = parse_start_date("start_date", "2020-06-01T09:30:00").unwrap();

        assert_eq!(parsed.time().hour(), 9);
        assert_eq!(parsed.time().minute(), 30);
        assert_eq!(format_start_date(&parsed), "2020-06-01T09:30:00");

        let with_space = parse_start_date("start_date", "2020-06-01 09:30:00").unwrap();
        assert_eq!(parsed, with_space);
    }

    #[test]
    fn offset_literal_is_converted_to_utc() {
        let parsed = parse_start_date("start_date", "2020-06-01T11:30:00+02:00").unwrap();

        assert_eq!(
            parsed,
            parse_start_date("start_date", "2020-06-01T09:30:00").unwrap()
        );
    }

    #[test]
    fn invalid_date_is_a_parse_error_naming_the_field() {
        let error = parse_start_date("entries[0].start_date", "June 1st").unwrap_err();

        match error {
            ConfigurationError::Parse { message } => {
                assert!(message.contains("entries[0].start_date"));
                assert!(message.contains("June 1st"));
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn placeholders_are_replaced() {
        let mut placeholders = HashMap::new();
        placeholders.insert("{CONFIGURATION_DIRECTORY}", "/etc/m2w".to_string());

        let path =
            replace_placeholders_in_path("{CONFIGURATION_DIRECTORY}/reply.html", &placeholders);

        assert_eq!(path, PathBuf::from("/etc/m2w/reply.html"));
    }

    #[test]
    fn blank_required_field_is_rejected() {
        assert!(require_non_empty("project", Some("  ".to_string())).is_err());
        assert!(require_non_empty("project", None).is_err());
        assert_eq!(
            require_non_empty("project", Some("Contoso".to_string())).unwrap(),
            "Contoso"
        );
    }
}
