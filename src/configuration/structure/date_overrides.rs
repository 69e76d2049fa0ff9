//! Field values that change over time.
//!
//! A [`DateBasedFieldOverrides`] table maps start dates to values; the value
//! in effect at some reference point in time is the one with the latest start
//! date that is not after the reference. Configured dates are naive calendar
//! values and are treated as UTC; see [`reference_now`].

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{
    de::{self, MapAccess, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
};

use super::base_paths::SectionContext;
use crate::configuration::{
    traits::{ResolvableConfigurationWithContext, UnresolvableConfiguration},
    utilities::{format_start_date, parse_start_date, require_non_empty},
    ConfigurationError,
};


#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct UnresolvedDateBasedOverrideEntry {
    #[serde(deserialize_with = "deserialize_start_date")]
    start_date: String,

    value: String,
}

/// Accepts a start date either as a quoted string or as a native TOML
/// date / date-time, keeping its literal text for [`parse_start_date`].
fn deserialize_start_date<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StartDateVisitor;

    impl<'de> Visitor<'de> for StartDateVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a date, a date-time or a string containing one")
        }

        fn visit_str<E>(self, value: &str) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        // Native TOML datetimes arrive as a single-entry map.
        fn visit_map<M>(self, map: M) -> Result<String, M::Error>
        where
            M: MapAccess<'de>,
        {
            let datetime =
                toml::value::Datetime::deserialize(de::value::MapAccessDeserializer::new(map))?;

            Ok(datetime.to_string())
        }
    }

    deserializer.deserialize_any(StartDateVisitor)
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct UnresolvedDateBasedFieldOverrides {
    field_name: String,

    default_value: String,

    #[serde(default)]
    entries: Vec<UnresolvedDateBasedOverrideEntry>,
}


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateBasedOverrideEntry {
    pub start_date: NaiveDateTime,

    pub value: String,
}

/// Per-field table of dated values plus the value used before the first one starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateBasedFieldOverrides {
    pub field_name: String,

    pub default_value: String,

    /// In declaration order; not necessarily sorted by start date.
    pub entries: Vec<DateBasedOverrideEntry>,
}


impl ResolvableConfigurationWithContext for UnresolvedDateBasedFieldOverrides {
    type Resolved = DateBasedFieldOverrides;
    type Context = SectionContext;

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved, ConfigurationError> {
        let field_name = require_non_empty(&context.field("field_name"), Some(self.field_name))?;

        let entries = self
            .entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let start_date = parse_start_date(
                    &context.field(&format!("entries[{index}].start_date")),
                    &entry.start_date,
                )?;

                Ok(DateBasedOverrideEntry {
                    start_date,
                    value: entry.value,
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;


        Ok(DateBasedFieldOverrides {
            field_name,
            default_value: self.default_value,
            entries,
        })
    }
}

impl UnresolvableConfiguration for DateBasedFieldOverrides {
    type Unresolved = UnresolvedDateBasedFieldOverrides;

    fn unresolve(&self) -> Self::Unresolved {
        UnresolvedDateBasedFieldOverrides {
            field_name: self.field_name.clone(),
            default_value: self.default_value.clone(),
            entries: self
                .entries
                .iter()
                .map(|entry| UnresolvedDateBasedOverrideEntry {
                    start_date: format_start_date(&entry.start_date),
                    value: entry.value.clone(),
                })
                .collect(),
        }
    }
}


impl DateBasedFieldOverrides {
    /// The value in effect at `reference`.
    pub fn effective_value(&self, reference: NaiveDateTime) -> &str {
        effective_value(&self.default_value, &self.entries, reference)
    }

    /// The value in effect at the start of `date`.
    pub fn effective_value_on(&self, date: NaiveDate) -> &str {
        self.effective_value(start_of_day(date))
    }
}


/// Picks the entry with the greatest `start_date` that is not after `reference`.
/// When several qualifying entries share that start date, the one declared
/// last wins. Falls back to `default_value` if no entry qualifies.
pub fn effective_value<'a>(
    default_value: &'a str,
    entries: &'a [DateBasedOverrideEntry],
    reference: NaiveDateTime,
) -> &'a str {
    entries
        .iter()
        .filter(|entry| entry.start_date <= reference)
        .fold(None, |best: Option<&DateBasedOverrideEntry>, entry| match best {
            Some(best) if best.start_date > entry.start_date => Some(best),
            _ => Some(entry),
        })
        .map_or(default_value, |entry| entry.value.as_str())
}

/// The current point in time as a naive UTC value, comparable to configured dates.
pub fn reference_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn entry(start_date: NaiveDate, value: &str) -> DateBasedOverrideEntry {
        DateBasedOverrideEntry {
            start_date: start_of_day(start_date),
            value: value.to_string(),
        }
    }

    fn table(default_value: &str, entries: Vec<DateBasedOverrideEntry>) -> DateBasedFieldOverrides {
        DateBasedFieldOverrides {
            field_name: "Iteration Path".to_string(),
            default_value: default_value.to_string(),
            entries,
        }
    }


    #[test]
    fn picks_latest_entry_that_has_started() {
        let overrides = table(
            "Z",
            vec![entry(date(2020, 1, 1), "A"), entry(date(2020, 6, 1), "B")],
        );

        assert_eq!(overrides.effective_value_on(date(2019, 12, 31)), "Z");
        assert_eq!(overrides.effective_value_on(date(2020, 1, 1)), "A");
        assert_eq!(overrides.effective_value_on(date(2020, 5, 31)), "A");
        assert_eq!(overrides.effective_value_on(date(2020, 6, 1)), "B");
        assert_eq!(overrides.effective_value_on(date(2099, 1, 1)), "B");
    }

    #[test]
    fn later_declaration_wins_on_equal_start_dates() {
        let overrides = table(
            "Z",
            vec![entry(date(2020, 1, 1), "A"), entry(date(2020, 1, 1), "B")],
        );

        assert_eq!(overrides.effective_value_on(date(2020, 1, 1)), "B");
    }

    #[test]
    fn empty_entries_fall_back_to_default() {
        let overrides = table("Z", Vec::new());

        assert_eq!(overrides.effective_value_on(date(1970, 1, 1)), "Z");
        assert_eq!(overrides.effective_value_on(date(2020, 6, 1)), "Z");
        assert_eq!(overrides.effective_value(reference_now()), "Z");
    }

    #[test]
    fn entries_do_not_need_to_be_sorted() {
        let overrides = table(
            "Z",
            vec![
                entry(date(2021, 1, 1), "C"),
                entry(date(2020, 1, 1), "A"),
                entry(date(2020, 6, 1), "B"),
            ],
        );

        assert_eq!(overrides.effective_value_on(date(2020, 3, 1)), "A");
        assert_eq!(overrides.effective_value_on(date(2020, 7, 1)), "B");
        assert_eq!(overrides.effective_value_on(date(2021, 7, 1)), "C");
    }

    #[test]
    fn tie_break_ignores_earlier_unrelated_entries() {
        let overrides = table(
            "Z",
            vec![
                entry(date(2020, 1, 1), "A"),
                entry(date(2020, 3, 1), "B"),
                entry(date(2019, 1, 1), "old"),
                entry(date(2020, 3, 1), "B amended"),
            ],
        );

        assert_eq!(overrides.effective_value_on(date(2020, 4, 1)), "B amended");
    }

    #[test]
    fn time_of_day_is_respected() {
        let nine_am = date(2020, 6, 1).and_hms_opt(9, 0, 0).unwrap();
        let overrides = table(
            "Z",
            vec![DateBasedOverrideEntry {
                start_date: nine_am,
                value: "B".to_string(),
            }],
        );

        assert_eq!(overrides.effective_value_on(date(2020, 6, 1)), "Z");
        assert_eq!(
            overrides.effective_value(date(2020, 6, 1).and_hms_opt(8, 59, 59).unwrap()),
            "Z"
        );
        assert_eq!(overrides.effective_value(nine_am), "B");
    }

    #[test]
    fn resolve_rejects_bad_dates() {
        let unresolved = UnresolvedDateBasedFieldOverrides {
            field_name: "Iteration Path".to_string(),
            default_value: "Z".to_string(),
            entries: vec![UnresolvedDateBasedOverrideEntry {
                start_date: "2020-13-01".to_string(),
                value: "A".to_string(),
            }],
        };

        let context = SectionContext::new(
            super::super::BasePaths::new("."),
            "instances[Contoso].work_item_settings.date_based_overrides[0]",
        );

        match unresolved.resolve(context) {
            Err(ConfigurationError::Parse { message }) => {
                assert!(message.contains("date_based_overrides[0].entries[0].start_date"));
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn native_toml_dates_are_accepted() {
        let unresolved: UnresolvedDateBasedFieldOverrides = toml::from_str(
            r#"
                field_name = "Iteration Path"
                default_value = "Z"
                entries = [
                    { start_date = 2020-01-01, value = "A" },
                    { start_date = 2020-06-01T09:00:00, value = "B" },
                    { start_date = "2020-09-01", value = "C" },
                ]
            "#,
        )
        .unwrap();

        let overrides = unresolved
            .resolve(SectionContext::new(
                super::super::BasePaths::new("."),
                "date_based_overrides[0]",
            ))
            .unwrap();

        assert_eq!(overrides.entries[0].start_date, start_of_day(date(2020, 1, 1)));
        assert_eq!(
            overrides.entries[1].start_date,
            date(2020, 6, 1).and_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(overrides.effective_value_on(date(2020, 6, 1)), "A");
        assert_eq!(overrides.effective_value_on(date(2020, 6, 2)), "B");
        assert_eq!(overrides.effective_value_on(date(2020, 9, 1)), "C");
    }

    #[test]
    fn native_toml_time_without_date_is_rejected() {
        let unresolved: UnresolvedDateBasedFieldOverrides = toml::from_str(
            r#"
                field_name = "Iteration Path"
                default_value = "Z"
                entries = [{ start_date = 09:00:00, value = "A" }]
            "#,
        )
        .unwrap();

        let context = SectionContext::new(super::super::BasePaths::new("."), "overrides");

        assert!(matches!(
            unresolved.resolve(context),
            Err(ConfigurationError::Parse { .. })
        ));
    }
}
