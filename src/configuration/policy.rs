//! Deciding the effective value of a work item field for a given message.
//!
//! Several override classes may target the same field. They are consulted in
//! a fixed order and the first one that yields a value wins:
//!
//! 1. a recipient override whose alias matches the sender,
//! 2. a mnemonic whose token occurs in the subject or the body
//!    (first matching mnemonic in declaration order),
//! 3. the date-based override table for the field, as of the reference date,
//! 4. the first default field value for the field.
//!
//! If none of them apply, the field has no value and the caller decides
//! what to do with it. Alias and mnemonic matching ignore ASCII case.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::trace;

use super::WorkItemSettings;


/// The parts of an incoming message the policy looks at.
pub trait MessageView {
    /// Alias of the sender, e.g. `alice` for `alice@contoso.com`.
    fn sender_alias(&self) -> &str;

    fn subject(&self) -> &str;

    fn body(&self) -> &str;
}

/// An owned, minimal [`MessageView`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSummary {
    pub sender_alias: String,
    pub subject: String,
    pub body: String,
}

impl MessageSummary {
    pub fn new<A, S, B>(sender_alias: A, subject: S, body: B) -> Self
    where
        A: Into<String>,
        S: Into<String>,
        B: Into<String>,
    {
        Self {
            sender_alias: sender_alias.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

impl MessageView for MessageSummary {
    fn sender_alias(&self) -> &str {
        &self.sender_alias
    }

    fn subject(&self) -> &str {
        &self.subject
    }

    fn body(&self) -> &str {
        &self.body
    }
}


/// Which override class produced an [`EffectiveValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueSource {
    RecipientOverride,
    Mnemonic,
    DateBasedOverride,
    DefaultFieldValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveValue<'a> {
    pub value: &'a str,
    pub source: ValueSource,
}


/// Message text normalized once for case-insensitive matching.
struct NormalizedMessage<'m> {
    sender_alias: &'m str,
    subject: String,
    body: String,
}

impl<'m> NormalizedMessage<'m> {
    fn new<M: MessageView + ?Sized>(message: &'m M) -> Self {
        Self {
            sender_alias: message.sender_alias().trim(),
            subject: message.subject().to_ascii_lowercase(),
            body: message.body().to_ascii_lowercase(),
        }
    }

    fn contains_token(&self, token: &str) -> bool {
        let token = token.to_ascii_lowercase();
        self.subject.contains(&token) || self.body.contains(&token)
    }
}


/// Composes every override class of one instance's [`WorkItemSettings`].
#[derive(Debug, Clone, Copy)]
pub struct FieldResolutionPolicy<'a> {
    settings: &'a WorkItemSettings,
}

impl<'a> FieldResolutionPolicy<'a> {
    pub fn new(settings: &'a WorkItemSettings) -> Self {
        Self { settings }
    }

    /// The effective value of `field` for `message`, or `None` if nothing applies.
    pub fn effective_value<M>(
        &self,
        field: &str,
        message: &M,
        reference: NaiveDateTime,
    ) -> Option<&'a str>
    where
        M: MessageView + ?Sized,
    {
        self.resolve_field(field, message, reference)
            .map(|effective| effective.value)
    }

    /// Like [`Self::effective_value`], but also reports where the value came from.
    pub fn resolve_field<M>(
        &self,
        field: &str,
        message: &M,
        reference: NaiveDateTime,
    ) -> Option<EffectiveValue<'a>>
    where
        M: MessageView + ?Sized,
    {
        self.resolve_normalized(field, &NormalizedMessage::new(message), reference)
    }

    /// Effective values of every field named by any override class.
    /// Fields for which nothing applies are left out.
    pub fn resolve_all<M>(
        &self,
        message: &M,
        reference: NaiveDateTime,
    ) -> BTreeMap<&'a str, EffectiveValue<'a>>
    where
        M: MessageView + ?Sized,
    {
        let message = NormalizedMessage::new(message);

        self.field_names()
            .into_iter()
            .filter_map(|field| {
                self.resolve_normalized(field, &message, reference)
                    .map(|effective| (field, effective))
            })
            .collect()
    }

    /// Names of all fields targeted by at least one override class, sorted.
    pub fn field_names(&self) -> Vec<&'a str> {
        let settings = self.settings;

        let mut field_names: Vec<&'a str> = settings
            .recipient_overrides
            .iter()
            .map(|recipient_override| recipient_override.field.as_str())
            .chain(
                settings
                    .mnemonics
                    .iter()
                    .map(|mnemonic| mnemonic.field.as_str()),
            )
            .chain(
                settings
                    .date_based_overrides
                    .iter()
                    .map(|overrides| overrides.field_name.as_str()),
            )
            .chain(
                settings
                    .default_field_values
                    .iter()
                    .map(|default| default.field.as_str()),
            )
            .collect();

        field_names.sort_unstable();
        field_names.dedup();
        field_names
    }

    fn resolve_normalized(
        &self,
        field: &str,
        message: &NormalizedMessage<'_>,
        reference: NaiveDateTime,
    ) -> Option<EffectiveValue<'a>> {
        let settings = self.settings;

        let recipient_override = settings.recipient_overrides.iter().find(|recipient_override| {
            recipient_override.field == field
                && recipient_override
                    .alias
                    .trim()
                    .eq_ignore_ascii_case(message.sender_alias)
        });
        if let Some(recipient_override) = recipient_override {
            trace!(field, alias = %recipient_override.alias, "Field set by recipient override.");
            return Some(EffectiveValue {
                value: &recipient_override.value,
                source: ValueSource::RecipientOverride,
            });
        }

        let mnemonic = settings
            .mnemonics
            .iter()
            .find(|mnemonic| mnemonic.field == field && message.contains_token(&mnemonic.mnemonic));
        if let Some(mnemonic) = mnemonic {
            trace!(field, mnemonic = %mnemonic.mnemonic, "Field set by mnemonic.");
            return Some(EffectiveValue {
                value: &mnemonic.value,
                source: ValueSource::Mnemonic,
            });
        }

        if let Some(overrides) = settings.date_based_overrides_for(field) {
            trace!(field, %reference, "Field set by date-based override.");
            return Some(EffectiveValue {
                value: overrides.effective_value(reference),
                source: ValueSource::DateBasedOverride,
            });
        }

        settings.default_value_for(field).map(|value| EffectiveValue {
            value,
            source: ValueSource::DefaultFieldValue,
        })
    }
}


#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::configuration::{
        start_of_day,
        DateBasedFieldOverrides,
        DateBasedOverrideEntry,
        DefaultFieldValue,
        Mnemonic,
        ProcessingStrategy,
        RecipientOverride,
    };

    fn reference() -> NaiveDateTime {
        start_of_day(NaiveDate::from_ymd_opt(2020, 3, 1).unwrap())
    }

    fn settings(with_date_override: bool) -> WorkItemSettings {
        let date_based_overrides = if with_date_override {
            vec![DateBasedFieldOverrides {
                field_name: "F".to_string(),
                default_value: "Z".to_string(),
                entries: vec![DateBasedOverrideEntry {
                    start_date: start_of_day(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
                    value: "D".to_string(),
                }],
            }]
        } else {
            Vec::new()
        };

        WorkItemSettings {
            conversation_index_field_name: None,
            default_field_values: vec![DefaultFieldValue {
                field: "F".to_string(),
                value: "P".to_string(),
            }],
            mnemonics: vec![Mnemonic {
                mnemonic: "#urgent".to_string(),
                field: "F".to_string(),
                value: "M".to_string(),
            }],
            recipient_overrides: vec![RecipientOverride {
                alias: "alice".to_string(),
                field: "F".to_string(),
                value: "R".to_string(),
            }],
            date_based_overrides,
            add_email_header_to_item: false,
            default_assign: None,
            attach_original_message: false,
            processing_strategy: ProcessingStrategy::SimpleBugStrategy,
        }
    }


    #[test]
    fn recipient_override_beats_everything() {
        let settings = settings(true);
        let policy = FieldResolutionPolicy::new(&settings);

        let from_alice = MessageSummary::new("alice", "Crash on save", "Steps attached.");
        assert_eq!(policy.effective_value("F", &from_alice, reference()), Some("R"));

        let from_alice_urgent = MessageSummary::new("alice", "#urgent crash", "");
        assert_eq!(
            policy.resolve_field("F", &from_alice_urgent, reference()),
            Some(EffectiveValue {
                value: "R",
                source: ValueSource::RecipientOverride,
            })
        );
    }

    #[test]
    fn mnemonic_beats_date_override() {
        let settings = settings(true);
        let policy = FieldResolutionPolicy::new(&settings);

        let in_subject = MessageSummary::new("bob", "#urgent crash on save", "");
        assert_eq!(policy.effective_value("F", &in_subject, reference()), Some("M"));

        let in_body = MessageSummary::new("bob", "Crash on save", "This is #URGENT, please.");
        assert_eq!(policy.effective_value("F", &in_body, reference()), Some("M"));
    }

    #[test]
    fn date_override_beats_default() {
        let settings = settings(true);
        let policy = FieldResolutionPolicy::new(&settings);
        let message = MessageSummary::new("bob", "Crash on save", "Nothing special.");

        assert_eq!(
            policy.resolve_field("F", &message, reference()),
            Some(EffectiveValue {
                value: "D",
                source: ValueSource::DateBasedOverride,
            })
        );

        // Before the first entry starts the table's own default applies,
        // not the default field value.
        let before = start_of_day(NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
        assert_eq!(policy.effective_value("F", &message, before), Some("Z"));
    }

    #[test]
    fn default_applies_without_date_override() {
        let settings = settings(false);
        let policy = FieldResolutionPolicy::new(&settings);
        let message = MessageSummary::new("bob", "Crash on save", "Nothing special.");

        assert_eq!(
            policy.resolve_field("F", &message, reference()),
            Some(EffectiveValue {
                value: "P",
                source: ValueSource::DefaultFieldValue,
            })
        );
    }

    #[test]
    fn unknown_field_has_no_value() {
        let settings = settings(true);
        let policy = FieldResolutionPolicy::new(&settings);
        let message = MessageSummary::new("alice", "#urgent", "");

        assert_eq!(policy.effective_value("Severity", &message, reference()), None);
    }

    #[test]
    fn first_matching_mnemonic_wins() {
        let mut settings = settings(false);
        settings.mnemonics = vec![
            Mnemonic {
                mnemonic: "#p1".to_string(),
                field: "F".to_string(),
                value: "first".to_string(),
            },
            Mnemonic {
                mnemonic: "#p2".to_string(),
                field: "F".to_string(),
                value: "second".to_string(),
            },
        ];
        let policy = FieldResolutionPolicy::new(&settings);

        let message = MessageSummary::new("bob", "#p2 and #p1", "");
        assert_eq!(policy.effective_value("F", &message, reference()), Some("first"));

        let only_second = MessageSummary::new("bob", "#p2", "");
        assert_eq!(policy.effective_value("F", &only_second, reference()), Some("second"));
    }

    #[test]
    fn alias_matching_ignores_case() {
        let settings = settings(false);
        let policy = FieldResolutionPolicy::new(&settings);
        let message = MessageSummary::new("Alice", "", "");

        assert_eq!(policy.effective_value("F", &message, reference()), Some("R"));
    }

    #[test]
    fn resolve_all_covers_every_targeted_field() {
        let mut settings = settings(true);
        settings.mnemonics.push(Mnemonic {
            mnemonic: "#ui".to_string(),
            field: "Area Path".to_string(),
            value: "Contoso\\UI".to_string(),
        });
        settings.default_field_values.push(DefaultFieldValue {
            field: "Priority".to_string(),
            value: "2".to_string(),
        });
        let policy = FieldResolutionPolicy::new(&settings);

        let message = MessageSummary::new("bob", "Button misaligned", "");
        let resolved = policy.resolve_all(&message, reference());

        assert_eq!(policy.field_names(), vec!["Area Path", "F", "Priority"]);
        assert_eq!(resolved.keys().copied().collect::<Vec<&str>>(), vec!["F", "Priority"]);
        assert_eq!(resolved["F"].value, "D");
        assert_eq!(resolved["Priority"].source, ValueSource::DefaultFieldValue);
        assert!(!resolved.contains_key("Area Path"));
    }
}
