use serde::{Deserialize, Serialize};

use super::{
    base_paths::SectionContext,
    date_overrides::{DateBasedFieldOverrides, UnresolvedDateBasedFieldOverrides},
};
use crate::configuration::{
    traits::{ResolvableConfigurationWithContext, UnresolvableConfiguration},
    ConfigurationError,
};


/// How incoming messages are turned into work item changes.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProcessingStrategy {
    /// Every new conversation creates a bug, replies append to it.
    #[default]
    SimpleBugStrategy,

    /// Replies may also update metadata of the existing item.
    UpdateItemMetadataStrategy,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DefaultFieldValue {
    pub field: String,
    pub value: String,
}

/// A token which, when found in a message, sets `field` to `value`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Mnemonic {
    pub mnemonic: String,
    pub field: String,
    pub value: String,
}

/// Sets `field` to `value` for messages sent by `alias`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RecipientOverride {
    pub alias: String,
    pub field: String,
    pub value: String,
}


#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct UnresolvedWorkItemSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conversation_index_field_name: Option<String>,

    #[serde(default)]
    add_email_header_to_item: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_assign: Option<String>,

    #[serde(default)]
    attach_original_message: bool,

    #[serde(default)]
    processing_strategy: ProcessingStrategy,

    #[serde(default)]
    default_field_values: Vec<DefaultFieldValue>,

    #[serde(default)]
    mnemonics: Vec<Mnemonic>,

    #[serde(default)]
    recipient_overrides: Vec<RecipientOverride>,

    #[serde(default)]
    date_based_overrides: Vec<UnresolvedDateBasedFieldOverrides>,
}


/// Everything that decides which values end up in a work item's fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItemSettings {
    /// Field storing the conversation index that links replies to an item.
    pub conversation_index_field_name: Option<String>,

    /// First entry wins if a field is listed more than once.
    pub default_field_values: Vec<DefaultFieldValue>,

    pub mnemonics: Vec<Mnemonic>,

    pub recipient_overrides: Vec<RecipientOverride>,

    pub date_based_overrides: Vec<DateBasedFieldOverrides>,

    pub add_email_header_to_item: bool,

    pub default_assign: Option<String>,

    pub attach_original_message: bool,

    pub processing_strategy: ProcessingStrategy,
}


impl ResolvableConfigurationWithContext for UnresolvedWorkItemSettings {
    type Resolved = WorkItemSettings;
    type Context = SectionContext;

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved, ConfigurationError> {
        if let Some(index) = self
            .mnemonics
            .iter()
            .position(|mnemonic| mnemonic.mnemonic.trim().is_empty())
        {
            return Err(ConfigurationError::validation(format!(
                "Field {} must not be empty.",
                context.field(&format!("mnemonics[{index}].mnemonic"))
            )));
        }


        let date_based_overrides = self
            .date_based_overrides
            .into_iter()
            .enumerate()
            .map(|(index, overrides)| {
                overrides.resolve(context.nested(format!("date_based_overrides[{index}]")))
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;


        Ok(WorkItemSettings {
            conversation_index_field_name: self.conversation_index_field_name,
            default_field_values: self.default_field_values,
            mnemonics: self.mnemonics,
            recipient_overrides: self.recipient_overrides,
            date_based_overrides,
            add_email_header_to_item: self.add_email_header_to_item,
            default_assign: self.default_assign,
            attach_original_message: self.attach_original_message,
            processing_strategy: self.processing_strategy,
        })
    }
}

impl UnresolvableConfiguration for WorkItemSettings {
    type Unresolved = UnresolvedWorkItemSettings;

    fn unresolve(&self) -> Self::Unresolved {
        UnresolvedWorkItemSettings {
            conversation_index_field_name: self.conversation_index_field_name.clone(),
            add_email_header_to_item: self.add_email_header_to_item,
            default_assign: self.default_assign.clone(),
            attach_original_message: self.attach_original_message,
            processing_strategy: self.processing_strategy,
            default_field_values: self.default_field_values.clone(),
            mnemonics: self.mnemonics.clone(),
            recipient_overrides: self.recipient_overrides.clone(),
            date_based_overrides: self
                .date_based_overrides
                .iter()
                .map(|overrides| overrides.unresolve())
                .collect(),
        }
    }
}


impl WorkItemSettings {
    /// The first configured default for `field`.
    pub fn default_value_for(&self, field: &str) -> Option<&str> {
        self.default_field_values
            .iter()
            .find(|default| default.field == field)
            .map(|default| default.value.as_str())
    }

    /// The date-based override table for `field`, if one is configured.
    pub fn date_based_overrides_for(&self, field: &str) -> Option<&DateBasedFieldOverrides> {
        self.date_based_overrides
            .iter()
            .find(|overrides| overrides.field_name == field)
    }
}
