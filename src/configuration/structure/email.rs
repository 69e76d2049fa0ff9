use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{base_paths::SectionContext, tfs_server::path_to_string};
use crate::configuration::{
    deferred::DeferredFileText,
    traits::{ResolvableConfigurationWithContext, UnresolvableConfiguration},
    ConfigurationError,
};


/// How the mailbox is watched for incoming messages.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MailboxServiceType {
    /// Messages are taken from a dedicated incoming folder and moved to
    /// the completed or error folder afterwards.
    #[default]
    #[serde(rename = "EWS")]
    Ews,

    /// Messages are picked by the display names of their recipients.
    #[serde(rename = "EWSByRecipients")]
    EwsByRecipients,
}


#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct UnresolvedEmailSettings {
    #[serde(default)]
    service_type: MailboxServiceType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    ews_mailbox_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    ews_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    ews_password_file: Option<String>,

    #[serde(default)]
    send_ack_emails: bool,

    #[serde(default)]
    ack_emails_recipients_all: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    incoming_folder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_folder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_folder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    recipient_display_names: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    append_only_email_title_regex: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    append_only_email_body_regex: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    reply_template: Option<String>,
}


/// Mailbox access and acknowledgement settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailSettings {
    pub service_type: MailboxServiceType,

    pub ews_mailbox_address: Option<String>,

    pub ews_username: Option<String>,

    pub ews_password_file: DeferredFileText,

    pub send_ack_emails: bool,

    /// `true` acknowledges to every original recipient, `false` only to the sender.
    pub ack_emails_recipients_all: bool,

    /// Only meaningful for [`MailboxServiceType::Ews`].
    pub incoming_folder: Option<String>,

    /// Only meaningful for [`MailboxServiceType::Ews`].
    pub completed_folder: Option<String>,

    /// Only meaningful for [`MailboxServiceType::Ews`].
    pub error_folder: Option<String>,

    /// Semicolon-delimited recipient display names.
    /// Only meaningful for [`MailboxServiceType::EwsByRecipients`].
    pub recipient_display_names: Option<String>,

    pub append_only_email_title_regex: Option<String>,

    pub append_only_email_body_regex: Option<String>,

    pub reply_template: DeferredFileText,
}


impl ResolvableConfigurationWithContext for UnresolvedEmailSettings {
    type Resolved = EmailSettings;
    type Context = SectionContext;

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved, ConfigurationError> {
        match self.service_type {
            MailboxServiceType::Ews => {
                if self.recipient_display_names.is_some() {
                    warn!(
                        section = %context.section_name,
                        "recipient_display_names is ignored for the EWS service type."
                    );
                }
            }
            MailboxServiceType::EwsByRecipients => {
                if self.incoming_folder.is_some()
                    || self.completed_folder.is_some()
                    || self.error_folder.is_some()
                {
                    warn!(
                        section = %context.section_name,
                        "Mailbox folders are ignored for the EWSByRecipients service type."
                    );
                }
            }
        }


        let ews_password_file = context.deferred_text("ews_password_file", self.ews_password_file);

        let reply_template = context.deferred_text("reply_template", self.reply_template);


        Ok(EmailSettings {
            service_type: self.service_type,
            ews_mailbox_address: self.ews_mailbox_address,
            ews_username: self.ews_username,
            ews_password_file,
            send_ack_emails: self.send_ack_emails,
            ack_emails_recipients_all: self.ack_emails_recipients_all,
            incoming_folder: self.incoming_folder,
            completed_folder: self.completed_folder,
            error_folder: self.error_folder,
            recipient_display_names: self.recipient_display_names,
            append_only_email_title_regex: self.append_only_email_title_regex,
            append_only_email_body_regex: self.append_only_email_body_regex,
            reply_template,
        })
    }
}

impl UnresolvableConfiguration for EmailSettings {
    type Unresolved = UnresolvedEmailSettings;

    fn unresolve(&self) -> Self::Unresolved {
        UnresolvedEmailSettings {
            service_type: self.service_type,
            ews_mailbox_address: self.ews_mailbox_address.clone(),
            ews_username: self.ews_username.clone(),
            ews_password_file: path_to_string(&self.ews_password_file),
            send_ack_emails: self.send_ack_emails,
            ack_emails_recipients_all: self.ack_emails_recipients_all,
            incoming_folder: self.incoming_folder.clone(),
            completed_folder: self.completed_folder.clone(),
            error_folder: self.error_folder.clone(),
            recipient_display_names: self.recipient_display_names.clone(),
            append_only_email_title_regex: self.append_only_email_title_regex.clone(),
            append_only_email_body_regex: self.append_only_email_body_regex.clone(),
            reply_template: path_to_string(&self.reply_template),
        }
    }
}


impl EmailSettings {
    /// The reply template, read from disk on first access.
    pub fn reply_template(&self) -> Result<&str, ConfigurationError> {
        self.reply_template.resolve()
    }

    pub fn ews_password(&self) -> Result<&str, ConfigurationError> {
        self.ews_password_file.resolve()
    }

    /// `recipient_display_names` split on `;`, trimmed, without empty entries.
    pub fn recipient_display_name_list(&self) -> Vec<&str> {
        self.recipient_display_names
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }
}
