use serde::{Deserialize, Serialize};

use super::{
    base_paths::{BasePaths, SectionContext},
    email::{EmailSettings, UnresolvedEmailSettings},
    tfs_server::{TfsServerConfiguration, UnresolvedTfsServerConfiguration},
    work_items::{UnresolvedWorkItemSettings, WorkItemSettings},
};
use crate::configuration::{
    policy::FieldResolutionPolicy,
    traits::{ResolvableConfigurationWithContext, UnresolvableConfiguration},
    utilities::require_non_empty,
    ConfigurationError,
};


#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct UnresolvedInstanceConfiguration {
    pub(crate) name: String,

    tfs_server_config: UnresolvedTfsServerConfiguration,

    work_item_settings: UnresolvedWorkItemSettings,

    email_settings: UnresolvedEmailSettings,
}


/// One independently configured pipeline: a server, a work item policy and a mailbox.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceConfiguration {
    /// Unique within a [`Configuration`][super::Configuration].
    pub name: String,

    pub tfs_server: TfsServerConfiguration,

    pub work_items: WorkItemSettings,

    pub email: EmailSettings,
}


impl ResolvableConfigurationWithContext for UnresolvedInstanceConfiguration {
    type Resolved = InstanceConfiguration;
    type Context = (BasePaths, usize);

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved, ConfigurationError> {
        let (base_paths, index) = context;

        let name = require_non_empty(&format!("instances[{index}].name"), Some(self.name))?
            .trim()
            .to_string();
        let context = SectionContext::new(base_paths, format!("instances[{name}]"));


        let tfs_server = self
            .tfs_server_config
            .resolve(context.nested("tfs_server_config"))?;

        let work_items = self
            .work_item_settings
            .resolve(context.nested("work_item_settings"))?;

        let email = self
            .email_settings
            .resolve(context.nested("email_settings"))?;


        Ok(InstanceConfiguration {
            name,
            tfs_server,
            work_items,
            email,
        })
    }
}

impl UnresolvableConfiguration for InstanceConfiguration {
    type Unresolved = UnresolvedInstanceConfiguration;

    fn unresolve(&self) -> Self::Unresolved {
        UnresolvedInstanceConfiguration {
            name: self.name.clone(),
            tfs_server_config: self.tfs_server.unresolve(),
            work_item_settings: self.work_items.unresolve(),
            email_settings: self.email.unresolve(),
        }
    }
}


impl InstanceConfiguration {
    /// Builds the policy that decides effective field values for this instance.
    pub fn field_policy(&self) -> FieldResolutionPolicy<'_> {
        FieldResolutionPolicy::new(&self.work_items)
    }

    /// All file-backed fields of this instance, in document order.
    pub fn deferred_fields(&self) -> [&crate::configuration::DeferredFileText; 4] {
        [
            &self.tfs_server.service_identity_password_file,
            &self.tfs_server.cache_query_file,
            &self.email.ews_password_file,
            &self.email.reply_template,
        ]
    }
}
