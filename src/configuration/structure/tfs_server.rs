use serde::{Deserialize, Serialize};

use super::base_paths::SectionContext;
use crate::configuration::{
    deferred::DeferredFileText,
    traits::{ResolvableConfigurationWithContext, UnresolvableConfiguration},
    utilities::require_non_empty,
    ConfigurationError,
};


#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct UnresolvedTfsServerConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_identity_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_identity_password_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    project: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    work_item_template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache_query_file: Option<String>,

    #[serde(default)]
    simulation_mode: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    names_list_field_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    ad_organization: Option<String>,
}


/// Connection to the work item tracking server and the project items go into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TfsServerConfiguration {
    /// Collection URL, e.g. `https://name.visualstudio.com/DefaultCollection/`.
    pub collection_uri: String,

    pub service_identity_username: Option<String>,

    pub service_identity_password_file: DeferredFileText,

    pub project: String,

    /// Type of work item that gets created.
    pub work_item_template: String,

    /// Query used to populate the conversation-to-work-item cache.
    pub cache_query_file: DeferredFileText,

    /// When `true`, callers must not create or save work items.
    pub simulation_mode: bool,

    /// Field whose allowed values list all assignable names (usually "Assigned To").
    pub names_list_field_name: Option<String>,

    pub ad_organization: Option<String>,
}


impl ResolvableConfigurationWithContext for UnresolvedTfsServerConfiguration {
    type Resolved = TfsServerConfiguration;
    type Context = SectionContext;

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved, ConfigurationError> {
        let collection_uri =
            require_non_empty(&context.field("collection_uri"), self.collection_uri)?;
        let project = require_non_empty(&context.field("project"), self.project)?;
        let work_item_template =
            require_non_empty(&context.field("work_item_template"), self.work_item_template)?;


        let service_identity_password_file = context.deferred_text(
            "service_identity_password_file",
            self.service_identity_password_file,
        );

        let cache_query_file = context.deferred_text("cache_query_file", self.cache_query_file);


        Ok(TfsServerConfiguration {
            collection_uri,
            service_identity_username: self.service_identity_username,
            service_identity_password_file,
            project,
            work_item_template,
            cache_query_file,
            simulation_mode: self.simulation_mode,
            names_list_field_name: self.names_list_field_name,
            ad_organization: self.ad_organization,
        })
    }
}

impl UnresolvableConfiguration for TfsServerConfiguration {
    type Unresolved = UnresolvedTfsServerConfiguration;

    fn unresolve(&self) -> Self::Unresolved {
        UnresolvedTfsServerConfiguration {
            collection_uri: Some(self.collection_uri.clone()),
            service_identity_username: self.service_identity_username.clone(),
            service_identity_password_file: path_to_string(&self.service_identity_password_file),
            project: Some(self.project.clone()),
            work_item_template: Some(self.work_item_template.clone()),
            cache_query_file: path_to_string(&self.cache_query_file),
            simulation_mode: self.simulation_mode,
            names_list_field_name: self.names_list_field_name.clone(),
            ad_organization: self.ad_organization.clone(),
        }
    }
}


impl TfsServerConfiguration {
    /// The work item query used to populate the conversation cache,
    /// read from `cache_query_file` on first access.
    pub fn cache_query(&self) -> Result<&str, ConfigurationError> {
        self.cache_query_file.resolve()
    }

    pub fn service_identity_password(&self) -> Result<&str, ConfigurationError> {
        self.service_identity_password_file.resolve()
    }

    /// Whether callers are allowed to create or update work items.
    pub fn allows_writes(&self) -> bool {
        !self.simulation_mode
    }
}


/// The path as it was written in the document, placeholders included.
pub(crate) fn path_to_string(field: &DeferredFileText) -> Option<String> {
    field.configured_path().map(str::to_string)
}
