use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use self::base_paths::BasePaths;
pub use self::date_overrides::{
    effective_value,
    reference_now,
    start_of_day,
    DateBasedFieldOverrides,
    DateBasedOverrideEntry,
};
pub use self::email::{EmailSettings, MailboxServiceType};
pub use self::instance::InstanceConfiguration;
pub use self::tfs_server::TfsServerConfiguration;
use self::instance::UnresolvedInstanceConfiguration;
pub use self::work_items::{
    DefaultFieldValue,
    Mnemonic,
    ProcessingStrategy,
    RecipientOverride,
    WorkItemSettings,
};
use super::traits::{ResolvableConfigurationWithContext, UnresolvableConfiguration};
use super::utilities::get_default_configuration_file_path;
use super::ConfigurationError;

mod base_paths;
mod date_overrides;
mod email;
mod instance;
mod tfs_server;
mod work_items;



#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct UnresolvedConfiguration {
    /// Instances, in document order.
    #[serde(default)]
    instances: Vec<UnresolvedInstanceConfiguration>,
}


/// The entire configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// This is the file path this `Configuration` instance was loaded from,
    /// if it was loaded from a file.
    pub file_path: Option<PathBuf>,

    /// Base paths used for placeholder replacement.
    pub base_paths: BasePaths,

    /// Configured instances, in document order.
    pub instances: Vec<InstanceConfiguration>,
}


impl ResolvableConfigurationWithContext for UnresolvedConfiguration {
    type Resolved = Configuration;
    type Context = (BasePaths, Option<PathBuf>);

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved, ConfigurationError> {
        let (base_paths, file_path) = context;

        // Instance names route incoming mail, so they must be unique
        // once surrounding whitespace is ignored.
        let mut seen_names = HashSet::with_capacity(self.instances.len());
        for instance in &self.instances {
            let name = instance.name.trim();
            if !seen_names.insert(name) {
                return Err(ConfigurationError::validation(format!(
                    "Instance name \"{name}\" is used more than once."
                )));
            }
        }


        let instances = self
            .instances
            .into_iter()
            .enumerate()
            .map(|(index, instance)| instance.resolve((base_paths.clone(), index)))
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        if instances.is_empty() {
            warn!("Configuration does not contain any instances.");
        }


        Ok(Configuration {
            file_path,
            base_paths,
            instances,
        })
    }
}

impl UnresolvableConfiguration for Configuration {
    type Unresolved = UnresolvedConfiguration;

    fn unresolve(&self) -> Self::Unresolved {
        UnresolvedConfiguration {
            instances: self
                .instances
                .iter()
                .map(|instance| instance.unresolve())
                .collect(),
        }
    }
}


impl Configuration {
    /// Load the configuration from a specific file path.
    ///
    /// Only the configuration file itself is read; files referenced by
    /// path fields are read lazily on first access.
    pub fn load_from_path<S: AsRef<Path>>(
        configuration_file_path: S,
    ) -> Result<Self, ConfigurationError> {
        let configuration_file_path = configuration_file_path.as_ref();

        // Read the configuration file into memory.
        let configuration_string =
            fs::read_to_string(configuration_file_path).map_err(|error| ConfigurationError::Io {
                path: configuration_file_path.to_path_buf(),
                source: error,
            })?;


        let configuration_file_path =
            dunce::canonicalize(configuration_file_path).map_err(|error| ConfigurationError::Io {
                path: configuration_file_path.to_path_buf(),
                source: error,
            })?;

        let configuration_directory = configuration_file_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();


        // Parse the string into the `UnresolvedConfiguration` structure and then resolve it.
        let resolved_configuration = Self::parse_and_resolve(
            &configuration_string,
            BasePaths::new(configuration_directory),
            Some(configuration_file_path),
        )?;

        debug!(
            file_path = ?resolved_configuration.file_path,
            instances = resolved_configuration.instances.len(),
            "Configuration loaded."
        );

        Ok(resolved_configuration)
    }

    /// Load the configuration from the default path (`./data/configuration.toml`).
    pub fn load_from_default_path() -> Result<Configuration, ConfigurationError> {
        Configuration::load_from_path(get_default_configuration_file_path()?)
    }

    /// Load the configuration from TOML text. `{CONFIGURATION_DIRECTORY}`
    /// placeholders are replaced with `configuration_directory`.
    pub fn load_from_toml_str<P: Into<PathBuf>>(
        configuration_string: &str,
        configuration_directory: P,
    ) -> Result<Self, ConfigurationError> {
        Self::parse_and_resolve(
            configuration_string,
            BasePaths::new(configuration_directory),
            None,
        )
    }

    fn parse_and_resolve(
        configuration_string: &str,
        base_paths: BasePaths,
        file_path: Option<PathBuf>,
    ) -> Result<Self, ConfigurationError> {
        let unresolved_configuration =
            toml::from_str::<UnresolvedConfiguration>(configuration_string)
                .map_err(|error| ConfigurationError::parse(error.to_string()))?;

        unresolved_configuration.resolve((base_paths, file_path))
    }

    /// Serializes the configuration back into a TOML document.
    pub fn to_toml_string(&self) -> Result<String, ConfigurationError> {
        toml::to_string(&self.unresolve())
            .map_err(|error| ConfigurationError::serialization(error.to_string()))
    }

    /// Looks up an instance by its (case-sensitive) name.
    pub fn instance(&self, name: &str) -> Option<&InstanceConfiguration> {
        self.instances
            .iter()
            .find(|instance| instance.name == name)
    }

    pub fn instance_names(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(|instance| instance.name.as_str())
    }
}
