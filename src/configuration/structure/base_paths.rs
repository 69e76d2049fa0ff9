use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::configuration::{deferred::DeferredFileText, utilities::replace_placeholders_in_path};


/// Directories that path fields may refer to through placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePaths {
    /// Directory containing the configuration file.
    pub configuration_directory: PathBuf,
}

impl BasePaths {
    pub fn new<P: Into<PathBuf>>(configuration_directory: P) -> Self {
        Self {
            configuration_directory: configuration_directory.into(),
        }
    }

    pub fn placeholders_map(&self) -> HashMap<&'static str, String> {
        let mut placeholders_map = HashMap::with_capacity(1);

        placeholders_map.insert(
            "{CONFIGURATION_DIRECTORY}",
            self.configuration_directory.to_string_lossy().to_string(),
        );

        placeholders_map
    }

    pub fn configuration_directory(&self) -> &Path {
        &self.configuration_directory
    }
}


/// Context handed down while resolving a single section: the base paths
/// plus the dotted name of the section, used to build error messages.
#[derive(Debug, Clone)]
pub(crate) struct SectionContext {
    pub(crate) base_paths: BasePaths,
    pub(crate) section_name: String,
}

impl SectionContext {
    pub(crate) fn new<S: Into<String>>(base_paths: BasePaths, section_name: S) -> Self {
        Self {
            base_paths,
            section_name: section_name.into(),
        }
    }

    /// Fully qualified name of a field inside this section.
    pub(crate) fn field(&self, field_name: &str) -> String {
        format!("{}.{}", self.section_name, field_name)
    }

    pub(crate) fn nested<S: AsRef<str>>(&self, section_name: S) -> Self {
        Self::new(self.base_paths.clone(), self.field(section_name.as_ref()))
    }

    /// Replaces placeholders in a configured path, if any.
    pub(crate) fn resolve_path(&self, path: Option<&str>) -> Option<PathBuf> {
        path.map(|path| replace_placeholders_in_path(path, &self.base_paths.placeholders_map()))
    }

    /// A deferred text field for `field_name` in this section, keeping the
    /// configured path next to the one with placeholders replaced.
    pub(crate) fn deferred_text(
        &self,
        field_name: &str,
        configured_path: Option<String>,
    ) -> DeferredFileText {
        DeferredFileText::new(
            self.field(field_name),
            self.resolve_path(configured_path.as_deref()),
        )
        .with_configured_path(configured_path)
    }
}
