use super::ConfigurationError;

/// Represents a configuration that can be validated or resolved,
/// but where that process requires some additional context
/// (base paths, the name of the enclosing section, ...).
pub trait ResolvableConfigurationWithContext {
    type Context;
    type Resolved;

    /// Resolve the configuration into its `Resolved` type.
    /// If the resolution / validation fails, you may return `Err` to indicate
    /// that the configuration is invalid.
    fn resolve(self, context: Self::Context) -> Result<Self::Resolved, ConfigurationError>;
}


/// The inverse of resolution: turns a resolved structure back into
/// its serializable, unresolved form.
pub(crate) trait UnresolvableConfiguration {
    type Unresolved;

    fn unresolve(&self) -> Self::Unresolved;
}
