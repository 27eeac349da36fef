//! Preference keys written through the `defaults` command.
use anyhow::Result;

use super::{Applicable, ResourceChange};
use crate::config::DefaultValue;
use crate::exec::Executor;

/// One `domain key = value` preference.
pub struct DefaultsResource<'a> {
    /// Preference domain (`com.apple.dock`, `NSGlobalDomain`).
    pub domain: String,
    /// Key within the domain.
    pub key: String,
    /// Value to write.
    pub value: DefaultValue,
    /// Pass `-f` to `defaults write`.
    pub force: bool,
    executor: &'a dyn Executor,
}

impl std::fmt::Debug for DefaultsResource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultsResource")
            .field("domain", &self.domain)
            .field("key", &self.key)
            .field("value", &self.value)
            .field("force", &self.force)
            .finish_non_exhaustive()
    }
}

impl<'a> DefaultsResource<'a> {
    /// Create a preference resource.
    #[must_use]
    pub const fn new(
        domain: String,
        key: String,
        value: DefaultValue,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            domain,
            key,
            value,
            force: false,
            executor,
        }
    }

    /// Pass `-f` when writing.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

impl Applicable for DefaultsResource<'_> {
    fn description(&self) -> String {
        format!("{} {} = {}", self.domain, self.key, self.value)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let value = self.value.to_string();
        let mut args = vec!["write"];
        if self.force {
            args.push("-f");
        }
        args.extend([
            self.domain.as_str(),
            self.key.as_str(),
            self.value.type_flag(),
            value.as_str(),
        ]);
        self.executor.run("defaults", &args)?;
        Ok(ResourceChange::Applied)
    }

    fn remove(&self) -> Result<ResourceChange> {
        delete(self.executor, &self.domain, Some(&self.key))
    }
}

/// `defaults delete DOMAIN [KEY]`.
///
/// # Errors
///
/// Returns [`CommandFailed`](crate::error::CiderError::CommandFailed) if
/// the key or domain does not exist or cannot be deleted.
pub fn delete(executor: &dyn Executor, domain: &str, key: Option<&str>) -> Result<ResourceChange> {
    let mut args = vec!["delete", domain];
    args.extend(key);
    executor.run("defaults", &args)?;
    Ok(ResourceChange::Applied)
}
