use super::{validate_name, Named};
use crate::error::ValidationError;

/// A folder of hosts. The empty name is the default group, whose hosts live
/// directly in the hosts directory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Group {
    pub name: String,
    pub description: String,
}

impl Group {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn default_group() -> Self {
        Self::new("", "Default group")
    }

    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }

    /// Name shown in lists; the default group has no name of its own.
    pub fn display_name(&self) -> &str {
        if self.is_default() {
            "(default)"
        } else {
            &self.name
        }
    }

    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.name = validate_name("group", &self.name)?;
        self.description = self.description.trim().to_string();
        if self.description.is_empty() {
            self.description = self.name.clone();
        }
        Ok(self)
    }
}

impl Named for Group {
    fn name(&self) -> &str {
        &self.name
    }
}
