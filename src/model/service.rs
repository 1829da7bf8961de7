use super::{validate_name, Named};
use crate::error::ValidationError;
use crate::template::Template;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub description: String,
    /// Command line with `{field}` placeholders, run through `sh -c`.
    pub command: String,
    /// Run attached to the terminal instead of in the background.
    pub terminal: bool,
    pub icon: String,
}

impl Service {
    pub fn new(name: impl Into<String>, description: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            command: command.into(),
            terminal: false,
            icon: String::new(),
        }
    }

    pub fn with_terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Trim and check the editable fields.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.name = validate_name("service", &self.name)?;
        self.description = self.description.trim().to_string();
        self.command = self.command.trim().to_string();
        if self.command.is_empty() {
            return Err(ValidationError::MissingValue { kind: "command" });
        }
        Ok(self)
    }

    /// Arguments an association must supply, `address` excluded since the
    /// destination always provides it.
    pub fn required_arguments(&self) -> Vec<String> {
        match Template::parse(&self.command) {
            Ok(template) => template
                .fields()
                .into_iter()
                .filter(|field| field != "address")
                .collect(),
            Err(e) => {
                tracing::warn!("Service '{}' has a malformed command: {}", self.name, e);
                Vec::new()
            }
        }
    }
}

impl Named for Service {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_arguments_skip_address() {
        let service = Service::new("ssh", "Secure shell", "ssh -p {port} {user}@{address} -p {port}");
        assert_eq!(service.required_arguments(), vec!["port", "user"]);
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = Service::new("ssh", "", "   ").validated().unwrap_err();
        assert_eq!(err, ValidationError::MissingValue { kind: "command" });
    }
}
