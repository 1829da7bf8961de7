mod association;
mod destination;
mod group;
mod host;
mod host_editor;
mod process;
mod service;

pub use association::{decode_associations, encode_arguments, encode_associations, Association, Arguments};
pub use destination::{Destination, DestinationType};
pub use group::Group;
pub use host::Host;
pub use host_editor::HostEditor;
pub use process::{ProcessId, ProcessRecord, StatusIcon, TIMESTAMP_FORMAT};
pub use service::Service;

use crate::error::ValidationError;

/// Characters that would break a file name or a config-file token.
pub const INVALID_NAME_CHARS: &[char] = &['/', '\\', '\'', '"', '=', ':', ';', '[', ']'];

/// Anything stored in a [`crate::collection::Collection`].
pub trait Named {
    fn name(&self) -> &str;
}

/// Check a user-supplied name and return it trimmed.
pub fn validate_name(kind: &'static str, name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Empty { kind });
    }
    // A leading '#' would turn the INI key into a comment
    if name.contains(INVALID_NAME_CHARS) || name.starts_with(&['.', '#'][..]) {
        return Err(ValidationError::InvalidCharacters {
            kind,
            name: name.to_string(),
        });
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_names() {
        assert_eq!(
            validate_name("host", "   "),
            Err(ValidationError::Empty { kind: "host" })
        );
    }

    #[test]
    fn rejects_path_and_quote_characters() {
        for bad in ["a/b", "it's", "back\\slash", "k=v", "svc:x", ".hidden", "#lan"] {
            assert!(
                matches!(
                    validate_name("host", bad),
                    Err(ValidationError::InvalidCharacters { .. })
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn trims_accepted_names() {
        assert_eq!(validate_name("group", "  lab 1 ").unwrap(), "lab 1");
        assert_eq!(validate_name("destination", "lan#2").unwrap(), "lan#2");
    }
}
