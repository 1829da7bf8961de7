use super::{validate_name, Arguments, Association, Named};
use crate::error::ValidationError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum DestinationType {
    #[default]
    Ipv4,
    Ipv6,
    Mac,
    Filename,
    Custom,
}

impl DestinationType {
    pub const ALL: [DestinationType; 5] = [
        DestinationType::Ipv4,
        DestinationType::Ipv6,
        DestinationType::Mac,
        DestinationType::Filename,
        DestinationType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationType::Ipv4 => "ipv4",
            DestinationType::Ipv6 => "ipv6",
            DestinationType::Mac => "mac",
            DestinationType::Filename => "filename",
            DestinationType::Custom => "custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DestinationType::Ipv4 => "IPv4 address",
            DestinationType::Ipv6 => "IPv6 address",
            DestinationType::Mac => "MAC address",
            DestinationType::Filename => "File name",
            DestinationType::Custom => "Custom value",
        }
    }

    /// Example value shown when the destination value is still empty.
    pub fn placeholder(&self) -> &'static str {
        match self {
            DestinationType::Ipv4 => "192.168.1.1",
            DestinationType::Ipv6 => "fe80::1",
            DestinationType::Mac => "00:11:22:33:44:55",
            DestinationType::Filename => "/path/to/file",
            DestinationType::Custom => "",
        }
    }
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestinationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DestinationType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownDestinationType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub name: String,
    pub value: String,
    pub kind: DestinationType,
    pub associations: Vec<Association>,
}

impl Destination {
    pub fn new(name: impl Into<String>, value: impl Into<String>, kind: DestinationType) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind,
            associations: Vec::new(),
        }
    }

    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.name = validate_name("destination", &self.name)?;
        self.value = self.value.trim().to_string();
        if self.value.is_empty() {
            return Err(ValidationError::MissingValue { kind: "destination" });
        }
        Ok(self)
    }

    /// The first association with `service` whose arguments contain every
    /// pair of `wanted`, falling back to the first with `service`.
    pub fn find_association_with(&self, service: &str, wanted: &Arguments) -> Option<&Association> {
        let mut candidates = self.associations.iter().filter(|a| a.service == service);
        let first = candidates.clone().next();
        candidates
            .find(|a| wanted.iter().all(|(k, v)| a.arguments.get(k) == Some(v)))
            .or(first)
    }
}

impl Named for Destination {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_names() {
        assert_eq!("IPv6".parse::<DestinationType>().unwrap(), DestinationType::Ipv6);
        assert!("serial".parse::<DestinationType>().is_err());
    }

    #[test]
    fn value_is_required() {
        let err = Destination::new("web", "  ", DestinationType::Ipv4)
            .validated()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingValue { kind: "destination" });
    }
}
