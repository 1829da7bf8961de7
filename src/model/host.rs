use super::{decode_associations, encode_associations, Association, Destination, DestinationType, Named};
use crate::settings::Settings;
use std::collections::BTreeMap;

const SECTION_HOST: &str = "host";
const SECTION_DESTINATIONS: &str = "destinations";
const SECTION_TYPES: &str = "destination types";
const SECTION_ASSOCIATIONS: &str = "associations";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Host {
    pub name: String,
    pub description: String,
    pub destinations: BTreeMap<String, Destination>,
}

impl Host {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            destinations: BTreeMap::new(),
        }
    }

    pub fn destination(&self, name: &str) -> Option<&Destination> {
        self.destinations.get(name)
    }

    /// Every (destination, association) pair, destinations in name order.
    pub fn associations(&self) -> impl Iterator<Item = (&Destination, &Association)> {
        self.destinations
            .values()
            .flat_map(|d| d.associations.iter().map(move |a| (d, a)))
    }

    /// Write the host into an empty settings document.
    pub fn write_to(&self, settings: &mut Settings) {
        settings.clear();
        settings.set(SECTION_HOST, "name", self.name.as_str());
        settings.set(SECTION_HOST, "description", self.description.as_str());
        for destination in self.destinations.values() {
            settings.set(SECTION_DESTINATIONS, &destination.name, destination.value.as_str());
            settings.set(SECTION_TYPES, &destination.name, destination.kind.as_str());
            if !destination.associations.is_empty() {
                settings.set(
                    SECTION_ASSOCIATIONS,
                    &destination.name,
                    encode_associations(&destination.associations),
                );
            }
        }
    }

    /// Rebuild a host from its settings document. `file_stem` names the host
    /// when the document carries no name. Associations whose service is
    /// unknown are dropped with a warning.
    pub fn read_from(settings: &Settings, file_stem: &str, known_service: impl Fn(&str) -> bool) -> Self {
        let name = settings.get(SECTION_HOST, "name", file_stem);
        let mut host = Host::new(name, settings.get(SECTION_HOST, "description", ""));

        for (destination_name, value) in settings.items(SECTION_DESTINATIONS) {
            let kind = match settings.get_opt(SECTION_TYPES, destination_name) {
                Some(kind) => kind.parse().unwrap_or_else(|e| {
                    tracing::warn!("Host '{}', destination '{}': {}", host.name, destination_name, e);
                    DestinationType::default()
                }),
                None => DestinationType::default(),
            };
            host.destinations.insert(
                destination_name.to_string(),
                Destination::new(destination_name, value, kind),
            );
        }

        for (destination_name, encoded) in settings.items(SECTION_ASSOCIATIONS) {
            let Some(destination) = host.destinations.get_mut(destination_name) else {
                tracing::warn!(
                    "Host '{}' has associations for the unknown destination '{}'",
                    host.name,
                    destination_name
                );
                continue;
            };

            let associations = match decode_associations(encoded) {
                Ok(associations) => associations,
                Err(e) => {
                    tracing::warn!("Host '{}', destination '{}': {}", host.name, destination_name, e);
                    continue;
                }
            };

            for association in associations {
                if !known_service(&association.service) {
                    tracing::warn!(
                        "Host '{}', destination '{}': dropping association with the missing service '{}'",
                        host.name,
                        destination_name,
                        association.service
                    );
                    continue;
                }
                destination.associations.push(association);
            }
        }

        host
    }
}

impl Named for Host {
    fn name(&self) -> &str {
        &self.name
    }
}
