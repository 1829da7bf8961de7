use super::{validate_name, Arguments, Association, Destination, DestinationType, Host, Service};
use crate::collection::Collection;
use crate::error::{CollectionError, ValidationError};

/// Working copy of a host. Nothing reaches the host collection or the disk
/// until [`HostEditor::finish`] succeeds and the result is committed.
#[derive(Debug, Clone, Default)]
pub struct HostEditor {
    original_name: Option<String>,
    pub name: String,
    pub description: String,
    destinations: Collection<Destination>,
}

impl HostEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(host: &Host) -> Self {
        let mut destinations = Collection::new();
        destinations.load(host.destinations.clone());
        Self {
            original_name: Some(host.name.clone()),
            name: host.name.clone(),
            description: host.description.clone(),
            destinations,
        }
    }

    /// Name of the host being edited, `None` for a new host.
    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    pub fn destinations(&self) -> impl Iterator<Item = &Destination> {
        self.destinations.iter()
    }

    pub fn add_destination(&mut self, name: &str, value: &str, kind: DestinationType) -> Result<(), ValidationError> {
        let destination = Destination::new(name, value, kind).validated()?;
        self.destinations
            .add(destination)
            .map(|_| ())
            .map_err(|e| duplicate("destination", e))
    }

    /// Change a destination's name, value and type. Its associations move
    /// along with it.
    pub fn edit_destination(
        &mut self,
        current: &str,
        name: &str,
        value: &str,
        kind: DestinationType,
    ) -> Result<(), ValidationError> {
        let row = self
            .destinations
            .lookup(current)
            .ok_or_else(|| ValidationError::UnknownDestination(current.to_string()))?;
        let mut destination = Destination::new(name, value, kind).validated()?;
        destination.associations = self
            .destinations
            .get(row)
            .map(|d| d.associations.clone())
            .unwrap_or_default();
        self.destinations
            .update(row, destination)
            .map_err(|e| duplicate("destination", e))
    }

    pub fn remove_destination(&mut self, name: &str) -> Result<Destination, ValidationError> {
        let row = self
            .destinations
            .lookup(name)
            .ok_or_else(|| ValidationError::UnknownDestination(name.to_string()))?;
        self.destinations
            .remove(row)
            .map_err(|_| ValidationError::UnknownDestination(name.to_string()))
    }

    /// Attach a service to an existing destination. The service must be
    /// registered.
    pub fn add_association(
        &mut self,
        destination: &str,
        service: &str,
        arguments: Arguments,
        services: &Collection<Service>,
    ) -> Result<(), ValidationError> {
        if !services.contains(service) {
            return Err(ValidationError::UnknownService(service.to_string()));
        }
        let (row, mut updated) = self.destination_for_update(destination)?;

        let association = Association::new(service, arguments);
        if updated.associations.contains(&association) {
            return Err(ValidationError::Duplicate {
                kind: "association",
                name: format!("{}/{}", destination, service),
            });
        }
        updated.associations.push(association);
        self.destinations
            .update(row, updated)
            .map_err(|e| duplicate("destination", e))
    }

    /// Detach `service` from a destination, either every association with
    /// it or only the one with exactly `arguments`. Returns how many were
    /// removed.
    pub fn remove_association(
        &mut self,
        destination: &str,
        service: &str,
        arguments: Option<&Arguments>,
    ) -> Result<usize, ValidationError> {
        let (row, mut updated) = self.destination_for_update(destination)?;
        let before = updated.associations.len();
        updated
            .associations
            .retain(|a| !(a.service == service && arguments.map_or(true, |args| &a.arguments == args)));
        let removed = before - updated.associations.len();
        self.destinations
            .update(row, updated)
            .map_err(|e| duplicate("destination", e))?;
        Ok(removed)
    }

    fn destination_for_update(
        &self,
        name: &str,
    ) -> Result<(crate::collection::RowId, Destination), ValidationError> {
        let unknown = || ValidationError::UnknownDestination(name.to_string());
        let row = self.destinations.lookup(name).ok_or_else(unknown)?;
        let destination = self.destinations.get(row).map_err(|_| unknown())?.clone();
        Ok((row, destination))
    }

    /// Validate the draft against the other hosts of its group and build the
    /// resulting host.
    pub fn finish(&self, hosts: &Collection<Host>) -> Result<Host, ValidationError> {
        let name = validate_name("host", &self.name)?;
        let description = self.description.trim().to_string();

        let taken = hosts.lookup(&name);
        let own = self.original_name.as_deref().and_then(|n| hosts.lookup(n));
        if taken.is_some() && taken != own {
            return Err(ValidationError::Duplicate { kind: "host", name });
        }
        if description.is_empty() {
            return Err(ValidationError::MissingValue { kind: "host description" });
        }

        let mut host = Host::new(name, description);
        host.destinations = self.destinations.dump();
        Ok(host)
    }
}

fn duplicate(kind: &'static str, error: CollectionError) -> ValidationError {
    match error {
        CollectionError::Duplicate(name) => ValidationError::Duplicate { kind, name },
        CollectionError::StaleRow(_) => ValidationError::UnknownDestination(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services() -> Collection<Service> {
        let mut services = Collection::new();
        services.add(Service::new("ssh", "Secure shell", "ssh {address}")).unwrap();
        services.add(Service::new("http", "Browser", "xdg-open http://{address}{path}")).unwrap();
        services
    }

    #[test]
    fn builds_a_new_host() {
        let mut editor = HostEditor::new();
        editor.name = " router ".into();
        editor.description = "Home router".into();
        editor.add_destination("lan", "192.168.1.1", DestinationType::Ipv4).unwrap();
        editor
            .add_association("lan", "http", Arguments::from([("path".into(), "/".into())]), &services())
            .unwrap();

        let host = editor.finish(&Collection::new()).unwrap();
        assert_eq!(host.name, "router");
        assert_eq!(host.destination("lan").unwrap().associations.len(), 1);
    }

    #[test]
    fn duplicate_destination_is_rejected() {
        let mut editor = HostEditor::new();
        editor.add_destination("lan", "192.168.1.1", DestinationType::Ipv4).unwrap();
        let err = editor
            .add_destination("lan", "192.168.1.2", DestinationType::Ipv4)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Duplicate {
                kind: "destination",
                name: "lan".into()
            }
        );
    }

    #[test]
    fn association_needs_destination_and_service() {
        let mut editor = HostEditor::new();
        let services = services();
        assert_eq!(
            editor.add_association("lan", "ssh", Arguments::new(), &services),
            Err(ValidationError::UnknownDestination("lan".into()))
        );
        editor.add_destination("lan", "192.168.1.1", DestinationType::Ipv4).unwrap();
        assert_eq!(
            editor.add_association("lan", "telnet", Arguments::new(), &services),
            Err(ValidationError::UnknownService("telnet".into()))
        );
    }

    #[test]
    fn renaming_a_destination_keeps_associations() {
        let mut editor = HostEditor::new();
        editor.add_destination("lan", "192.168.1.1", DestinationType::Ipv4).unwrap();
        editor.add_association("lan", "ssh", Arguments::new(), &services()).unwrap();
        editor
            .edit_destination("lan", "wan", "203.0.113.7", DestinationType::Ipv4)
            .unwrap();

        let names: Vec<_> = editor.destinations().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["wan"]);
        assert_eq!(editor.destinations().next().unwrap().associations.len(), 1);
    }

    #[test]
    fn remove_association_by_service() {
        let mut editor = HostEditor::new();
        let services = services();
        editor.add_destination("lan", "192.168.1.1", DestinationType::Ipv4).unwrap();
        editor.add_association("lan", "ssh", Arguments::new(), &services).unwrap();
        editor
            .add_association("lan", "ssh", Arguments::from([("user".into(), "root".into())]), &services)
            .unwrap();
        assert_eq!(editor.remove_association("lan", "ssh", None).unwrap(), 2);
        assert_eq!(editor.remove_association("lan", "ssh", None).unwrap(), 0);
    }

    #[test]
    fn host_name_must_be_unique_except_for_itself() {
        let mut hosts = Collection::new();
        hosts.add(Host::new("alpha", "first")).unwrap();
        hosts.add(Host::new("beta", "second")).unwrap();

        let mut editor = HostEditor::edit(hosts.get_by_name("alpha").unwrap());
        assert!(editor.finish(&hosts).is_ok());

        editor.name = "beta".into();
        assert_eq!(
            editor.finish(&hosts),
            Err(ValidationError::Duplicate {
                kind: "host",
                name: "beta".into()
            })
        );
    }
}
