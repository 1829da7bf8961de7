use crate::collection::Collection;
use crate::config::ConfigManager;
use crate::error::{CollectionError, StoreError, ValidationError};
use crate::model::{Arguments, Destination, Group, Host, HostEditor, Service};
use crate::store::{Confirm, HostStore, ServiceStore};
use std::collections::BTreeMap;

/// Everything a connection is made of: the service registry, the groups and
/// their hosts. Built once at startup and handed to whoever needs it.
#[derive(Debug)]
pub struct Catalog {
    service_store: ServiceStore,
    host_store: HostStore,
    services: Collection<Service>,
    groups: Collection<Group>,
    hosts: BTreeMap<String, Collection<Host>>,
}

/// A fully resolved launch target.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub host: &'a Host,
    pub destination: &'a Destination,
    pub service: &'a Service,
    /// Arguments stored with the association, if the pair is associated.
    pub arguments: Option<&'a Arguments>,
}

fn duplicate(kind: &'static str) -> impl Fn(CollectionError) -> StoreError {
    move |error| match error {
        CollectionError::Duplicate(name) => ValidationError::Duplicate { kind, name }.into(),
        other => other.into(),
    }
}

impl Catalog {
    pub fn open(config: &ConfigManager) -> Result<Self, StoreError> {
        let mut catalog = Self {
            service_store: ServiceStore::open(config.services_file())?,
            host_store: HostStore::open(config.hosts_dir())?,
            services: Collection::new(),
            groups: Collection::new(),
            hosts: BTreeMap::new(),
        };
        catalog.reload()?;
        Ok(catalog)
    }

    /// Re-read the registry and every host file from disk.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        self.services = self.service_store.load()?;
        self.groups = self.host_store.load_groups()?;
        self.hosts.clear();

        let services = &self.services;
        for group in self.groups.iter() {
            let hosts = self
                .host_store
                .load_hosts(&group.name, |name| services.contains(name))?;
            self.hosts.insert(group.name.clone(), hosts);
        }
        tracing::info!(
            "Loaded {} services, {} groups, {} hosts",
            self.services.len(),
            self.groups.len(),
            self.hosts.values().map(Collection::len).sum::<usize>()
        );
        Ok(())
    }

    pub fn host_store(&self) -> &HostStore {
        &self.host_store
    }

    pub fn services(&self) -> &Collection<Service> {
        &self.services
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get_by_name(name)
    }

    pub fn groups(&self) -> &Collection<Group> {
        &self.groups
    }

    pub fn hosts(&self, group: &str) -> Result<&Collection<Host>, StoreError> {
        self.hosts
            .get(group)
            .ok_or_else(|| StoreError::UnknownGroup(group.to_string()))
    }

    pub fn host(&self, group: &str, name: &str) -> Result<&Host, StoreError> {
        self.hosts(group)?
            .get_by_name(name)
            .ok_or_else(|| StoreError::UnknownHost(name.to_string()))
    }

    pub fn add_service(&mut self, service: Service) -> Result<(), StoreError> {
        let service = service.validated()?;
        let name = service.name.clone();
        self.services.add(service).map_err(duplicate("service"))?;
        self.service_store.save(&self.services)?;
        tracing::info!("Added the service \"{}\"", name);
        Ok(())
    }

    /// Replace a service. A rename is carried into every association that
    /// used the old name.
    pub fn update_service(&mut self, current: &str, service: Service) -> Result<(), StoreError> {
        let service = service.validated()?;
        let row = self
            .services
            .lookup(current)
            .ok_or_else(|| ValidationError::UnknownService(current.to_string()))?;
        let renamed = (current != service.name).then(|| service.name.clone());
        self.services.update(row, service).map_err(duplicate("service"))?;
        self.service_store.save(&self.services)?;

        if let Some(new_name) = renamed {
            self.rename_associations(current, &new_name)?;
            tracing::info!("Renamed the service \"{}\" to \"{}\"", current, new_name);
        }
        Ok(())
    }

    fn rename_associations(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        for (group, hosts) in self.hosts.iter_mut() {
            let rows: Vec<_> = hosts.rows().map(|(row, _)| row).collect();
            for row in rows {
                let mut host = hosts.get(row)?.clone();
                let mut changed = false;
                for association in host
                    .destinations
                    .values_mut()
                    .flat_map(|d| d.associations.iter_mut())
                    .filter(|a| a.service == old)
                {
                    association.service = new.to_string();
                    changed = true;
                }
                if changed {
                    self.host_store.save_host(group, &host, None)?;
                    hosts.update(row, host)?;
                }
            }
        }
        Ok(())
    }

    /// Remove a service. Associations that use it disappear the next time
    /// the hosts are loaded.
    pub fn remove_service(&mut self, name: &str) -> Result<Service, StoreError> {
        let row = self
            .services
            .lookup(name)
            .ok_or_else(|| ValidationError::UnknownService(name.to_string()))?;
        let service = self.services.remove(row)?;
        self.service_store.save(&self.services)?;
        tracing::info!("Removed the service \"{}\"", name);
        Ok(service)
    }

    pub fn add_group(&mut self, group: Group) -> Result<(), StoreError> {
        let group = group.validated()?;
        if self.groups.contains(&group.name) {
            return Err(ValidationError::Duplicate {
                kind: "group",
                name: group.name,
            }
            .into());
        }
        self.host_store.create_group(&group)?;
        self.hosts.insert(group.name.clone(), Collection::new());
        self.groups.add(group).map_err(duplicate("group"))?;
        self.groups.sort_by_name();
        Ok(())
    }

    pub fn set_group_description(&mut self, name: &str, description: &str) -> Result<(), StoreError> {
        let row = self
            .groups
            .lookup(name)
            .ok_or_else(|| StoreError::UnknownGroup(name.to_string()))?;
        let mut group = self.groups.get(row)?.clone();
        group.description = description.trim().to_string();
        self.host_store.save_group_description(&group)?;
        self.groups.update(row, group)?;
        Ok(())
    }

    /// Delete a group with its hosts, asking `confirm` first. Returns `false`
    /// when the user backed out.
    pub fn remove_group(&mut self, name: &str, confirm: &mut dyn Confirm) -> Result<bool, StoreError> {
        let row = self
            .groups
            .lookup(name)
            .ok_or_else(|| StoreError::UnknownGroup(name.to_string()))?;
        if !self.host_store.remove_group(name, confirm)? {
            return Ok(false);
        }
        self.groups.remove(row)?;
        self.hosts.remove(name);
        Ok(true)
    }

    /// Start editing an existing host.
    pub fn edit_host(&self, group: &str, name: &str) -> Result<HostEditor, StoreError> {
        Ok(HostEditor::edit(self.host(group, name)?))
    }

    /// Validate a host draft and store it, file first and collection second.
    pub fn commit_host(&mut self, group: &str, editor: &HostEditor) -> Result<Host, StoreError> {
        let hosts = self
            .hosts
            .get_mut(group)
            .ok_or_else(|| StoreError::UnknownGroup(group.to_string()))?;
        let host = editor.finish(hosts)?;
        let original = editor.original_name();

        self.host_store.save_host(group, &host, original)?;
        match original.and_then(|name| hosts.lookup(name)) {
            Some(row) => hosts.update(row, host.clone()).map_err(duplicate("host"))?,
            None => {
                hosts.add(host.clone()).map_err(duplicate("host"))?;
                hosts.sort_by_name();
            }
        }
        Ok(host)
    }

    pub fn remove_host(&mut self, group: &str, name: &str) -> Result<Host, StoreError> {
        let hosts = self
            .hosts
            .get_mut(group)
            .ok_or_else(|| StoreError::UnknownGroup(group.to_string()))?;
        let row = hosts
            .lookup(name)
            .ok_or_else(|| StoreError::UnknownHost(name.to_string()))?;
        self.host_store.delete_host(group, name)?;
        Ok(hosts.remove(row)?)
    }

    /// Find the pieces needed to launch `service` on a destination. When the
    /// service is associated more than once, the first association whose
    /// stored arguments contain every pair of `wanted` is picked, else the
    /// first one.
    pub fn target(
        &self,
        group: &str,
        host: &str,
        destination: &str,
        service: &str,
        wanted: &Arguments,
    ) -> Result<Target<'_>, StoreError> {
        let host = self.host(group, host)?;
        let destination = host
            .destination(destination)
            .ok_or_else(|| ValidationError::UnknownDestination(destination.to_string()))?;
        let service = self
            .service(service)
            .ok_or_else(|| ValidationError::UnknownService(service.to_string()))?;
        let arguments = destination
            .find_association_with(&service.name, wanted)
            .map(|a| &a.arguments);
        Ok(Target {
            host,
            destination,
            service,
            arguments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DestinationType;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn catalog() -> (TempDir, Catalog) {
        let dir = TempDir::new().unwrap();
        let config = ConfigManager::new(Some(PathBuf::from(dir.path()))).unwrap();
        let mut catalog = Catalog::open(&config).unwrap();
        catalog
            .add_service(Service::new("ssh", "Secure shell", "ssh {address}"))
            .unwrap();
        catalog
            .add_service(Service::new("http", "Web", "xdg-open http://{address}{path}"))
            .unwrap();
        (dir, catalog)
    }

    fn add_web_host(catalog: &mut Catalog, group: &str) {
        let mut editor = HostEditor::new();
        editor.name = "web".into();
        editor.description = "Web server".into();
        editor.add_destination("web", "10.0.0.1", DestinationType::Ipv4).unwrap();
        editor
            .add_association(
                "web",
                "http",
                Arguments::from([("path".to_string(), "/index".to_string())]),
                catalog.services(),
            )
            .unwrap();
        catalog.commit_host(group, &editor).unwrap();
    }

    #[test]
    fn duplicates_are_rejected_everywhere() {
        let (_dir, mut catalog) = catalog();
        let err = catalog
            .add_service(Service::new("ssh", "again", "ssh {address}"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(ValidationError::Duplicate { .. })));
        assert_eq!(catalog.services().len(), 2);

        catalog.add_group(Group::new("lab", "Lab")).unwrap();
        assert!(catalog.add_group(Group::new("lab", "Lab")).is_err());
        assert_eq!(catalog.groups().len(), 2);

        add_web_host(&mut catalog, "lab");
        let mut editor = HostEditor::new();
        editor.name = "web".into();
        editor.description = "Another".into();
        assert!(catalog.commit_host("lab", &editor).is_err());
        assert_eq!(catalog.hosts("lab").unwrap().len(), 1);
    }

    #[test]
    fn target_picks_the_association_matching_the_arguments() {
        let (_dir, mut catalog) = catalog();
        add_web_host(&mut catalog, "");
        let mut editor = catalog.edit_host("", "web").unwrap();
        editor
            .add_association(
                "web",
                "http",
                Arguments::from([("path".to_string(), "/admin".to_string())]),
                catalog.services(),
            )
            .unwrap();
        catalog.commit_host("", &editor).unwrap();

        let first = catalog.target("", "web", "web", "http", &Arguments::new()).unwrap();
        assert_eq!(first.arguments.unwrap()["path"], "/index");

        let wanted = Arguments::from([("path".to_string(), "/admin".to_string())]);
        let second = catalog.target("", "web", "web", "http", &wanted).unwrap();
        assert_eq!(second.arguments.unwrap()["path"], "/admin");

        let unmatched = Arguments::from([("path".to_string(), "/other".to_string())]);
        let fallback = catalog.target("", "web", "web", "http", &unmatched).unwrap();
        assert_eq!(fallback.arguments.unwrap()["path"], "/index");
    }

    #[test]
    fn hash_prefixed_destination_is_refused() {
        let (_dir, mut catalog) = catalog();
        add_web_host(&mut catalog, "");
        let mut editor = catalog.edit_host("", "web").unwrap();
        assert!(editor.add_destination("#lan", "10.0.0.5", DestinationType::Ipv4).is_err());
        editor.add_destination("lan", "10.0.0.5", DestinationType::Ipv4).unwrap();
        catalog.commit_host("", &editor).unwrap();

        catalog.reload().unwrap();
        let host = catalog.host("", "web").unwrap();
        assert_eq!(host.destinations.keys().collect::<Vec<_>>(), vec!["lan", "web"]);
    }

    #[test]
    fn hand_edited_host_is_found_by_its_file_name() {
        let (dir, mut catalog) = catalog();
        let path = dir.path().join("hosts").join("printer.conf");
        std::fs::write(&path, "[host]\nname = Printer\ndescription = Office\n").unwrap();
        catalog.reload().unwrap();
        assert_eq!(catalog.hosts("").unwrap().names(), vec!["printer"]);

        let mut editor = catalog.edit_host("", "printer").unwrap();
        editor.description = "Office printer".into();
        catalog.commit_host("", &editor).unwrap();
        let files: Vec<_> = std::fs::read_dir(dir.path().join("hosts"))
            .unwrap()
            .filter_map(|e| e.unwrap().path().file_name().map(|n| n.to_string_lossy().into_owned()))
            .filter(|n| n.ends_with(".conf"))
            .collect();
        assert_eq!(files, vec!["printer.conf"]);

        catalog.remove_host("", "printer").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn hosts_survive_a_reload() {
        let (_dir, mut catalog) = catalog();
        add_web_host(&mut catalog, "");
        let before = catalog.host("", "web").unwrap().clone();

        catalog.reload().unwrap();
        assert_eq!(catalog.host("", "web").unwrap(), &before);
    }

    #[test]
    fn removed_service_drops_associations_on_reload() {
        let (_dir, mut catalog) = catalog();
        add_web_host(&mut catalog, "");
        catalog.remove_service("http").unwrap();
        catalog.reload().unwrap();

        let host = catalog.host("", "web").unwrap();
        assert!(host.destination("web").unwrap().associations.is_empty());
    }

    #[test]
    fn renamed_service_follows_into_hosts() {
        let (_dir, mut catalog) = catalog();
        add_web_host(&mut catalog, "");
        catalog
            .update_service("http", Service::new("browser", "Web", "xdg-open http://{address}{path}"))
            .unwrap();
        catalog.reload().unwrap();

        let target = catalog
            .target("", "web", "web", "browser", &Arguments::new())
            .unwrap();
        assert_eq!(target.arguments.unwrap()["path"], "/index");
    }

    #[test]
    fn renaming_a_host_moves_its_file() {
        let (_dir, mut catalog) = catalog();
        add_web_host(&mut catalog, "");
        let mut editor = catalog.edit_host("", "web").unwrap();
        editor.name = "frontend".into();
        catalog.commit_host("", &editor).unwrap();

        assert!(!catalog.host_store().host_path("", "web").exists());
        assert_eq!(catalog.hosts("").unwrap().names(), vec!["frontend"]);
    }

    #[test]
    fn declined_group_removal_keeps_everything() {
        let (_dir, mut catalog) = catalog();
        catalog.add_group(Group::new("lab", "Lab")).unwrap();
        add_web_host(&mut catalog, "lab");

        let mut no = |_: &str, _: &str| false;
        assert!(!catalog.remove_group("lab", &mut no).unwrap());
        assert!(catalog.groups().contains("lab"));

        let mut yes = |_: &str, _: &str| true;
        assert!(catalog.remove_group("lab", &mut yes).unwrap());
        assert!(!catalog.groups().contains("lab"));
        assert!(catalog.hosts("lab").is_err());
    }
}
