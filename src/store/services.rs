use crate::collection::Collection;
use crate::error::StoreError;
use crate::model::Service;
use crate::settings::Settings;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The service registry file, one section per service.
#[derive(Debug)]
pub struct ServiceStore {
    settings: Settings,
}

impl ServiceStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            settings: Settings::load(path)?,
        })
    }

    /// Re-read the registry file and build the service collection.
    pub fn load(&mut self) -> Result<Collection<Service>, StoreError> {
        self.settings = Settings::load(self.settings.path().to_path_buf())?;
        let mut services = BTreeMap::new();
        for name in self.settings.sections() {
            let service = Service::new(
                name,
                self.settings.get(name, "description", ""),
                self.settings.get(name, "command", ""),
            )
            .with_terminal(self.settings.get_bool(name, "terminal", false))
            .with_icon(self.settings.get(name, "icon", ""));
            services.insert(name.to_string(), service);
        }

        let mut collection = Collection::new();
        collection.load(services);
        tracing::info!("Loaded {} services from {:?}", collection.len(), self.settings.path());
        Ok(collection)
    }

    pub fn save(&mut self, services: &Collection<Service>) -> Result<(), StoreError> {
        self.settings.clear();
        for service in services.iter() {
            self.settings.set(&service.name, "description", service.description.as_str());
            self.settings.set(&service.name, "command", service.command.as_str());
            self.settings.set_bool(&service.name, "terminal", service.terminal);
            if !service.icon.is_empty() {
                self.settings.set(&service.name, "icon", service.icon.as_str());
            }
        }
        self.settings.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn services_survive_a_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("services.conf");

        let mut services = Collection::new();
        services
            .add(Service::new("ssh", "Secure shell", "ssh {address}").with_terminal(true))
            .unwrap();
        services
            .add(Service::new("rdp", "Remote desktop", "xfreerdp /v:{address}").with_icon("/usr/share/icons/rdp.png"))
            .unwrap();

        let mut store = ServiceStore::open(&path).unwrap();
        store.save(&services).unwrap();

        let loaded = ServiceStore::open(&path).unwrap().load().unwrap();
        assert_eq!(loaded.dump(), services.dump());
        assert_eq!(loaded.names(), vec!["rdp", "ssh"]);
    }
}
