use super::Confirm;
use crate::collection::Collection;
use crate::error::StoreError;
use crate::model::{Group, Host};
use crate::settings::Settings;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const HOST_EXTENSION: &str = "conf";
const GROUP_FILE: &str = ".group";

/// The hosts directory: loose `<host>.conf` files for the default group and
/// one subdirectory per named group.
#[derive(Debug, Clone)]
pub struct HostStore {
    root: PathBuf,
}

impl HostStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn group_dir(&self, group: &str) -> PathBuf {
        if group.is_empty() {
            self.root.clone()
        } else {
            self.root.join(group)
        }
    }

    pub fn host_path(&self, group: &str, host: &str) -> PathBuf {
        self.group_dir(group).join(format!("{}.{}", host, HOST_EXTENSION))
    }

    /// The default group plus every subdirectory of the hosts directory.
    pub fn load_groups(&self) -> Result<Collection<Group>, StoreError> {
        let mut groups = BTreeMap::new();
        groups.insert(String::new(), Group::default_group());

        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                tracing::warn!("Skipping group directory with a non UTF-8 name: {:?}", path);
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let info = Settings::load(path.join(GROUP_FILE))?;
            let description = info.get("group", "description", name);
            groups.insert(name.to_string(), Group::new(name, description));
        }

        let mut collection = Collection::new();
        collection.load(groups);
        Ok(collection)
    }

    pub fn create_group(&self, group: &Group) -> Result<(), StoreError> {
        let dir = self.group_dir(&group.name);
        fs::create_dir(&dir).map_err(|e| StoreError::io(&dir, e))?;
        self.save_group_description(group)?;
        tracing::info!("Added a new group \"{}\"", group.name);
        Ok(())
    }

    pub fn save_group_description(&self, group: &Group) -> Result<(), StoreError> {
        if group.is_default() {
            return Ok(());
        }
        let mut info = Settings::load(self.group_dir(&group.name).join(GROUP_FILE))?;
        info.set("group", "description", group.description.as_str());
        info.save()
    }

    /// Host files of a group directory.
    fn host_files(&self, group: &str) -> Result<Vec<PathBuf>, StoreError> {
        let dir = self.group_dir(group);
        if !dir.exists() {
            return Err(StoreError::UnknownGroup(group.to_string()));
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
            let path = entry.map_err(|e| StoreError::io(&dir, e))?.path();
            let is_host = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(HOST_EXTENSION)
                && !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
            if is_host {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Delete a named group and its hosts. The user confirms the removal and,
    /// when the group still holds hosts, confirms again. Returns `false` when
    /// either question was declined; nothing is touched in that case.
    pub fn remove_group(&self, group: &str, confirm: &mut dyn Confirm) -> Result<bool, StoreError> {
        if group.is_empty() {
            return Err(StoreError::UnknownGroup(group.to_string()));
        }
        let dir = self.group_dir(group);
        if !dir.is_dir() {
            return Err(StoreError::UnknownGroup(group.to_string()));
        }

        if !confirm.confirm("Remove the group", &format!("Remove the group «{}»?", group)) {
            return Ok(false);
        }

        let hosts = self.host_files(group)?;
        if !hosts.is_empty()
            && !confirm.confirm(
                "The group is not empty",
                &format!(
                    "All the {} hosts defined for the group will be lost.\n\
                     Are you sure you want to delete the group «{}»?",
                    hosts.len(),
                    group
                ),
            )
        {
            return Ok(false);
        }

        fs::remove_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tracing::info!("Removed the group \"{}\"", group);
        Ok(true)
    }

    pub fn load_hosts(
        &self,
        group: &str,
        known_service: impl Fn(&str) -> bool,
    ) -> Result<Collection<Host>, StoreError> {
        let mut hosts = BTreeMap::new();
        for path in self.host_files(group)? {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let settings = match Settings::load(&path) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::error!("Skipping unreadable host file: {}", e);
                    continue;
                }
            };
            // The file name is the host name; every later save and delete goes
            // through `host_path`
            let mut host = Host::read_from(&settings, &stem, &known_service);
            if host.name != stem {
                tracing::warn!(
                    "Host file {:?} names the host '{}', using '{}'",
                    path,
                    host.name,
                    stem
                );
                host.name = stem;
            }
            if hosts.contains_key(&host.name) {
                tracing::warn!("Duplicate host '{}' in group '{}', skipping {:?}", host.name, group, path);
                continue;
            }
            hosts.insert(host.name.clone(), host);
        }

        let mut collection = Collection::new();
        collection.load(hosts);
        tracing::debug!("Loaded {} hosts for group '{}'", collection.len(), group);
        Ok(collection)
    }

    /// Write a host file. When the host was renamed, the file under the old
    /// name is removed once the new one is in place.
    pub fn save_host(&self, group: &str, host: &Host, previous_name: Option<&str>) -> Result<(), StoreError> {
        let path = self.host_path(group, &host.name);
        let mut settings = Settings::default();
        host.write_to(&mut settings);
        replace_file(&path, &settings.to_ini_string())?;

        if let Some(previous) = previous_name.filter(|p| *p != host.name) {
            let old = self.host_path(group, previous);
            if old.exists() {
                fs::remove_file(&old).map_err(|e| StoreError::io(&old, e))?;
            }
        }
        tracing::info!("Saved host '{}' to {:?}", host.name, path);
        Ok(())
    }

    pub fn delete_host(&self, group: &str, name: &str) -> Result<(), StoreError> {
        let path = self.host_path(group, name);
        if !path.exists() {
            return Err(StoreError::UnknownHost(name.to_string()));
        }
        fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
        tracing::info!("Removed host '{}' from group '{}'", name, group);
        Ok(())
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Replace `path` with `content`: write a temporary file, move the old file
/// to a backup, move the temporary file into place, drop the backup. A failed
/// step undoes the earlier ones.
pub(crate) fn replace_file(path: &Path, content: &str) -> Result<(), StoreError> {
    let temp = sibling(path, ".tmp");
    let backup = sibling(path, ".bak");
    let failed = |step: &'static str, source: std::io::Error| StoreError::Replace {
        path: path.to_path_buf(),
        step,
        source,
    };

    if let Err(e) = fs::write(&temp, content) {
        let _ = fs::remove_file(&temp);
        return Err(failed("write the temporary file", e));
    }

    let had_old = path.exists();
    if had_old {
        if let Err(e) = fs::rename(path, &backup) {
            let _ = fs::remove_file(&temp);
            return Err(failed("back up the existing file", e));
        }
    }

    if let Err(e) = fs::rename(&temp, path) {
        if had_old {
            if let Err(restore) = fs::rename(&backup, path) {
                tracing::error!("Could not restore {:?} from {:?}: {}", path, backup, restore);
            }
        }
        let _ = fs::remove_file(&temp);
        return Err(failed("move the new file into place", e));
    }

    if had_old {
        if let Err(e) = fs::remove_file(&backup) {
            tracing::warn!("Leaving stale backup {:?}: {}", backup, e);
        }
    }
    Ok(())
}
