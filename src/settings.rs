use crate::error::StoreError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

type Section = BTreeMap<String, String>;

/// An INI document bound to a file on disk.
///
/// Sections and keys are kept sorted so that saving an unchanged document
/// always produces the same bytes.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    path: PathBuf,
    sections: BTreeMap<String, Section>,
}

impl Settings {
    /// Load the document at `path`. A missing file is an empty document.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut settings = Self {
            path,
            sections: BTreeMap::new(),
        };

        if !settings.path.exists() {
            tracing::debug!("Settings file {:?} not found, starting empty", settings.path);
            return Ok(settings);
        }

        let content =
            fs::read_to_string(&settings.path).map_err(|e| StoreError::io(&settings.path, e))?;
        settings.parse(&content)?;
        Ok(settings)
    }

    fn parse(&mut self, content: &str) -> Result<(), StoreError> {
        let mut current: Option<String> = None;

        for (number, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].trim().to_string();
                self.sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let malformed = || StoreError::Parse {
                path: self.path.clone(),
                line: number + 1,
                content: raw.to_string(),
            };

            let section = current.as_ref().ok_or_else(malformed)?;
            // The first '=' or ':' splits key from value, whichever comes first
            let split = line.find(&['=', ':'][..]).ok_or_else(malformed)?;
            let key = line[..split].trim();
            if key.is_empty() {
                return Err(malformed());
            }
            let value = line[split + 1..].trim();

            self.sections
                .entry(section.clone())
                .or_default()
                .insert(key.to_string(), value.to_string());
        }

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize the document to its INI text.
    pub fn to_ini_string(&self) -> String {
        let mut out = String::new();
        for (index, (name, section)) in self.sections.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", name));
            for (key, value) in section {
                out.push_str(&format!("{} = {}\n", key, value));
            }
        }
        out
    }

    /// Write the document back to its file. The write goes through a
    /// temporary file that is renamed over the target.
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        fs::write(&temp, self.to_ini_string()).map_err(|e| StoreError::io(&temp, e))?;
        fs::rename(&temp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        tracing::debug!("Saved settings to {:?}", self.path);
        Ok(())
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Keys of a section, in sorted order. Unknown sections have no keys.
    pub fn options(&self, section: &str) -> Vec<&str> {
        self.sections
            .get(section)
            .map(|s| s.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn items(&self, section: &str) -> impl Iterator<Item = (&str, &str)> {
        self.sections
            .get(section)
            .into_iter()
            .flat_map(|s| s.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn get(&self, section: &str, key: &str, default: &str) -> String {
        self.get_opt(section, key)
            .map(str::to_string)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_opt(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    pub fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match self.get_opt(section, key) {
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!("[{}] {} = {:?} is not an integer", section, key, value);
                default
            }),
            None => default,
        }
    }

    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        match self.get_opt(section, key).map(str::to_lowercase).as_deref() {
            Some("1" | "true" | "yes" | "on") => true,
            Some("0" | "false" | "no" | "off") => false,
            Some(other) => {
                tracing::warn!("[{}] {} = {:?} is not a boolean", section, key, other);
                default
            }
            None => default,
        }
    }

    /// String lists are stored as JSON arrays.
    pub fn get_list(&self, section: &str, key: &str, default: &[&str]) -> Vec<String> {
        self.get_opt(section, key)
            .and_then(|value| serde_json::from_str::<Vec<String>>(value).ok())
            .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect())
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        // Line breaks would corrupt the document
        let value: String = value.into().replace(&['\r', '\n'][..], " ");
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    pub fn set_int(&mut self, section: &str, key: &str, value: i64) {
        self.set(section, key, value.to_string());
    }

    pub fn set_bool(&mut self, section: &str, key: &str, value: bool) {
        self.set(section, key, if value { "true" } else { "false" });
    }

    pub fn set_list<S: AsRef<str>>(&mut self, section: &str, key: &str, values: &[S]) {
        let values: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
        // Serializing a list of strings cannot fail
        let encoded = serde_json::to_string(&values).unwrap_or_else(|_| "[]".to_string());
        self.set(section, key, encoded);
    }

    /// Remove a key. A section left empty disappears with it.
    pub fn unset(&mut self, section: &str, key: &str) -> bool {
        let Some(entries) = self.sections.get_mut(section) else {
            return false;
        };
        let removed = entries.remove(key).is_some();
        if entries.is_empty() {
            self.sections.remove(section);
        }
        removed
    }

    pub fn remove_section(&mut self, section: &str) -> bool {
        self.sections.remove(section).is_some()
    }

    pub fn clear(&mut self) {
        self.sections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty_document() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(dir.path().join("nope.conf")).unwrap();
        assert_eq!(settings.sections().count(), 0);
        assert_eq!(settings.get("a", "b", "fallback"), "fallback");
    }

    #[test]
    fn typed_getters_use_defaults() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::load(dir.path().join("s.conf")).unwrap();
        settings.set("preferences", "poll interval", "not a number");
        settings.set("preferences", "flag", "Yes");

        assert_eq!(settings.get_int("preferences", "poll interval", 1000), 1000);
        assert_eq!(settings.get_int("preferences", "missing", 7), 7);
        assert!(settings.get_bool("preferences", "flag", false));
        assert!(!settings.get_bool("preferences", "missing", false));
        assert_eq!(settings.get_list("preferences", "list", &["x"]), vec!["x"]);
    }

    #[test]
    fn save_and_reload_preserves_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("services.conf");
        let mut settings = Settings::load(&path).unwrap();
        settings.set("ssh", "command", "ssh {address}");
        settings.set_bool("ssh", "terminal", true);
        settings.set_int("other", "count", 3);
        settings.set_list("other", "items", &["a", "b c"]);
        settings.save().unwrap();

        let reloaded = Settings::load(&path).unwrap();
        assert_eq!(reloaded.get("ssh", "command", ""), "ssh {address}");
        assert!(reloaded.get_bool("ssh", "terminal", false));
        assert_eq!(reloaded.get_int("other", "count", 0), 3);
        assert_eq!(reloaded.get_list("other", "items", &[]), vec!["a", "b c"]);
        assert_eq!(reloaded.sections().collect::<Vec<_>>(), vec!["other", "ssh"]);
    }

    #[test]
    fn repeated_save_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.conf");
        let mut settings = Settings::load(&path).unwrap();
        settings.set("b", "z", "1");
        settings.set("a", "y", "{\"k\": \"v\"}");
        settings.save().unwrap();
        let first = fs::read_to_string(&path).unwrap();

        Settings::load(&path).unwrap().save().unwrap();
        let second = fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unset_removes_key_and_empty_section() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::load(dir.path().join("a.conf")).unwrap();
        settings.set("s", "k", "v");
        assert!(settings.unset("s", "k"));
        assert!(!settings.unset("s", "k"));
        assert!(!settings.has_section("s"));
    }

    #[test]
    fn parses_comments_and_colon_separator() {
        let mut settings = Settings::default();
        settings
            .parse("# comment\n; other\n[main]\nkey: value\nother = a:b\n")
            .unwrap();
        assert_eq!(settings.get("main", "key", ""), "value");
        assert_eq!(settings.get("main", "other", ""), "a:b");
    }

    #[test]
    fn key_outside_section_is_an_error() {
        let mut settings = Settings::default();
        let err = settings.parse("key = value\n").unwrap_err();
        assert!(matches!(err, StoreError::Parse { line: 1, .. }));
    }
}
