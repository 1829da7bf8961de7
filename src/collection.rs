use crate::error::CollectionError;
use crate::model::Named;
use std::collections::{BTreeMap, HashMap};

/// Handle to a row of a [`Collection`]. Handles are never reused, so a
/// handle to a removed row stays invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u64);

impl RowId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Entities indexed by name, kept in display order.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    rows: Vec<(RowId, T)>,
    index: HashMap<String, RowId>,
    next_id: u64,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<T: Named + Clone> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn position(&self, row: RowId) -> Result<usize, CollectionError> {
        self.rows
            .iter()
            .position(|(id, _)| *id == row)
            .ok_or(CollectionError::StaleRow(row.0))
    }

    /// Append an entity. Names already present are rejected, never replaced.
    pub fn add(&mut self, entity: T) -> Result<RowId, CollectionError> {
        let name = entity.name().to_string();
        if self.index.contains_key(&name) {
            return Err(CollectionError::Duplicate(name));
        }
        let row = RowId(self.next_id);
        self.next_id += 1;
        self.index.insert(name, row);
        self.rows.push((row, entity));
        Ok(row)
    }

    /// Replace the entity of `row` in place, re-indexing it when the name
    /// changed.
    pub fn update(&mut self, row: RowId, entity: T) -> Result<(), CollectionError> {
        let position = self.position(row)?;
        let old_name = self.rows[position].1.name().to_string();
        let new_name = entity.name().to_string();

        if old_name != new_name {
            if self.index.contains_key(&new_name) {
                return Err(CollectionError::Duplicate(new_name));
            }
            self.index.remove(&old_name);
            self.index.insert(new_name, row);
        }
        self.rows[position].1 = entity;
        Ok(())
    }

    pub fn remove(&mut self, row: RowId) -> Result<T, CollectionError> {
        let position = self.position(row)?;
        let (_, entity) = self.rows.remove(position);
        self.index.remove(entity.name());
        Ok(entity)
    }

    pub fn lookup(&self, name: &str) -> Option<RowId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, row: RowId) -> Result<&T, CollectionError> {
        let position = self.position(row)?;
        Ok(&self.rows[position].1)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.lookup(name).and_then(|row| self.get(row).ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Row handle at a display position.
    pub fn row_at(&self, position: usize) -> Option<RowId> {
        self.rows.get(position).map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter().map(|(_, entity)| entity)
    }

    pub fn rows(&self) -> impl Iterator<Item = (RowId, &T)> {
        self.rows.iter().map(|(id, entity)| (*id, entity))
    }

    pub fn names(&self) -> Vec<String> {
        self.iter().map(|e| e.name().to_string()).collect()
    }

    /// Regenerate the display order from the names.
    pub fn sort_by_name(&mut self) {
        self.rows.sort_by(|(_, a), (_, b)| a.name().cmp(b.name()));
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.index.clear();
    }

    pub fn dump(&self) -> BTreeMap<String, T> {
        self.iter()
            .map(|entity| (entity.name().to_string(), entity.clone()))
            .collect()
    }

    /// Add every entity of `entities` in key order. Entities whose name is
    /// already present are skipped.
    pub fn load(&mut self, entities: BTreeMap<String, T>) {
        for (name, entity) in entities {
            if let Err(e) = self.add(entity) {
                tracing::warn!("Skipping '{}' while loading: {}", name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Group, Service};

    fn services() -> Collection<Service> {
        let mut collection = Collection::new();
        collection.add(Service::new("ssh", "Secure shell", "ssh {address}")).unwrap();
        collection.add(Service::new("vnc", "Remote desktop", "vncviewer {address}")).unwrap();
        collection
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut collection = services();
        let err = collection
            .add(Service::new("ssh", "Other", "ssh -4 {address}"))
            .unwrap_err();
        assert_eq!(err, CollectionError::Duplicate("ssh".into()));
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get_by_name("ssh").unwrap().description, "Secure shell");
    }

    #[test]
    fn rename_keeps_position() {
        let mut collection = services();
        let row = collection.lookup("ssh").unwrap();
        collection
            .update(row, Service::new("ssh2", "Secure shell", "ssh {address}"))
            .unwrap();

        assert_eq!(collection.names(), vec!["ssh2", "vnc"]);
        assert_eq!(collection.lookup("ssh"), None);
        assert_eq!(collection.lookup("ssh2"), Some(row));
    }

    #[test]
    fn rename_onto_existing_name_is_rejected() {
        let mut collection = services();
        let row = collection.lookup("ssh").unwrap();
        let err = collection
            .update(row, Service::new("vnc", "", "x"))
            .unwrap_err();
        assert_eq!(err, CollectionError::Duplicate("vnc".into()));
        assert_eq!(collection.names(), vec!["ssh", "vnc"]);
    }

    #[test]
    fn stale_rows_fail_fast() {
        let mut collection = services();
        let row = collection.lookup("vnc").unwrap();
        collection.remove(row).unwrap();

        assert_eq!(collection.remove(row).unwrap_err(), CollectionError::StaleRow(row.raw()));
        assert!(collection.get(row).is_err());
        assert!(collection
            .update(row, Service::new("vnc", "", "x"))
            .is_err());
        assert!(!collection.contains("vnc"));
    }

    #[test]
    fn load_inserts_in_sorted_order() {
        let mut source = BTreeMap::new();
        for name in ["zeta", "alpha", "mid"] {
            source.insert(name.to_string(), Group::new(name, name));
        }
        let mut collection = Collection::new();
        collection.load(source.clone());

        assert_eq!(collection.names(), vec!["alpha", "mid", "zeta"]);
        assert_eq!(collection.dump(), source);
    }

    #[test]
    fn sort_by_name_regenerates_order() {
        let mut collection = Collection::new();
        collection.add(Group::new("b", "")).unwrap();
        collection.add(Group::new("a", "")).unwrap();
        collection.sort_by_name();
        assert_eq!(collection.names(), vec!["a", "b"]);
        assert_eq!(collection.row_at(0), collection.lookup("a"));
    }
}
