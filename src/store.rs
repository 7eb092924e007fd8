//! In-memory building store and its swappable published reference.

use crate::models::Building;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Buildings keyed by name, iterated in insertion order
#[derive(Debug, Clone, Default)]
pub struct BuildingStore {
    buildings: Vec<Building>,
    index: HashMap<String, usize>,
}

impl BuildingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a building, replacing any building of the same name in place.
    ///
    /// Returns the replaced building, if any.
    pub fn insert(&mut self, building: Building) -> Option<Building> {
        match self.index.get(&building.name) {
            Some(&position) => {
                warn!("Building '{}' imported twice, keeping the later file", building.name);
                Some(std::mem::replace(&mut self.buildings[position], building))
            }
            None => {
                self.index.insert(building.name.clone(), self.buildings.len());
                self.buildings.push(building);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Building> {
        self.index.get(name).map(|&position| &self.buildings[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Building> {
        self.buildings.iter_mut()
    }

    pub fn names(&self) -> Vec<String> {
        self.buildings.iter().map(|b| b.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Total table rows across all buildings
    pub fn total_rows(&self) -> usize {
        self.buildings.iter().map(|b| b.table.height()).sum()
    }
}

impl FromIterator<Building> for BuildingStore {
    fn from_iter<I: IntoIterator<Item = Building>>(iter: I) -> Self {
        let mut store = Self::new();
        for building in iter {
            store.insert(building);
        }
        store
    }
}

/// The store currently served to readers.
///
/// Readers take a cheap [`Arc`] snapshot and never observe a partially
/// replaced store.
#[derive(Debug, Default)]
pub struct SharedStore {
    current: RwLock<Arc<BuildingStore>>,
}

impl SharedStore {
    pub fn new(store: BuildingStore) -> Self {
        Self {
            current: RwLock::new(Arc::new(store)),
        }
    }

    pub fn snapshot(&self) -> Arc<BuildingStore> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Publish a new store; returns the previous one
    pub fn replace(&self, store: BuildingStore) -> Arc<BuildingStore> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, Arc::new(store))
    }
}
