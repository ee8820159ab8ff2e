//! Saved delivery addresses, persisted under [`SAVED_ADDRESSES_KEY`].
//!
//! At most one address is the default. The first address saved becomes the
//! default, and removing the default promotes the oldest remaining one.

use medrush_core::ResolvedAddress;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::KeyValueStore;

pub const SAVED_ADDRESSES_KEY: &str = "saved_addresses";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAddress {
    pub id: Uuid,
    /// "Home", "Office", ...
    pub label: String,
    pub address: ResolvedAddress,
    #[serde(default)]
    pub is_default: bool,
}

pub struct AddressBook<S> {
    store: S,
}

impl<S: KeyValueStore> AddressBook<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the stored list cannot be read or decoded.
    pub fn list(&self) -> Result<Vec<SavedAddress>, StoreError> {
        Ok(self.store.get(SAVED_ADDRESSES_KEY)?.unwrap_or_default())
    }

    /// Saves `address` under `label` and returns the stored entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the list cannot be read or written.
    pub fn save(
        &self,
        label: &str,
        address: ResolvedAddress,
        make_default: bool,
    ) -> Result<SavedAddress, StoreError> {
        let mut entries = self.list()?;
        let is_default = make_default || entries.is_empty();
        if is_default {
            for entry in &mut entries {
                entry.is_default = false;
            }
        }
        let saved = SavedAddress {
            id: Uuid::new_v4(),
            label: label.trim().to_owned(),
            address,
            is_default,
        };
        entries.push(saved.clone());
        self.store.set(SAVED_ADDRESSES_KEY, &entries)?;
        tracing::debug!(id = %saved.id, is_default, "address saved");
        Ok(saved)
    }

    /// Returns `false` when no address has `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the list cannot be read or written.
    pub fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut entries = self.list()?;
        let Some(pos) = entries.iter().position(|e| e.id == id) else {
            return Ok(false);
        };
        let removed = entries.remove(pos);
        if removed.is_default {
            if let Some(first) = entries.first_mut() {
                first.is_default = true;
            }
        }
        self.store.set(SAVED_ADDRESSES_KEY, &entries)?;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::AddressNotFound`] if no address has `id`.
    pub fn set_default(&self, id: Uuid) -> Result<(), StoreError> {
        let mut entries = self.list()?;
        if !entries.iter().any(|e| e.id == id) {
            return Err(StoreError::AddressNotFound(id.to_string()));
        }
        for entry in &mut entries {
            entry.is_default = entry.id == id;
        }
        self.store.set(SAVED_ADDRESSES_KEY, &entries)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the stored list cannot be read or decoded.
    pub fn default_address(&self) -> Result<Option<SavedAddress>, StoreError> {
        Ok(self.list()?.into_iter().find(|e| e.is_default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn address(city: &str) -> ResolvedAddress {
        ResolvedAddress {
            full_address: format!("12 MG Road, {city}"),
            latitude: 12.97,
            longitude: 77.59,
            city: city.to_owned(),
            state: "Karnataka".to_owned(),
            zip_code: "560001".to_owned(),
        }
    }

    #[test]
    fn first_saved_address_becomes_default() {
        let book = AddressBook::new(MemoryStore::new());
        let home = book.save("Home", address("Bengaluru"), false).unwrap();
        let office = book.save("Office", address("Mysuru"), false).unwrap();

        assert!(home.is_default);
        assert!(!office.is_default);
        assert_eq!(book.default_address().unwrap().map(|a| a.id), Some(home.id));
    }

    #[test]
    fn saving_as_default_clears_previous_default() {
        let book = AddressBook::new(MemoryStore::new());
        book.save("Home", address("Bengaluru"), false).unwrap();
        let office = book.save("Office", address("Mysuru"), true).unwrap();

        let defaults: Vec<_> = book
            .list()
            .unwrap()
            .into_iter()
            .filter(|a| a.is_default)
            .collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, office.id);
    }

    #[test]
    fn removing_default_promotes_next() {
        let book = AddressBook::new(MemoryStore::new());
        let home = book.save("Home", address("Bengaluru"), false).unwrap();
        let office = book.save("Office", address("Mysuru"), false).unwrap();

        assert!(book.remove(home.id).unwrap());
        assert!(!book.remove(home.id).unwrap());
        assert_eq!(book.default_address().unwrap().map(|a| a.id), Some(office.id));
    }

    #[test]
    fn set_default_switches_and_rejects_unknown_ids() {
        let book = AddressBook::new(MemoryStore::new());
        let home = book.save("Home", address("Bengaluru"), false).unwrap();
        let office = book.save("Office", address("Mysuru"), false).unwrap();

        book.set_default(office.id).unwrap();
        let list = book.list().unwrap();
        assert!(!list.iter().find(|a| a.id == home.id).unwrap().is_default);
        assert!(list.iter().find(|a| a.id == office.id).unwrap().is_default);

        let err = book.set_default(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::AddressNotFound(_)));
    }
}
