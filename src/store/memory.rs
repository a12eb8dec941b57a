//! In-memory merchant store.
//!
//! Intended for tests and local development (`STORE_BACKEND=memory`). Data is lost when the
//! process exits.
//!
//! The whole table sits behind one [`parking_lot::RwLock`], so each write checks every unique
//! index and applies the change under a single lock acquisition. That gives the same row-level
//! atomicity as the Postgres adapter.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{MerchantStore, StoreError, UniqueField};
use crate::models::merchant::{Merchant, NewMerchant};

#[derive(Default)]
struct Table {
    rows: HashMap<i64, Merchant>,
    by_email: HashMap<String, i64>,
    by_company: HashMap<String, i64>,
    by_api_key: HashMap<String, i64>,
    next_id: i64,
}

/// Merchant store held in process memory.
///
/// Cheaply cloneable; all clones share the same table.
#[derive(Clone, Default)]
pub struct InMemoryMerchantStore {
    table: Arc<RwLock<Table>>,
}

impl InMemoryMerchantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored merchants.
    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MerchantStore for InMemoryMerchantStore {
    async fn create(&self, merchant: NewMerchant) -> Result<Merchant, StoreError> {
        let mut table = self.table.write();

        if table.by_email.contains_key(&merchant.email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }
        if table.by_company.contains_key(&merchant.company_name) {
            return Err(StoreError::Conflict(UniqueField::CompanyName));
        }
        if table.by_api_key.contains_key(&merchant.api_key) {
            return Err(StoreError::Conflict(UniqueField::ApiKey));
        }

        table.next_id += 1;
        let now = Utc::now();
        let row = Merchant {
            id: table.next_id,
            company_name: merchant.company_name,
            email: merchant.email,
            password_hash: merchant.password_hash,
            api_key: merchant.api_key,
            active: true,
            settings: merchant.settings,
            created_at: now,
            updated_at: now,
        };

        table.by_email.insert(row.email.clone(), row.id);
        table.by_company.insert(row.company_name.clone(), row.id);
        table.by_api_key.insert(row.api_key.clone(), row.id);
        table.rows.insert(row.id, row.clone());

        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Merchant>, StoreError> {
        Ok(self.table.read().rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Merchant>, StoreError> {
        let table = self.table.read();
        Ok(table
            .by_email
            .get(email)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Merchant>, StoreError> {
        let table = self.table.read();
        Ok(table
            .by_api_key
            .get(api_key)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn update_api_key(
        &self,
        id: i64,
        api_key: &str,
    ) -> Result<Option<Merchant>, StoreError> {
        let mut table = self.table.write();

        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if table.by_api_key.get(api_key).is_some_and(|owner| *owner != id) {
            return Err(StoreError::Conflict(UniqueField::ApiKey));
        }

        let Table {
            rows, by_api_key, ..
        } = &mut *table;

        let Some(row) = rows.get_mut(&id) else {
            return Ok(None);
        };

        by_api_key.remove(&row.api_key);
        by_api_key.insert(api_key.to_string(), id);
        row.api_key = api_key.to_string();
        row.updated_at = Utc::now();

        Ok(Some(row.clone()))
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Merchant>, StoreError> {
        let mut table = self.table.write();

        Ok(table.rows.get_mut(&id).map(|row| {
            row.active = active;
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
