//! PostgreSQL merchant store backed by sqlx.
//!
//! All writes are single statements with `RETURNING`, so each operation is atomic at the row
//! level without an explicit transaction.

use async_trait::async_trait;

use super::{MerchantStore, StoreError, UniqueField};
use crate::{
    db::DbPool,
    models::merchant::{Merchant, NewMerchant},
};

/// Columns selected for every `Merchant` row.
const MERCHANT_COLUMNS: &str =
    "id, company_name, email, password_hash, api_key, active, settings, created_at, updated_at";

/// Merchant store over the `merchants` table.
#[derive(Clone)]
pub struct PgMerchantStore {
    pool: DbPool,
}

impl PgMerchantStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Translate a unique violation into the column it protects.
///
/// Constraint names follow the Postgres default `<table>_<column>_key` used by the migration.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some("merchants_email_key") => Some(UniqueField::Email),
                Some("merchants_company_name_key") => Some(UniqueField::CompanyName),
                Some("merchants_api_key_key") => Some(UniqueField::ApiKey),
                _ => None,
            };

            if let Some(field) = field {
                return StoreError::Conflict(field);
            }
        }
    }

    StoreError::Database(err)
}

#[async_trait]
impl MerchantStore for PgMerchantStore {
    async fn create(&self, merchant: NewMerchant) -> Result<Merchant, StoreError> {
        let query = format!(
            r#"
            INSERT INTO merchants (company_name, email, password_hash, api_key, settings)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MERCHANT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Merchant>(&query)
            .bind(&merchant.company_name)
            .bind(&merchant.email)
            .bind(&merchant.password_hash)
            .bind(&merchant.api_key)
            .bind(&merchant.settings)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Merchant>, StoreError> {
        let query = format!("SELECT {MERCHANT_COLUMNS} FROM merchants WHERE id = $1");

        Ok(sqlx::query_as::<_, Merchant>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Merchant>, StoreError> {
        let query = format!("SELECT {MERCHANT_COLUMNS} FROM merchants WHERE email = $1");

        Ok(sqlx::query_as::<_, Merchant>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Merchant>, StoreError> {
        let query = format!("SELECT {MERCHANT_COLUMNS} FROM merchants WHERE api_key = $1");

        Ok(sqlx::query_as::<_, Merchant>(&query)
            .bind(api_key)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_api_key(
        &self,
        id: i64,
        api_key: &str,
    ) -> Result<Option<Merchant>, StoreError> {
        let query = format!(
            r#"
            UPDATE merchants
            SET api_key = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {MERCHANT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Merchant>(&query)
            .bind(id)
            .bind(api_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Merchant>, StoreError> {
        let query = format!(
            r#"
            UPDATE merchants
            SET active = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {MERCHANT_COLUMNS}
            "#
        );

        Ok(sqlx::query_as::<_, Merchant>(&query)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
