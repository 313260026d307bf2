//! Postgres-backed account repository.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RepositoryError | Scenario |
//! |------------|----------------------|-----------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Email already registered (`users_email_key`) |
//! | Database (other) | Any other | `Backend` | Constraint or server errors |
//! | PoolClosed / Io / other | N/A | `Backend` | Connection failures |
//!
//! ## Atomicity
//!
//! `create_account` runs inside one transaction. Any early return drops the
//! `Transaction` uncommitted, which rolls it back, so a company row without its
//! user (or the reverse) is never observable.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument};
use uuid::Uuid;

use onboard_core::{
    AccountRepository, Address, CompanyId, CompanyRecord, CreatedAccount, NewCompany, NewUser,
    RepositoryError, UserId, UserRecord,
};

const SCHEMA: &str = include_str!("../../migrations/0001_accounts.sql");

/// Postgres-backed account repository.
///
/// Uses the SQLx connection pool, which is `Send + Sync` and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresAccountRepository {
    pool: Arc<PgPool>,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `companies`/`users` tables if they do not exist.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    #[instrument(skip_all, err)]
    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("email_exists", e))?;
        Ok(exists)
    }

    #[instrument(skip_all, fields(operation = tracing::field::Empty), err)]
    async fn create_account(
        &self,
        company: NewCompany,
        user: NewUser,
    ) -> Result<CreatedAccount, RepositoryError> {
        let span = Span::current();
        span.record("operation", "create_account");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Closes the window between the signup's first uniqueness check and now.
        // The unique constraint still backs this up against concurrent commits.
        let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(&user.email)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("recheck_email", e))?;
        if taken {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(RepositoryError::Conflict(
                "email already registered".to_string(),
            ));
        }

        let company_id = CompanyId::new();
        let user_id = UserId::new();

        insert_company(&mut tx, company_id, &company).await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, company_id, email, password_hash, role, active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(company_id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(%company_id, %user_id, "account created");
        Ok(CreatedAccount {
            company_id,
            user_id,
        })
    }

    #[instrument(skip_all, err)]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, company_id, email, password_hash, role, active, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip_all, fields(user_id = %user_id), err)]
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, company_id, email, password_hash, role, active, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip_all, fields(company_id = %company_id), err)]
    async fn find_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Option<CompanyRecord>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM companies WHERE id = $1")
            .bind(company_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_company", e))?;

        row.as_ref().map(company_from_row).transpose()
    }

    #[instrument(skip_all, fields(user_id = %user_id), err)]
    async fn set_user_active(&self, user_id: UserId, active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET active = $2 WHERE id = $1")
            .bind(user_id.as_uuid())
            .bind(active)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_user_active", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

async fn insert_company(
    tx: &mut Transaction<'_, Postgres>,
    company_id: CompanyId,
    c: &NewCompany,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO companies (
            id, name, enterprise_number, website, phone,
            contact_first_name, contact_last_name,
            registered_street, registered_number, registered_box,
            registered_postal_code, registered_city, registered_country, registered_line,
            billing_email,
            billing_street, billing_number, billing_box,
            billing_postal_code, billing_city, billing_country,
            delivery_street, delivery_number, delivery_box,
            delivery_postal_code, delivery_city, delivery_country
        )
        VALUES (
            $1, $2, $3, $4, $5,
            $6, $7,
            $8, $9, $10,
            $11, $12, $13, $14,
            $15,
            $16, $17, $18,
            $19, $20, $21,
            $22, $23, $24,
            $25, $26, $27
        )
        "#,
    )
    .bind(company_id.as_uuid())
    .bind(&c.name)
    .bind(&c.enterprise_number)
    .bind(&c.website)
    .bind(&c.phone)
    .bind(&c.contact_first_name)
    .bind(&c.contact_last_name)
    .bind(&c.registered.street)
    .bind(&c.registered.number)
    .bind(&c.registered.box_number)
    .bind(&c.registered.postal_code)
    .bind(&c.registered.city)
    .bind(&c.registered.country)
    .bind(c.registered.line())
    .bind(&c.billing_email)
    .bind(&c.billing.street)
    .bind(&c.billing.number)
    .bind(&c.billing.box_number)
    .bind(&c.billing.postal_code)
    .bind(&c.billing.city)
    .bind(&c.billing.country)
    .bind(&c.delivery.street)
    .bind(&c.delivery.number)
    .bind(&c.delivery.box_number)
    .bind(&c.delivery.postal_code)
    .bind(&c.delivery.city)
    .bind(&c.delivery.country)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_company", e))?;

    Ok(())
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, RepositoryError> {
    let decode = |e| map_sqlx_error("decode_user", e);
    Ok(UserRecord {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        company_id: CompanyId::from_uuid(row.try_get::<Uuid, _>("company_id").map_err(decode)?),
        email: row.try_get("email").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        role: row.try_get("role").map_err(decode)?,
        active: row.try_get("active").map_err(decode)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
    })
}

fn company_from_row(row: &PgRow) -> Result<CompanyRecord, RepositoryError> {
    let decode = |e| map_sqlx_error("decode_company", e);
    Ok(CompanyRecord {
        id: CompanyId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        company: NewCompany {
            name: row.try_get("name").map_err(decode)?,
            enterprise_number: row.try_get("enterprise_number").map_err(decode)?,
            website: row.try_get("website").map_err(decode)?,
            phone: row.try_get("phone").map_err(decode)?,
            contact_first_name: row.try_get("contact_first_name").map_err(decode)?,
            contact_last_name: row.try_get("contact_last_name").map_err(decode)?,
            registered: address_from_row(row, "registered")?,
            billing_email: row.try_get("billing_email").map_err(decode)?,
            billing: address_from_row(row, "billing")?,
            delivery: address_from_row(row, "delivery")?,
        },
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
    })
}

fn address_from_row(row: &PgRow, prefix: &str) -> Result<Address, RepositoryError> {
    let get = |col: &str| -> Result<String, RepositoryError> {
        row.try_get::<String, _>(format!("{prefix}_{col}").as_str())
            .map(|v| v.trim_end().to_string())
            .map_err(|e| map_sqlx_error("decode_address", e))
    };
    let box_number: Option<String> = row
        .try_get(format!("{prefix}_box").as_str())
        .map_err(|e| map_sqlx_error("decode_address", e))?;

    Ok(Address {
        street: get("street")?,
        number: get("number")?,
        box_number,
        postal_code: get("postal_code")?,
        city: get("city")?,
        country: get("country")?,
    })
}

/// Map SQLx errors to repository errors.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => RepositoryError::Conflict(msg),
                _ => RepositoryError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            RepositoryError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        _ => RepositoryError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
