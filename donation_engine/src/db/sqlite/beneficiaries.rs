use log::debug;
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Beneficiary, NewBeneficiary, UpdateBeneficiary},
    traits::LedgerError,
};

/// Inserts the beneficiary, returning `false` in the second parameter if a row with the same gateway id
/// already exists. The very first beneficiary becomes active so that the "exactly one active once any exist"
/// rule holds from the start.
pub async fn idempotent_insert(
    beneficiary: NewBeneficiary,
    conn: &mut SqliteConnection,
) -> Result<(Beneficiary, bool), LedgerError> {
    let inserted = match fetch_by_gateway_id(&beneficiary.gateway_id, &mut *conn).await? {
        Some(existing) => (existing, false),
        None => {
            let make_active = count_all(&mut *conn).await? == 0;
            let beneficiary = insert(beneficiary, make_active, conn).await?;
            debug!("📝️ Beneficiary [{}] inserted (active: {})", beneficiary.gateway_id, beneficiary.is_active);
            (beneficiary, true)
        },
    };
    Ok(inserted)
}

async fn insert(
    beneficiary: NewBeneficiary,
    is_active: bool,
    conn: &mut SqliteConnection,
) -> Result<Beneficiary, LedgerError> {
    let beneficiary = sqlx::query_as(
        r#"
            INSERT INTO beneficiaries (gateway_id, name, phone, email, provider, country, is_active, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(beneficiary.gateway_id)
    .bind(beneficiary.name)
    .bind(beneficiary.phone)
    .bind(beneficiary.email)
    .bind(beneficiary.provider)
    .bind(beneficiary.country)
    .bind(is_active)
    .bind(beneficiary.status)
    .fetch_one(conn)
    .await?;
    Ok(beneficiary)
}

pub async fn fetch_by_gateway_id(
    gateway_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Beneficiary>, LedgerError> {
    let beneficiary = sqlx::query_as("SELECT * FROM beneficiaries WHERE gateway_id = $1")
        .bind(gateway_id)
        .fetch_optional(conn)
        .await?;
    Ok(beneficiary)
}

pub async fn fetch_all(conn: &mut SqliteConnection) -> Result<Vec<Beneficiary>, LedgerError> {
    let beneficiaries =
        sqlx::query_as("SELECT * FROM beneficiaries ORDER BY created_at ASC").fetch_all(conn).await?;
    Ok(beneficiaries)
}

pub async fn fetch_active(conn: &mut SqliteConnection) -> Result<Option<Beneficiary>, LedgerError> {
    let beneficiary =
        sqlx::query_as("SELECT * FROM beneficiaries WHERE is_active = 1 LIMIT 1").fetch_optional(conn).await?;
    Ok(beneficiary)
}

pub async fn count_active(conn: &mut SqliteConnection) -> Result<i64, LedgerError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM beneficiaries WHERE is_active = 1").fetch_one(conn).await?;
    Ok(count)
}

async fn count_all(conn: &mut SqliteConnection) -> Result<i64, LedgerError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM beneficiaries").fetch_one(conn).await?;
    Ok(count)
}

pub async fn update(
    gateway_id: &str,
    update: UpdateBeneficiary,
    conn: &mut SqliteConnection,
) -> Result<Beneficiary, LedgerError> {
    if update.is_empty() {
        return Err(LedgerError::Validation("No beneficiary fields to update".to_string()));
    }
    let mut builder = QueryBuilder::new("UPDATE beneficiaries SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(phone) = update.phone {
        set_clause.push("phone = ");
        set_clause.push_bind_unseparated(phone);
    }
    if let Some(email) = update.email {
        set_clause.push("email = ");
        set_clause.push_bind_unseparated(email);
    }
    if let Some(provider) = update.provider {
        set_clause.push("provider = ");
        set_clause.push_bind_unseparated(provider);
    }
    if let Some(country) = update.country {
        set_clause.push("country = ");
        set_clause.push_bind_unseparated(country);
    }
    builder.push(" WHERE gateway_id = ");
    builder.push_bind(gateway_id);
    builder.push(" RETURNING *");
    let result = builder.build().fetch_optional(conn).await?.map(|row: SqliteRow| Beneficiary::from_row(&row)).transpose()?;
    result.ok_or_else(|| LedgerError::BeneficiaryNotFound(gateway_id.to_string()))
}

/// Deactivates every active beneficiary. Half of the atomic "deactivate all, activate one" pair; callers wrap
/// this and [`activate`] in a single transaction.
pub async fn deactivate_all(conn: &mut SqliteConnection) -> Result<u64, LedgerError> {
    let result =
        sqlx::query("UPDATE beneficiaries SET is_active = 0, updated_at = CURRENT_TIMESTAMP WHERE is_active = 1")
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}

pub async fn activate(gateway_id: &str, conn: &mut SqliteConnection) -> Result<Beneficiary, LedgerError> {
    let beneficiary: Option<Beneficiary> = sqlx::query_as(
        "UPDATE beneficiaries SET is_active = 1, updated_at = CURRENT_TIMESTAMP WHERE gateway_id = $1 RETURNING *",
    )
    .bind(gateway_id)
    .fetch_optional(conn)
    .await?;
    beneficiary.ok_or_else(|| LedgerError::BeneficiaryNotFound(gateway_id.to_string()))
}

pub async fn deactivate(gateway_id: &str, conn: &mut SqliteConnection) -> Result<Beneficiary, LedgerError> {
    let beneficiary: Option<Beneficiary> = sqlx::query_as(
        "UPDATE beneficiaries SET is_active = 0, updated_at = CURRENT_TIMESTAMP WHERE gateway_id = $1 RETURNING *",
    )
    .bind(gateway_id)
    .fetch_optional(conn)
    .await?;
    beneficiary.ok_or_else(|| LedgerError::BeneficiaryNotFound(gateway_id.to_string()))
}

pub async fn delete(gateway_id: &str, conn: &mut SqliteConnection) -> Result<Beneficiary, LedgerError> {
    let beneficiary: Option<Beneficiary> =
        sqlx::query_as("DELETE FROM beneficiaries WHERE gateway_id = $1 RETURNING *")
            .bind(gateway_id)
            .fetch_optional(conn)
            .await?;
    beneficiary.ok_or_else(|| LedgerError::BeneficiaryNotFound(gateway_id.to_string()))
}
