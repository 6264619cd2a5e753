use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::rbac::{ActionType, Role};
use crate::models::user::Identity;

/// Canonical text form for timestamps written by this crate. Fixed width so
/// that SQL string comparison orders correctly.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    // Try RFC3339 first (e.g. 2025-11-19T12:34:56Z)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite default timestamp format: "YYYY-MM-DD HH:MM:SS" (with optional fractional seconds)
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    if let Ok(naive_date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ndt = naive_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AppError::internal("invalid datetime: date out of range"))?;
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

fn parse_opt_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, AppError> {
    match s {
        Some(s) if !s.trim().is_empty() => Ok(Some(parse_datetime(&s)?)),
        _ => Ok(None),
    }
}

pub fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s.trim()).map_err(|e| AppError::internal(format!("invalid uuid: {}", e)))
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, AppError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|e| AppError::internal(format!("missing {}: {}", name, e)))
}

pub fn identity_from_row(row: &SqliteRow) -> Result<Identity, AppError> {
    let id_s: String = column(row, "id")?;
    let is_active: Option<i64> = column(row, "is_active")?;
    let active_start_s: String = column(row, "active_start_date")?;
    let active_end_s: Option<String> = column(row, "active_end_date")?;
    let created_at_s: String = column(row, "created_at")?;
    let updated_at_s: String = column(row, "updated_at")?;

    Ok(Identity {
        id: parse_uuid(&id_s)?,
        first_name: column(row, "first_name")?,
        last_name: column(row, "last_name")?,
        login_id: column(row, "login_id")?,
        email_work: column(row, "email_work")?,
        email_personal: column(row, "email_personal")?,
        phone_number_work: column(row, "phone_number_work")?,
        phone_number_personal: column(row, "phone_number_personal")?,
        is_active: is_active.map(|v| v != 0),
        active_start_date: parse_datetime(&active_start_s)?,
        active_end_date: parse_opt_datetime(active_end_s)?,
        password_hash: column(row, "password")?,
        created_at: parse_datetime(&created_at_s)?,
        updated_at: parse_datetime(&updated_at_s)?,
    })
}

pub fn role_from_row(row: &SqliteRow) -> Result<Role, AppError> {
    let id_s: String = column(row, "id")?;
    let created_at_s: String = column(row, "created_at")?;
    let updated_at_s: String = column(row, "updated_at")?;

    Ok(Role {
        id: parse_uuid(&id_s)?,
        name: column(row, "name")?,
        created_at: parse_datetime(&created_at_s)?,
        updated_at: parse_datetime(&updated_at_s)?,
    })
}

pub fn action_type_from_row(row: &SqliteRow) -> Result<ActionType, AppError> {
    let id_s: String = column(row, "id")?;
    let created_at_s: String = column(row, "created_at")?;
    let updated_at_s: String = column(row, "updated_at")?;

    Ok(ActionType {
        id: parse_uuid(&id_s)?,
        name: column(row, "name")?,
        description: column(row, "description")?,
        created_at: parse_datetime(&created_at_s)?,
        updated_at: parse_datetime(&updated_at_s)?,
    })
}
