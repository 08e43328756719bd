use deadpool_postgres::Pool;

use crate::error::Result;

/// Settings row whose presence marks the system as configured.
pub const ADMIN_PASSWORD_KEY: &str = "admin_password_hash";

/// Whether initial setup has been completed.
pub async fn is_configured(pool: &Pool) -> Result<bool> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT 1 FROM settings WHERE key = $1",
            &[&ADMIN_PASSWORD_KEY],
        )
        .await?;
    Ok(row.is_some())
}

/// Reads the stored admin password hash, if any.
pub async fn admin_password_hash(pool: &Pool) -> Result<Option<String>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT value FROM settings WHERE key = $1",
            &[&ADMIN_PASSWORD_KEY],
        )
        .await?;
    row.map(|r| r.try_get("value").map_err(Into::into)).transpose()
}

/// Stores the admin password hash unless one already exists.
///
/// Returns false when the system was already configured; the unconfigured →
/// configured transition is one-way.
pub async fn store_admin_password_hash(pool: &Pool, hash: &str) -> Result<bool> {
    let client = pool.get().await?;
    let inserted = client
        .execute(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO NOTHING
            "#,
            &[&ADMIN_PASSWORD_KEY, &hash],
        )
        .await?;
    Ok(inserted == 1)
}
