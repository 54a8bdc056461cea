use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::config::Settings;
use crate::core::security;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories::users::{self, CreateUser};

/// Creates the first admin account on a fresh database so the instance is
/// never locked out. Idempotent: an existing account with the configured
/// email is left untouched.
pub(crate) async fn ensure_admin(pool: &PgPool, settings: &Settings) -> anyhow::Result<()> {
    let admin = settings.admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD is not set; skipping admin bootstrap");
        return Ok(());
    }

    let existing = users::find_by_email(pool, &admin.first_admin_email)
        .await
        .context("failed to look up bootstrap admin")?;
    if existing.is_some() {
        return Ok(());
    }

    let now = primitive_now_utc();
    let user = users::create(
        pool,
        CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &admin.first_admin_email,
            hashed_password: &security::hash_password(&admin.first_admin_password),
            name: "Administrator",
            role: UserRole::Admin,
            created_at: now,
        },
    )
    .await
    .context("failed to create bootstrap admin")?;

    tracing::info!(user_id = %user.id, email = %user.email, "bootstrap admin created");
    Ok(())
}
