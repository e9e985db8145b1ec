use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories::users::{self, CreateUser, UpdateUser};

/// Makes sure the configured superuser exists as an active admin with the configured password.
pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not configured; skipping superuser creation");
        return Ok(());
    }

    let username = admin.first_superuser_username.as_str();
    let now = primitive_now_utc();

    let Some(user) = users::find_by_username(state.db(), username).await? else {
        users::create(
            state.db(),
            CreateUser {
                id: &Uuid::new_v4().to_string(),
                username,
                hashed_password: security::hash_password(&admin.first_superuser_password)?,
                full_name: "Administrator",
                role: UserRole::Admin,
                is_active: true,
                created_at: now,
            },
        )
        .await?;
        tracing::info!(username, "Created default superuser");
        return Ok(());
    };

    let password_matches =
        security::verify_password(&admin.first_superuser_password, &user.hashed_password)
            .unwrap_or(false);
    if password_matches && user.role == UserRole::Admin && user.is_active {
        tracing::info!("Default superuser already up to date");
        return Ok(());
    }

    let hashed_password = if password_matches {
        None
    } else {
        Some(security::hash_password(&admin.first_superuser_password)?)
    };

    users::update(
        state.db(),
        &user.id,
        UpdateUser {
            full_name: None,
            role: Some(UserRole::Admin),
            is_active: Some(true),
            hashed_password,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!(username, "Updated default superuser");
    Ok(())
}
