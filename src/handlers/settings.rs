use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{json, Map, Value};
use sqlx::MySqlPool;
use std::collections::HashMap;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::state::AppState;
use axum::Extension;

const ALLOWED_LOGO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "svg", "webp"];

// GET /settings - All settings as one key/value object
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<Map<String, Value>>, AppError> {
    fetch_settings(&state.db_pool).await.map(Json)
}

// PUT /settings - Upsert the submitted keys in one transaction
#[instrument(skip(state, auth, payload))]
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<HashMap<String, String>>,
) -> Result<Json<Map<String, Value>>, AppError> {
    if payload.is_empty() {
        return Err(AppError::validation("No settings provided"));
    }

    let mut tx = state.db_pool.begin().await?;
    for (key, value) in &payload {
        if key.trim().is_empty() {
            return Err(AppError::validation("Setting key cannot be empty"));
        }
        sqlx::query(
            "INSERT INTO settings (setting_key, setting_value) VALUES (?, ?)
             ON DUPLICATE KEY UPDATE setting_value = ?",
        )
        .bind(key)
        .bind(value)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(user = %auth.username, keys = payload.len(), "Settings updated");

    fetch_settings(&state.db_pool).await.map(Json)
}

// POST /settings/logo - Store the uploaded logo file and remember its path
#[instrument(skip(state, auth, multipart))]
pub async fn upload_logo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() != Some("logo") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("logo.png").to_string();
        let extension = std::path::Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if !ALLOWED_LOGO_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::validation(format!(
                "Logo must be one of: {}",
                ALLOWED_LOGO_EXTENSIONS.join(", ")
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read upload: {e}")))?;
        if data.is_empty() {
            return Err(AppError::validation("Uploaded file is empty"));
        }

        tokio::fs::create_dir_all(&state.upload_dir)
            .await
            .map_err(|e| AppError::internal(format!("Failed to create upload dir: {e}")))?;

        let stored_name = format!("logo_{}.{}", chrono::Utc::now().timestamp_millis(), extension);
        let target = state.upload_dir.join(&stored_name);
        tokio::fs::write(&target, &data)
            .await
            .map_err(|e| AppError::internal(format!("Failed to store upload: {e}")))?;

        let public_path = format!("/uploads/{stored_name}");
        sqlx::query(
            "INSERT INTO settings (setting_key, setting_value) VALUES ('logo', ?)
             ON DUPLICATE KEY UPDATE setting_value = ?",
        )
        .bind(&public_path)
        .bind(&public_path)
        .execute(&state.db_pool)
        .await?;

        info!(user = %auth.username, path = %public_path, "Logo updated");
        return Ok(Json(json!({ "logo": public_path })));
    }

    Err(AppError::validation("Missing 'logo' file field"))
}

async fn fetch_settings(pool: &MySqlPool) -> Result<Map<String, Value>, AppError> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT setting_key, setting_value FROM settings ORDER BY setting_key",
    )
    .fetch_all(pool)
    .await?;

    let mut settings = Map::new();
    for (key, value) in rows {
        settings.insert(key, Value::String(value));
    }
    Ok(settings)
}
