use bcrypt::{hash, verify, DEFAULT_COST};
use crate::dtos::user::{
    LoginRequest, LoginResponse, RegisterUserRequest, UpdateUserRequest, UserResponse,
};
use crate::auth::jwt::sign_token;
use crate::error::{map_unique_violation, AppError};
use crate::pagination::{search_clause, ListParams, Paginated};
use crate::state::AppState;
use crate::middleware::auth::AuthContext;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::MySqlPool;

const COLUMNS: &str = "id, username, email, role, is_active, created_at";

// POST /auth/register
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    // Basic validation
    if payload.role != "admin" && payload.role != "staff" {
        return Err(AppError::validation("Invalid role"));
    }
    if payload.username.trim().is_empty() {
        return Err(AppError::validation("Username required"));
    }
    if payload.password.len() < 6 {
        return Err(AppError::validation("Password too short"));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Hash error: {e}")))?;

    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, role) VALUES (?, ?, ?, ?)",
    )
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(&payload.role)
    .execute(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Username already exists"))?;

    let user = fetch_user(&state.db_pool, result.last_insert_id() as i64).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// POST /auth/login
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::validation("Username required"));
    }
    if payload.password.is_empty() {
        return Err(AppError::validation("Password required"));
    }

    let user = sqlx::query_as::<_, crate::models::user::User>(
        "SELECT id, username, email, password_hash, role, is_active, created_at
         FROM users WHERE username = ?",
    )
    .bind(&payload.username)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    if !user.is_active {
        return Err(AppError::forbidden("User inactive"));
    }

    let ok = verify(&payload.password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Password verify error: {e}")))?;

    if !ok {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::internal("JWT secret not configured"))?;

    let token = sign_token(user.id, &user.role, &user.username, &secret)?;

    // 8 hours = 28800 seconds
    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in_seconds: 8 * 60 * 60,
    }))
}

// GET /auth/me - Full profile for the authenticated user
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserResponse>, AppError> {
    fetch_user(&state.db_pool, auth.user_id).await.map(Json)
}

// GET /users - List users (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<UserResponse>>, AppError> {
    if !auth.is_admin() {
        return Err(AppError::forbidden("Only admins can list users"));
    }

    let (page, limit) = params.normalized();
    let term = params.like_term();

    let mut where_sql = String::from("WHERE 1=1");
    if term.is_some() {
        where_sql.push_str(" AND ");
        where_sql.push_str(&search_clause(&["username", "email"]));
    }

    let count_sql = format!("SELECT COUNT(*) FROM users {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(t) = &term {
        count_query = count_query.bind(t.clone()).bind(t.clone());
    }
    let total = count_query.fetch_one(&state.db_pool).await?;

    let rows_sql = format!("SELECT {COLUMNS} FROM users {where_sql} ORDER BY id LIMIT ? OFFSET ?");
    let mut rows_query = sqlx::query_as::<_, UserResponse>(&rows_sql);
    if let Some(t) = &term {
        rows_query = rows_query.bind(t.clone()).bind(t.clone());
    }
    let users = rows_query
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(Paginated::new(users, total, page, limit)))
}

// PUT /users/:id - Update role/active/email/password (admin only)
pub async fn update_user(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if !auth.is_admin() {
        return Err(AppError::forbidden("Only admins can update users"));
    }
    if let Some(role) = payload.role.as_deref() {
        if role != "admin" && role != "staff" {
            return Err(AppError::validation("Invalid role"));
        }
    }

    let password_hash = match payload.password.as_deref() {
        Some(p) if p.len() < 6 => return Err(AppError::validation("Password too short")),
        Some(p) => Some(
            hash(p, DEFAULT_COST).map_err(|e| AppError::internal(format!("Hash error: {e}")))?,
        ),
        None => None,
    };

    sqlx::query(
        "UPDATE users SET
         email = COALESCE(?, email),
         role = COALESCE(?, role),
         is_active = COALESCE(?, is_active),
         password_hash = COALESCE(?, password_hash)
         WHERE id = ?",
    )
    .bind(payload.email)
    .bind(payload.role)
    .bind(payload.is_active)
    .bind(password_hash)
    .bind(id)
    .execute(&state.db_pool)
    .await?;

    fetch_user(&state.db_pool, id).await.map(Json)
}

// DELETE /users/:id - Admin only; self-deletion is rejected
pub async fn delete_user(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<()>, AppError> {
    if !auth.is_admin() {
        return Err(AppError::forbidden("Only admins can delete users"));
    }
    if auth.user_id == id {
        return Err(AppError::validation("Cannot delete your own account"));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("User not found"));
    }

    Ok(Json(()))
}

async fn fetch_user(pool: &MySqlPool, id: i64) -> Result<UserResponse, AppError> {
    sqlx::query_as::<_, UserResponse>(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}
