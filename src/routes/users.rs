use axum::{Router, routing::{post, get, put}, middleware};
use crate::state::AppState;
use crate::handlers::user::{register_user, login_user, get_me, list_users, update_user, delete_user};
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    let open = Router::new()
        .route("/auth/register", post(register_user))
        .route("/auth/login", post(login_user));

    let protected = Router::new()
        .route("/auth/me", get(get_me))
        .route("/users", get(list_users))
        .route("/users/{id}", put(update_user).delete(delete_user))
        .layer(middleware::from_fn(require_auth));

    open.merge(protected)
}
