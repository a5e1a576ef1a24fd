use axum::{routing::get, Router};
use crate::handlers::department::{
    create_department, delete_department, get_department, list_departments, update_department,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/departments", get(list_departments).post(create_department))
        .route(
            "/departments/{id}",
            get(get_department)
                .put(update_department)
                .delete(delete_department),
        )
}
