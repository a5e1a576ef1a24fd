use axum::{routing::get, Router};
use crate::handlers::employee::{
    create_employee, delete_employee, get_employee, list_employees, update_employee,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/{id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}
