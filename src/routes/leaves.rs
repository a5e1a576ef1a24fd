use axum::{routing::get, Router};
use crate::handlers::leave::{
    create_leave_request, create_leave_type, delete_leave_request, delete_leave_type,
    get_leave_request, get_leave_type, list_leave_requests, list_leave_types, update_leave_request,
    update_leave_type,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/leave-types", get(list_leave_types).post(create_leave_type))
        .route(
            "/leave-types/{id}",
            get(get_leave_type)
                .put(update_leave_type)
                .delete(delete_leave_type),
        )
        .route(
            "/leave-requests",
            get(list_leave_requests).post(create_leave_request),
        )
        .route(
            "/leave-requests/{id}",
            get(get_leave_request)
                .put(update_leave_request)
                .delete(delete_leave_request),
        )
}
