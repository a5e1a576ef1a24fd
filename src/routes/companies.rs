use axum::{routing::get, Router};
use crate::handlers::company::{
    create_company, delete_company, get_company, list_companies, update_company,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list_companies).post(create_company))
        .route(
            "/companies/{id}",
            get(get_company).put(update_company).delete(delete_company),
        )
}
