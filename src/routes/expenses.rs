use axum::{routing::get, Router};
use crate::handlers::expense::{
    create_expense, create_expense_category, delete_expense, delete_expense_category, get_expense,
    get_expense_category, list_expense_categories, list_expenses, update_expense,
    update_expense_category,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/expense-categories",
            get(list_expense_categories).post(create_expense_category),
        )
        .route(
            "/expense-categories/{id}",
            get(get_expense_category)
                .put(update_expense_category)
                .delete(delete_expense_category),
        )
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/{id}",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}
