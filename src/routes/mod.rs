pub mod adjustments;
pub mod attendances;
pub mod brands;
pub mod categories;
pub mod companies;
pub mod customers;
pub mod departments;
pub mod employees;
pub mod expenses;
pub mod leaves;
pub mod products;
pub mod purchase_returns;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod sales_returns;
pub mod settings;
pub mod suppliers;
pub mod transfers;
pub mod units;
pub mod users;
pub mod warehouses;

use axum::{middleware, Router};

use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    // Everything except login/register requires a bearer token.
    let protected = Router::new()
        .merge(customers::routes())
        .merge(suppliers::routes())
        .merge(categories::routes())
        .merge(brands::routes())
        .merge(units::routes())
        .merge(warehouses::routes())
        .merge(products::routes())
        .merge(sales::routes())
        .merge(purchases::routes())
        .merge(sales_returns::routes())
        .merge(purchase_returns::routes())
        .merge(adjustments::routes())
        .merge(transfers::routes())
        .merge(expenses::routes())
        .merge(companies::routes())
        .merge(departments::routes())
        .merge(employees::routes())
        .merge(attendances::routes())
        .merge(leaves::routes())
        .merge(settings::routes())
        .merge(reports::routes())
        .layer(middleware::from_fn(require_auth));

    users::routes().merge(protected)
}
