use axum::{
    Router,
    routing::{get, post},
};

use crate::handler::{self, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::healthcheck))
        .route("/one/:id", get(handler::get_one))
        .route("/all", get(handler::get_all))
        .route("/first/:filter/:value/:sort", get(handler::get_first))
        .route("/add", post(handler::add_bookmark))
        .route("/edit/:id", post(handler::edit_bookmark))
        .route("/delete/:id", get(handler::delete_bookmark))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handler::healthcheck))
        .route("/api/", get(handler::healthcheck))
        .nest("/api", routes())
        .with_state(state)
}
