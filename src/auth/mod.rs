use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub(crate) mod jwt;
mod password;
mod services;

pub use extractors::Caller;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
