pub mod app;
pub mod error;
pub mod gql;
pub mod reservations;
pub mod routes;
pub mod services;
pub mod state;

pub use state::AppState;
