pub mod handlers;
pub mod routes;
pub mod update;

pub use routes::create_router;
