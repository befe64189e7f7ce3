pub mod health;
pub mod router;
pub mod state;
pub mod types;
pub mod v1;
pub mod ws;

pub use router::create_router;
pub use state::AppState;
