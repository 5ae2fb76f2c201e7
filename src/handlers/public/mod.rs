// handlers/public/mod.rs - Endpoints reachable without an API key
pub mod info;

pub use info::{health, root};
