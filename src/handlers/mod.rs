// handlers/mod.rs - Handlers split by access tier
//
// Public (no key) -> `/`, `/health`
// Protected (API key) -> everything under `/api/v1`
pub mod protected;
pub mod public;

pub use protected::*;
pub use public::*;
