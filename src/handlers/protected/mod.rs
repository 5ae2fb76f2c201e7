// handlers/protected/mod.rs - Endpoints under the API key prefix
//
// Every handler here takes a `Principal`; the key filter has already
// resolved it by the time the handler runs.
pub mod wallet;
pub mod whoami;

pub use wallet::{wallet_get, wallet_list};
pub use whoami::whoami;
