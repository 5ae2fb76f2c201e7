pub mod api_key;
pub mod user;
pub mod wallet;

pub use api_key::{generate_key, hash_key, ApiKeyRecord};
pub use user::User;
pub use wallet::{Wallet, WalletResponse};
