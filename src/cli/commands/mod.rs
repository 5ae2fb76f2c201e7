pub mod key;
pub mod migrate;
pub mod user;
