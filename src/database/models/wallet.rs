use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(owner_id: Uuid, name: impl Into<String>, amount: Decimal, currency: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            amount,
            currency: currency.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public projection of a wallet as returned by the list and detail endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub wallet_id: Uuid,
    pub wallet_name: String,
    pub wallet_amount: Decimal,
    pub wallet_currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            wallet_id: wallet.id,
            wallet_name: wallet.name,
            wallet_amount: wallet.amount,
            wallet_currency: wallet.currency,
            created_at: wallet.created_at,
            updated_at: wallet.updated_at,
        }
    }
}
