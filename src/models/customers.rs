use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Clone, Debug, Serialize, FromRow)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub referral_code: String,
    pub referrals: i64,
    pub referred_persons: i64,
    pub position: i64,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

/// Signup payload. The browser form submits empty strings for fields the
/// visitor left blank, so everything is optional here and presence is
/// checked in the customer service.
#[derive(Clone, Debug, Deserialize)]
pub struct NewCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "referralCode")]
    pub referral_code: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SignupConfirmation {
    pub message: String,
    #[serde(rename = "referralCode")]
    pub referral_code: String,
    pub position: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewReferral {
    #[serde(rename = "referralCode")]
    pub referral_code: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, FromRow)]
pub struct TopReferrer {
    pub name: String,
    pub email: String,
    pub referrals: i64,
}

#[derive(Clone, Debug, Serialize, FromRow)]
pub struct RankEntry {
    pub name: String,
    pub email: String,
    pub position: i64,
    pub referral_code: String,
    pub referred_persons: i64,
}
