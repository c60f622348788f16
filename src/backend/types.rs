//! Wire types exchanged with the arbitrage backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

/// A detected price discrepancy for one token across two chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Backend-assigned identifier.
    pub id: String,
    /// Token contract address.
    pub token_address: String,
    /// Chain the token is bought on.
    pub source_chain: String,
    /// Chain the token is sold on.
    pub target_chain: String,
    /// Price on the source chain.
    #[serde(with = "rust_decimal::serde::float")]
    pub source_price: Decimal,
    /// Price on the target chain.
    #[serde(with = "rust_decimal::serde::float")]
    pub target_price: Decimal,
    /// Absolute price difference between the chains.
    #[serde(with = "rust_decimal::serde::float")]
    pub price_difference: Decimal,
    /// Gross profit before costs.
    #[serde(with = "rust_decimal::serde::float")]
    pub profit_potential: Decimal,
    /// Estimated gas cost.
    #[serde(with = "rust_decimal::serde::float")]
    pub gas_estimate: Decimal,
    /// Profit after gas.
    #[serde(with = "rust_decimal::serde::float")]
    pub net_profit: Decimal,
    /// Backend reliability estimate in [0, 1].
    #[serde(with = "rust_decimal::serde::float")]
    pub confidence_score: Decimal,
    /// When the backend detected the opportunity.
    #[serde(with = "timestamp")]
    pub timestamp: OffsetDateTime,
}

impl Opportunity {
    /// Price difference relative to the source price.
    ///
    /// Returns `None` when the source price is zero.
    pub fn price_difference_ratio(&self) -> Option<Decimal> {
        self.price_difference.checked_div(self.source_price)
    }

    /// Whether the backend considers this opportunity profitable.
    pub fn is_profitable(&self) -> bool {
        self.net_profit > Decimal::ZERO
    }
}

/// Request body for `POST /api/v1/execute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Opportunity to execute.
    pub opportunity_id: String,
    /// Amount to trade in tokens.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,
    /// Wallet to execute from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

/// Status string returned by the execute endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionStatus {
    /// The backend accepted the request and started executing.
    ExecutionStarted,
    /// Anything else the backend sends back.
    #[strum(default)]
    Other(String),
}

/// Response body for `POST /api/v1/execute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// Raw status string.
    pub status: String,
    /// Opportunity the request referred to.
    pub opportunity_id: String,
    /// Profit the backend expects to realize.
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_profit: Decimal,
    /// Transaction hash, once known.
    #[serde(default)]
    pub transaction_hash: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl ExecuteResponse {
    /// Parsed status.
    pub fn execution_status(&self) -> ExecutionStatus {
        // EnumString with a default variant never fails
        self.status
            .parse()
            .unwrap_or_else(|_| ExecutionStatus::Other(self.status.clone()))
    }

    /// Whether the backend reported `execution_started`.
    pub fn is_started(&self) -> bool {
        self.execution_status() == ExecutionStatus::ExecutionStarted
    }
}

/// A registered platform user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: String,
    /// Contact email.
    pub email: String,
    /// Default execution wallet.
    pub wallet_address: String,
    /// API key, returned on creation.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Subscription tier.
    pub tier: String,
    /// Account creation time.
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
    /// Whether the account is active.
    pub is_active: bool,
}

/// Request body for `POST /api/v1/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCreateRequest {
    /// Contact email.
    pub email: String,
    /// Default execution wallet.
    pub wallet_address: String,
    /// Subscription tier; the backend defaults to "free".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

/// Payload of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Reported status, e.g. "healthy".
    pub status: String,
    /// Server time.
    #[serde(default, with = "timestamp::option")]
    pub timestamp: Option<OffsetDateTime>,
    /// Backend version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Timestamps arrive either as RFC 3339 or as ISO 8601 without an offset.
/// Offset-less values are taken as UTC.
pub(crate) mod timestamp {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::well_known::{Iso8601, Rfc3339};
    use time::{OffsetDateTime, PrimitiveDateTime};

    pub fn parse(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
        OffsetDateTime::parse(value, &Rfc3339).or_else(|_| {
            PrimitiveDateTime::parse(value, &Iso8601::DEFAULT).map(PrimitiveDateTime::assume_utc)
        })
    }

    pub fn serialize<S: Serializer>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = value
            .format(&Rfc3339)
            .map_err(<S::Error as serde::ser::Error>::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<OffsetDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(ts) => super::serialize(ts, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<OffsetDateTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| parse(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
