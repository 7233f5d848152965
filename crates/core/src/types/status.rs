//! Status enums for orders, payments and meal plans.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Lifecycle of a placed order.
///
/// New orders start as `Pending`, or `PendingDelivery` when the customer pays
/// cash on delivery. Admins move them through the remaining states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    PendingDelivery,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Every status an admin can assign.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::PendingDelivery,
        Self::Processing,
        Self::Completed,
        Self::Cancelled,
    ];

    /// The wire/database name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingDelivery => "pending_delivery",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("order status", s))
    }
}

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    MobileMoney,
    BankTransfer,
    CashOnDelivery,
}

impl PaymentMethod {
    /// Whether a proof-of-payment upload must accompany the order.
    #[must_use]
    pub const fn requires_proof(&self) -> bool {
        matches!(self, Self::BankTransfer)
    }

    /// Status a freshly placed order starts in.
    #[must_use]
    pub const fn initial_order_status(&self) -> OrderStatus {
        match self {
            Self::CashOnDelivery => OrderStatus::PendingDelivery,
            Self::Card | Self::MobileMoney | Self::BankTransfer => OrderStatus::Pending,
        }
    }

    /// Payment status a freshly placed order starts in.
    #[must_use]
    pub const fn initial_payment_status(&self) -> PaymentStatus {
        match self {
            Self::CashOnDelivery => PaymentStatus::PendingDelivery,
            Self::Card | Self::MobileMoney | Self::BankTransfer => PaymentStatus::Pending,
        }
    }

    /// The wire/database name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::MobileMoney => "mobile_money",
            Self::BankTransfer => "bank_transfer",
            Self::CashOnDelivery => "cash_on_delivery",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "mobile_money" => Ok(Self::MobileMoney),
            "bank_transfer" => Ok(Self::BankTransfer),
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            _ => Err(UnknownVariant::new("payment method", s)),
        }
    }
}

/// Settlement state of an order's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    PendingDelivery,
    Paid,
}

/// Whether a meal plan is still delivering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "meal_plan_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum MealPlanStatus {
    #[default]
    Active,
    Cancelled,
}

/// How often a meal plan delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "plan_frequency", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PlanFrequency {
    #[default]
    Daily,
    Weekly,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_on_delivery_starts_pending_delivery() {
        let method = PaymentMethod::CashOnDelivery;
        assert_eq!(method.initial_order_status(), OrderStatus::PendingDelivery);
        assert_eq!(
            method.initial_payment_status(),
            PaymentStatus::PendingDelivery
        );
    }

    #[test]
    fn test_prepaid_methods_start_pending() {
        for method in [
            PaymentMethod::Card,
            PaymentMethod::MobileMoney,
            PaymentMethod::BankTransfer,
        ] {
            assert_eq!(method.initial_order_status(), OrderStatus::Pending);
            assert_eq!(method.initial_payment_status(), PaymentStatus::Pending);
        }
    }

    #[test]
    fn test_only_bank_transfer_requires_proof() {
        assert!(PaymentMethod::BankTransfer.requires_proof());
        assert!(!PaymentMethod::MobileMoney.requires_proof());
        assert!(!PaymentMethod::CashOnDelivery.requires_proof());
    }

    #[test]
    fn test_order_status_parse_matches_serde() {
        for status in OrderStatus::ALL {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!(
            "mobile_money".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::MobileMoney
        );
        let err = "cheque".parse::<PaymentMethod>().unwrap_err();
        assert_eq!(err.to_string(), "invalid payment method: cheque");
    }
}
