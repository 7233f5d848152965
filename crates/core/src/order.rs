//! Turning a cart into an order.
//!
//! An [`OrderDraft`] is what the storefront hands to
//! [`OrderWriter::place_order`](crate::gateway::OrderWriter::place_order): one
//! order header plus one line per cart item. Unit prices are copied out of the
//! ledger, so later catalog edits never change what a placed order cost.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartLedger;
use crate::types::{
    AddressId, OrderId, OrderStatus, PaymentMethod, PaymentStatus, Price, ProductId, UserId,
};

/// Errors raised while building an order from a cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("your cart is empty")]
    EmptyCart,
    #[error("a proof of payment is required for {0}")]
    ProofRequired(PaymentMethod),
    #[error("order total {0} is above the limit of {max}", max = Price::MAX)]
    TotalTooLarge(Price),
}

/// One line of an order that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineDraft {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    /// Unit price at the moment the order was placed.
    pub unit_price: Price,
}

/// An order ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub user_id: UserId,
    pub lines: Vec<OrderLineDraft>,
    pub total: Price,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_proof_url: Option<String>,
    pub delivery_address_id: Option<AddressId>,
}

impl OrderDraft {
    /// Transcribe a ledger into a draft.
    ///
    /// The initial order and payment status follow the payment method: cash
    /// on delivery starts as `pending_delivery`, everything else as
    /// `pending`.
    ///
    /// # Errors
    ///
    /// - `OrderError::EmptyCart` if the ledger has no items
    /// - `OrderError::TotalTooLarge` if the total does not fit [`Price::MAX`]
    pub fn from_ledger(
        ledger: &CartLedger,
        user_id: UserId,
        payment_method: PaymentMethod,
        delivery_address_id: Option<AddressId>,
    ) -> Result<Self, OrderError> {
        if ledger.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        if !ledger.total().is_storable() {
            return Err(OrderError::TotalTooLarge(ledger.total()));
        }

        let lines = ledger
            .items()
            .iter()
            .map(|item| OrderLineDraft {
                product_id: item.id,
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();

        Ok(Self {
            user_id,
            lines,
            total: ledger.total(),
            status: payment_method.initial_order_status(),
            payment_method,
            payment_status: payment_method.initial_payment_status(),
            payment_proof_url: None,
            delivery_address_id,
        })
    }

    /// Attach the public URL of an uploaded proof of payment.
    #[must_use]
    pub fn with_payment_proof(mut self, url: impl Into<String>) -> Self {
        self.payment_proof_url = Some(url.into());
        self
    }
}

/// A stored order line as shown in order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
}

impl OrderLine {
    /// `"Name (qty)"`, the way order lists summarize a line.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.quantity)
    }
}

/// A stored order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub user_id: UserId,
    /// Customer's full name, filled in for admin listings.
    pub customer_name: Option<String>,
    pub total: Price,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_proof_url: Option<String>,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

impl OrderSummary {
    /// Comma-separated line labels, e.g. `"Ramen (2), Gyoza (1)"`.
    #[must_use]
    pub fn items_label(&self) -> String {
        self.lines
            .iter()
            .map(OrderLine::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
