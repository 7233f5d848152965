//! Checkout service.
//!
//! Converts the session's [`CartLedger`] into a stored order:
//!
//! 1. Build the [`OrderDraft`] (rejects an empty cart)
//! 2. Require a proof of payment for bank transfers and derive its key
//! 3. Upload the proof
//! 4. Write the order and its lines in one `place_order` call
//! 5. Clear the ledger
//!
//! When step 4 fails the uploaded proof is removed again and the ledger is
//! left as it was.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use sage_kitchen_core::gateway::{FileStore, GatewayError, OrderWriter};
use sage_kitchen_core::order::{OrderDraft, OrderError};
use sage_kitchen_core::upload::{ObjectKey, UploadError, UploadedFile};
use sage_kitchen_core::{AddressId, CartLedger, OrderId, PaymentMethod, UserId};

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Payment details submitted with an order.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    /// Proof of payment. Only stored for bank transfers.
    pub proof: Option<UploadedFile>,
    pub delivery_address_id: Option<AddressId>,
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub payment_method: PaymentMethod,
    pub payment_proof_url: Option<String>,
}

impl PlacedOrder {
    /// Confirmation shown to the customer.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self.payment_method {
            PaymentMethod::CashOnDelivery => {
                "Thank you for your order! You can pay when your order arrives."
            }
            PaymentMethod::Card | PaymentMethod::MobileMoney | PaymentMethod::BankTransfer => {
                "Thank you for your order! You can track it in your orders page."
            }
        }
    }
}

/// Places orders through the order and file gateways.
#[derive(Clone)]
pub struct CheckoutService {
    orders: Arc<dyn OrderWriter>,
    files: Arc<dyn FileStore>,
}

impl CheckoutService {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderWriter>, files: Arc<dyn FileStore>) -> Self {
        Self { orders, files }
    }

    /// Place an order for everything in `ledger`.
    ///
    /// On success the ledger is cleared. On any error it is untouched.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::Order` for an empty cart or a bank transfer without proof
    /// - `CheckoutError::Upload` for an empty proof or an unsupported file type
    /// - `CheckoutError::Gateway` if the upload or the order write fails
    #[instrument(skip(self, ledger, request), fields(method = %request.method, lines = ledger.len()))]
    pub async fn place_order(
        &self,
        ledger: &mut CartLedger,
        user_id: UserId,
        request: PaymentRequest,
    ) -> Result<PlacedOrder, CheckoutError> {
        let draft = OrderDraft::from_ledger(
            ledger,
            user_id,
            request.method,
            request.delivery_address_id,
        )?;

        let proof = if request.method.requires_proof() {
            let file = request
                .proof
                .ok_or(OrderError::ProofRequired(request.method))?;
            let key = ObjectKey::payment_proof(user_id, &file)?;
            Some((key, file))
        } else {
            None
        };

        let (draft, uploaded_key) = match proof {
            Some((key, file)) => {
                let url = self
                    .files
                    .put(&key, &file.content_type(), file.bytes)
                    .await?;
                tracing::debug!(%key, "Payment proof uploaded");
                (draft.with_payment_proof(url), Some(key))
            }
            None => (draft, None),
        };

        let order_id = match self.orders.place_order(&draft).await {
            Ok(id) => id,
            Err(err) => {
                if let Some(key) = &uploaded_key {
                    self.discard_proof(key).await;
                }
                return Err(err.into());
            }
        };

        ledger.clear();
        tracing::info!(%order_id, total = %draft.total, "Checkout complete");

        Ok(PlacedOrder {
            order_id,
            payment_method: draft.payment_method,
            payment_proof_url: draft.payment_proof_url,
        })
    }

    async fn discard_proof(&self, key: &ObjectKey) {
        match self.files.remove(key).await {
            Ok(()) => tracing::info!(%key, "Removed payment proof of failed order"),
            Err(e) => tracing::warn!(%key, error = %e, "Failed to remove orphaned payment proof"),
        }
    }
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService").finish_non_exhaustive()
    }
}
