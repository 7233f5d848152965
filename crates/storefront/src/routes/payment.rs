//! Payment: the final checkout step.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use sage_kitchen_core::upload::UploadedFile;
use sage_kitchen_core::{CartLedger, OrderId, PaymentMethod};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::session::{checkout_address, load_cart, save_cart};
use crate::services::PaymentRequest;
use crate::state::AppState;

/// Response after placing an order.
#[derive(Debug, Serialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub payment_method: PaymentMethod,
    pub message: &'static str,
}

/// Fields of the payment form.
#[derive(Debug, Default)]
struct PaymentForm {
    payment_method: Option<String>,
    proof: Option<UploadedFile>,
}

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("invalid form data: {}", err.body_text()))
}

async fn read_form(mut multipart: Multipart) -> Result<PaymentForm> {
    let mut form = PaymentForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("payment_method") => {
                form.payment_method = Some(field.text().await.map_err(bad_multipart)?);
            }
            Some("proof") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() || !bytes.is_empty() {
                    form.proof = Some(UploadedFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Place the order for the session cart.
///
/// Multipart fields: `payment_method` and, for bank transfers, `proof`.
#[instrument(skip(state, session, user, multipart), fields(user_id = %user.id))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<(StatusCode, Json<OrderPlaced>)> {
    let form = read_form(multipart).await?;
    let method: PaymentMethod = form
        .payment_method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::BadRequest("Please choose a payment method".to_string()))?
        .parse()?;

    let mut cart = load_cart(&session).await?;
    let request = PaymentRequest {
        method,
        proof: form.proof,
        delivery_address_id: checkout_address(&session).await?,
    };
    let placed = state
        .checkout()
        .place_order(&mut cart, user.id, request)
        .await?;

    // The order is committed; a session failure must not report it as failed.
    if let Err(e) = persist_cleared_cart(&session, &cart).await {
        tracing::error!(
            order_id = %placed.order_id,
            error = %e,
            "Order placed but the cart could not be cleared from the session"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(OrderPlaced {
            order_id: placed.order_id,
            payment_method: placed.payment_method,
            message: placed.message(),
        }),
    ))
}

async fn persist_cleared_cart(
    session: &Session,
    cart: &CartLedger,
) -> std::result::Result<(), tower_sessions::session::Error> {
    save_cart(session, cart).await?;
    session.save().await
}
