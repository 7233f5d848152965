//! Menu management.
//!
//! New dishes arrive as multipart forms so their images can be uploaded in
//! the same request; edits are plain JSON and never touch the images.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::instrument;

use sage_kitchen_core::catalog::{
    CatalogQuery, Category, NewProduct, Product, ProductError, ProductFields,
};
use sage_kitchen_core::gateway::FileStore;
use sage_kitchen_core::upload::{ObjectKey, UploadedFile};
use sage_kitchen_core::{Price, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Raw fields of the new-product form.
#[derive(Debug, Default)]
struct ProductForm {
    name: String,
    description: Option<String>,
    price: Option<String>,
    category: Option<String>,
    is_promoted: bool,
    discount_percentage: Option<String>,
    images: Vec<UploadedFile>,
}

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("invalid form data: {}", err.body_text()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

async fn read_form(mut multipart: Multipart) -> Result<ProductForm> {
    let mut form = ProductForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("images") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if !file_name.is_empty() || !bytes.is_empty() {
                    form.images.push(UploadedFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            Some(key) => {
                let value = field.text().await.map_err(bad_multipart)?;
                match key {
                    "name" => form.name = value,
                    "description" => form.description = Some(value),
                    "price" => form.price = Some(value),
                    "category" => form.category = Some(value),
                    "is_promoted" => {
                        form.is_promoted = matches!(value.trim(), "true" | "on" | "1");
                    }
                    "discount_percentage" => form.discount_percentage = Some(value),
                    _ => {}
                }
            }
            None => {}
        }
    }
    Ok(form)
}

impl ProductForm {
    fn fields(&mut self) -> Result<ProductFields> {
        let price = non_blank(self.price.take()).ok_or(ProductError::MissingField("price"))?;
        let category =
            non_blank(self.category.take()).ok_or(ProductError::MissingField("category"))?;
        let discount_percentage = non_blank(self.discount_percentage.take())
            .map(|d| {
                Decimal::from_str(&d)
                    .map_err(|_| AppError::BadRequest(format!("invalid discount: {d}")))
            })
            .transpose()?;

        let fields = ProductFields {
            name: std::mem::take(&mut self.name),
            description: self.description.take(),
            price: Price::from_str(&price)?,
            category: Category::from_str(&category)?,
            is_promoted: self.is_promoted,
            discount_percentage,
        };
        Ok(fields.validate()?)
    }
}

/// Best-effort removal of images uploaded for a product that was not saved.
async fn discard_images(files: &dyn FileStore, keys: &[ObjectKey]) {
    for key in keys {
        if let Err(e) = files.remove(key).await {
            tracing::warn!(%key, error = %e, "Failed to remove orphaned product image");
        }
    }
}

/// The whole menu, newest first.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    let products = state
        .gateways()
        .catalog
        .list_products(&CatalogQuery::default())
        .await?;
    Ok(Json(products))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    state
        .gateways()
        .catalog
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("product".to_string()))
}

/// Create a dish from a multipart form with one or more `images`.
///
/// Images are uploaded first; if any upload or the insert fails, the images
/// already stored are removed again.
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Product>)> {
    let mut form = read_form(multipart).await?;
    let fields = form.fields()?;
    if form.images.is_empty() {
        return Err(ProductError::MissingField("images").into());
    }

    let now = Utc::now();
    let keys = form
        .images
        .iter()
        .map(|file| ObjectKey::product_image(file, now))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let files = state.gateways().files.as_ref();
    let mut uploaded = Vec::with_capacity(keys.len());
    let mut urls = Vec::with_capacity(keys.len());
    for (key, file) in keys.into_iter().zip(form.images) {
        let content_type = file.content_type();
        match files.put(&key, &content_type, file.bytes).await {
            Ok(url) => {
                urls.push(url);
                uploaded.push(key);
            }
            Err(e) => {
                discard_images(files, &uploaded).await;
                return Err(e.into());
            }
        }
    }

    let product = NewProduct::new(fields, urls)?;
    match state.gateways().catalog_writer.create_product(product).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, name = %product.name, "Product added");
            Ok((StatusCode::CREATED, Json(product)))
        }
        Err(e) => {
            discard_images(files, &uploaded).await;
            Err(e.into())
        }
    }
}

/// Replace a dish's editable fields.
#[instrument(skip(state, admin, fields), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(fields): Json<ProductFields>,
) -> Result<Json<Product>> {
    let fields = fields.validate()?;
    let product = state
        .gateways()
        .catalog_writer
        .update_product(id, fields)
        .await?;
    Ok(Json(product))
}

/// Remove a dish from the menu.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state.gateways().catalog_writer.delete_product(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
