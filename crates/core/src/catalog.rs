//! Menu items and catalog queries.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::ProductCandidate;
use crate::types::{Price, ProductId, UnknownVariant};

/// Image shown when a product has none.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Menu categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Italian,
    American,
    Japanese,
    Healthy,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Italian, Self::American, Self::Japanese, Self::Healthy];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Italian => "Italian",
            Self::American => "American",
            Self::Japanese => "Japanese",
            Self::Healthy => "Healthy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant::new("category", s))
    }
}

/// A dish on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub category: Category,
    pub images: Vec<String>,
    pub is_promoted: bool,
    pub discount_percentage: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// First image, or the placeholder.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or(PLACEHOLDER_IMAGE, String::as_str)
    }

    /// What the cart needs to add this dish.
    #[must_use]
    pub fn to_candidate(&self) -> ProductCandidate {
        ProductCandidate {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            image: Some(self.primary_image().to_owned()),
        }
    }
}

/// Filters for listing the menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogQuery {
    /// `None` lists every category.
    pub category: Option<Category>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
}

impl CatalogQuery {
    /// Build a query from raw request parameters.
    ///
    /// `"All"` or an empty category means no category filter; a blank search
    /// means no name filter.
    ///
    /// # Errors
    ///
    /// Returns `UnknownVariant` for a category that is not on the menu.
    pub fn from_params(category: Option<&str>, search: Option<&str>) -> Result<Self, UnknownVariant> {
        let category = match category.map(str::trim) {
            None | Some("") => None,
            Some(c) if c.eq_ignore_ascii_case("all") => None,
            Some(c) => Some(c.parse()?),
        };
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned);
        Ok(Self { category, search })
    }

    /// Whether `product` passes this filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = self.category.is_none_or(|c| c == product.category);
        let search_ok = self.search.as_deref().is_none_or(|needle| {
            product
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        category_ok && search_ok
    }
}

/// Errors from validating product input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    #[error("please fill in all required fields: {0}")]
    MissingField(&'static str),
    #[error("discount must be between 0 and 100")]
    DiscountOutOfRange,
}

/// Editable product fields shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    pub category: Category,
    #[serde(default)]
    pub is_promoted: bool,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
}

impl ProductFields {
    /// Trim text fields and check required values.
    ///
    /// # Errors
    ///
    /// Returns `ProductError` when the name is blank or the discount is
    /// outside `0..=100`.
    pub fn validate(mut self) -> Result<Self, ProductError> {
        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            return Err(ProductError::MissingField("name"));
        }
        self.description = self
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());
        if let Some(discount) = self.discount_percentage
            && !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&discount)
        {
            return Err(ProductError::DiscountOutOfRange);
        }
        Ok(self)
    }
}

/// A product to create. At least one image is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub fields: ProductFields,
    pub images: Vec<String>,
}

impl NewProduct {
    /// # Errors
    ///
    /// Returns `ProductError` when a field is invalid or no image is given.
    pub fn new(fields: ProductFields, images: Vec<String>) -> Result<Self, ProductError> {
        let fields = fields.validate()?;
        if images.is_empty() {
            return Err(ProductError::MissingField("images"));
        }
        Ok(Self { fields, images })
    }
}
