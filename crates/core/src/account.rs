//! Customer-owned records: identity, profile, delivery addresses, meal plans.

use core::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{AddressId, Email, MealPlanId, MealPlanStatus, PlanFrequency, ProductId, UserId};

/// Errors from validating customer input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("delivery time must be HH:MM")]
    InvalidDeliveryTime,
}

/// The signed-in user, as stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: Email,
}

/// A plaintext password on its way to be hashed or verified.
///
/// `Debug` never prints the value.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub const MIN_LENGTH: usize = 8;

    /// Accept a new password for sign-up.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::PasswordTooShort` below eight characters.
    pub fn new(raw: impl Into<String>) -> Result<Self, AccountError> {
        let raw = raw.into();
        if raw.chars().count() < Self::MIN_LENGTH {
            return Err(AccountError::PasswordTooShort {
                min: Self::MIN_LENGTH,
            });
        }
        Ok(Self(raw))
    }

    /// Wrap a password typed at sign-in. No length rule applies.
    #[must_use]
    pub fn for_sign_in(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// Sign-up request.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: Email,
    pub password: Password,
    pub full_name: Option<String>,
}

/// Public profile of a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Blank strings become `None` so clearing a form field clears the value.
    #[must_use]
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        }
        Self {
            username: clean(self.username),
            full_name: clean(self.full_name),
            phone: clean(self.phone),
            address: clean(self.address),
            avatar_url: clean(self.avatar_url),
        }
    }
}

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub id: AddressId,
    pub user_id: UserId,
    pub address: String,
    pub phone: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Pick the address checkout starts with: the default, else the first.
#[must_use]
pub fn preselect_address(addresses: &[DeliveryAddress]) -> Option<&DeliveryAddress> {
    addresses
        .iter()
        .find(|a| a.is_default)
        .or_else(|| addresses.first())
}

/// A delivery address to save.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewAddress {
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub is_default: bool,
}

impl NewAddress {
    /// # Errors
    ///
    /// Returns `AccountError::MissingField` when the address or phone is blank.
    pub fn validate(self) -> Result<Self, AccountError> {
        let address = self.address.trim().to_owned();
        let phone = self.phone.trim().to_owned();
        if address.is_empty() {
            return Err(AccountError::MissingField("address"));
        }
        if phone.is_empty() {
            return Err(AccountError::MissingField("phone"));
        }
        Ok(Self {
            address,
            phone,
            is_default: self.is_default,
        })
    }
}

/// A recurring delivery of one dish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: MealPlanId,
    pub user_id: UserId,
    pub meal_id: ProductId,
    pub delivery_time: NaiveTime,
    pub frequency: PlanFrequency,
    pub status: MealPlanStatus,
    pub created_at: DateTime<Utc>,
}

/// A meal plan joined with its dish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlanWithProduct {
    #[serde(flatten)]
    pub plan: MealPlan,
    pub product: Option<Product>,
}

/// A meal plan to create. New plans are daily and active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMealPlan {
    pub meal_id: ProductId,
    pub delivery_time: NaiveTime,
}

impl NewMealPlan {
    /// Delivery time used when none is chosen: noon.
    #[must_use]
    pub fn default_delivery_time() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
    }

    /// # Errors
    ///
    /// Returns `AccountError::InvalidDeliveryTime` unless `delivery_time` is
    /// `HH:MM` (or `HH:MM:SS`).
    pub fn new(meal_id: ProductId, delivery_time: Option<&str>) -> Result<Self, AccountError> {
        let delivery_time = match delivery_time.map(str::trim) {
            None | Some("") => Self::default_delivery_time(),
            Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
                .map_err(|_| AccountError::InvalidDeliveryTime)?,
        };
        Ok(Self {
            meal_id,
            delivery_time,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn address(is_default: bool) -> DeliveryAddress {
        DeliveryAddress {
            id: AddressId::generate(),
            user_id: UserId::generate(),
            address: "1 Sage St".to_owned(),
            phone: "555-0100".to_owned(),
            is_default,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_length() {
        assert_eq!(
            Password::new("short").unwrap_err(),
            AccountError::PasswordTooShort { min: 8 }
        );
        assert_eq!(Password::new("long enough").unwrap().expose(), "long enough");
        assert_eq!(format!("{:?}", Password::for_sign_in("x")), "Password([REDACTED])");
    }

    #[test]
    fn test_preselect_prefers_default() {
        let list = vec![address(false), address(true)];
        assert_eq!(preselect_address(&list).unwrap().id, list[1].id);
        let list = vec![address(false), address(false)];
        assert_eq!(preselect_address(&list).unwrap().id, list[0].id);
        assert!(preselect_address(&[]).is_none());
    }

    #[test]
    fn test_new_address_requires_both_fields() {
        let input = NewAddress {
            address: "  ".to_owned(),
            phone: "555".to_owned(),
            is_default: false,
        };
        assert_eq!(input.validate(), Err(AccountError::MissingField("address")));

        let input = NewAddress {
            address: " 2 Basil Rd ".to_owned(),
            phone: "".to_owned(),
            is_default: true,
        };
        assert_eq!(input.validate(), Err(AccountError::MissingField("phone")));
    }

    #[test]
    fn test_meal_plan_delivery_time() {
        let meal = ProductId::generate();
        assert_eq!(
            NewMealPlan::new(meal, None).unwrap().delivery_time,
            NaiveTime::from_hms_opt(12, 0, 0).unwrap()
        );
        assert_eq!(
            NewMealPlan::new(meal, Some("18:30")).unwrap().delivery_time,
            NaiveTime::from_hms_opt(18, 30, 0).unwrap()
        );
        assert_eq!(
            NewMealPlan::new(meal, Some("dinner")),
            Err(AccountError::InvalidDeliveryTime)
        );
    }

    #[test]
    fn test_profile_normalized() {
        let profile = Profile {
            username: Some(" chef ".to_owned()),
            phone: Some(String::new()),
            ..Profile::default()
        }
        .normalized();
        assert_eq!(profile.username.as_deref(), Some("chef"));
        assert_eq!(profile.phone, None);
    }
}
