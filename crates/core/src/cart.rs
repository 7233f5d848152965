//! The cart ledger.
//!
//! A [`CartLedger`] is the set of dishes a shopper intends to buy plus their
//! running total. It is plain synchronous state: the storefront keeps one per
//! session, loads it at the start of a cart request, mutates it, and writes it
//! back. Checkout turns it into an [`OrderDraft`](crate::order::OrderDraft)
//! and clears it once the order is stored.
//!
//! Invariants held after every operation:
//! - at most one [`LineItem`] per product id,
//! - every item has `1 <= quantity <= MAX_LINE_QUANTITY`,
//! - `total` equals the sum of `unit_price * quantity` over the items.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Most units of one dish a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Rejected cart changes.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartError {
    #[error(
        "you can order at most {max} of a dish (asked for {requested})",
        max = MAX_LINE_QUANTITY
    )]
    QuantityTooLarge { requested: i64 },
}

/// A product as offered to the cart: what `add` needs to create a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCandidate {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
}

/// One product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub name: String,
    /// Price per unit, captured when the dish was first added.
    pub unit_price: Price,
    pub quantity: u32,
    pub image: Option<String>,
}

impl LineItem {
    fn from_candidate(candidate: ProductCandidate, quantity: u32) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            unit_price: candidate.price,
            quantity,
            image: candidate.image,
        }
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// What `set_quantity` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The item now has the requested quantity.
    Updated,
    /// The requested quantity was zero or negative, so the item was removed.
    Removed,
    /// No item with that id is in the cart.
    Missing,
}

/// Session-scoped cart state.
///
/// Deserializing goes through [`LedgerSnapshot`] so a tampered or stale
/// session payload can never yield a ledger that breaks the invariants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "LedgerSnapshot")]
pub struct CartLedger {
    items: Vec<LineItem>,
    total: Price,
}

/// Wire form of a ledger. `total` is accepted but ignored.
#[derive(Deserialize)]
struct LedgerSnapshot {
    #[serde(default)]
    items: Vec<LineItem>,
}

impl From<LedgerSnapshot> for CartLedger {
    fn from(snapshot: LedgerSnapshot) -> Self {
        let mut ledger = Self::new();
        for item in snapshot.items {
            if item.quantity == 0 {
                continue;
            }
            match ledger.position(item.id) {
                Some(index) => {
                    if let Some(existing) = ledger.items.get_mut(index) {
                        existing.quantity = existing
                            .quantity
                            .saturating_add(item.quantity)
                            .min(MAX_LINE_QUANTITY);
                    }
                }
                None => ledger.items.push(LineItem {
                    quantity: item.quantity.min(MAX_LINE_QUANTITY),
                    ..item
                }),
            }
        }
        ledger.recompute();
        ledger
    }
}

impl CartLedger {
    /// An empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            total: Price::ZERO,
        }
    }

    /// Items in the order they were first added.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Sum of every line total.
    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of units across all products (the cart badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |count, item| count.saturating_add(item.quantity))
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Add one unit of a product.
    ///
    /// Increments the quantity when the product is already in the cart,
    /// otherwise appends a new line with quantity 1. The unit price of an
    /// existing line is kept. A line already at [`MAX_LINE_QUANTITY`] stays
    /// there. Returns the affected line.
    pub fn add(&mut self, candidate: ProductCandidate) -> &LineItem {
        self.increment(candidate, NonZeroU32::MIN)
    }

    /// Add `quantity` units of a product, as if `add` were called that many
    /// times.
    ///
    /// Returns `Ok(None)` and changes nothing when `quantity` is zero.
    ///
    /// # Errors
    ///
    /// Returns `CartError::QuantityTooLarge`, leaving the cart unchanged, when
    /// the line would end up above [`MAX_LINE_QUANTITY`].
    pub fn add_quantity(
        &mut self,
        candidate: ProductCandidate,
        quantity: u32,
    ) -> Result<Option<&LineItem>, CartError> {
        let Some(quantity) = NonZeroU32::new(quantity) else {
            return Ok(None);
        };
        let current = self.get(candidate.id).map_or(0, |item| item.quantity);
        let requested = current.saturating_add(quantity.get());
        if requested > MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                requested: i64::from(requested),
            });
        }
        Ok(Some(self.increment(candidate, quantity)))
    }

    /// Remove a product's line. Removing an absent product is a no-op.
    pub fn remove(&mut self, id: ProductId) -> Option<LineItem> {
        let removed = self.position(id).map(|index| self.items.remove(index));
        self.recompute();
        removed
    }

    /// Replace a product's quantity.
    ///
    /// Zero or negative quantities remove the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::QuantityTooLarge`, leaving the cart unchanged, for
    /// quantities above [`MAX_LINE_QUANTITY`].
    pub fn set_quantity(
        &mut self,
        id: ProductId,
        quantity: i64,
    ) -> Result<QuantityChange, CartError> {
        if quantity > i64::from(MAX_LINE_QUANTITY) {
            return Err(CartError::QuantityTooLarge {
                requested: quantity,
            });
        }
        let Some(index) = self.position(id) else {
            return Ok(QuantityChange::Missing);
        };

        let change = match u32::try_from(quantity) {
            Ok(quantity) if quantity > 0 => {
                if let Some(item) = self.items.get_mut(index) {
                    item.quantity = quantity;
                }
                QuantityChange::Updated
            }
            _ => {
                self.items.remove(index);
                QuantityChange::Removed
            }
        };
        self.recompute();
        Ok(change)
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total = Price::ZERO;
    }

    #[allow(clippy::indexing_slicing)] // index was just found or pushed
    fn increment(&mut self, candidate: ProductCandidate, quantity: NonZeroU32) -> &LineItem {
        let index = match self.position(candidate.id) {
            Some(index) => {
                if let Some(item) = self.items.get_mut(index) {
                    item.quantity = item
                        .quantity
                        .saturating_add(quantity.get())
                        .min(MAX_LINE_QUANTITY);
                }
                index
            }
            None => {
                let quantity = quantity.get().min(MAX_LINE_QUANTITY);
                self.items
                    .push(LineItem::from_candidate(candidate, quantity));
                self.items.len() - 1
            }
        };
        self.recompute();
        &self.items[index]
    }

    fn position(&self, id: ProductId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn recompute(&mut self) {
        self.total = self.items.iter().map(LineItem::line_total).sum();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;

    fn dish(name: &str, price: Decimal) -> ProductCandidate {
        ProductCandidate {
            id: ProductId::generate(),
            name: name.to_owned(),
            price: Price::try_new(price).unwrap(),
            image: Some(format!("/img/{name}.jpg")),
        }
    }

    fn expected_total(ledger: &CartLedger) -> Decimal {
        ledger
            .items()
            .iter()
            .map(|item| item.unit_price.amount() * Decimal::from(item.quantity))
            .sum()
    }

    #[test]
    fn test_adding_same_dish_twice_increments_quantity() {
        let mut ledger = CartLedger::new();
        let p1 = dish("ramen", dec!(10.00));

        ledger.add(p1.clone());
        let line = ledger.add(p1.clone());
        assert_eq!(line.quantity, 2);

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.items()[0].id, p1.id);
        assert_eq!(ledger.items()[0].quantity, 2);
        assert_eq!(ledger.total().amount(), dec!(20.00));
    }

    #[test]
    fn test_remove_recomputes_total() {
        let mut ledger = CartLedger::new();
        let p1 = dish("lasagna", dec!(10.00));
        let p2 = dish("salad", dec!(5.00));

        ledger.add(p1.clone());
        ledger.add(p2.clone());
        let removed = ledger.remove(p1.id).unwrap();
        assert_eq!(removed.name, "lasagna");

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.items()[0].id, p2.id);
        assert_eq!(ledger.items()[0].quantity, 1);
        assert_eq!(ledger.total().amount(), dec!(5.00));
    }

    #[test]
    fn test_set_quantity_zero_removes_item() {
        let mut ledger = CartLedger::new();
        let p1 = dish("burger", dec!(12.50));
        let p2 = dish("fries", dec!(3.00));
        ledger.add(p1.clone());
        ledger.add(p2);

        assert_eq!(ledger.set_quantity(p1.id, 0), Ok(QuantityChange::Removed));
        assert!(ledger.get(p1.id).is_none());
        assert_eq!(ledger.total().amount(), dec!(3.00));
    }

    #[test]
    fn test_set_quantity_negative_removes_item() {
        let mut ledger = CartLedger::new();
        let p1 = dish("sushi", dec!(8.00));
        ledger.add(p1.clone());

        assert_eq!(ledger.set_quantity(p1.id, -3), Ok(QuantityChange::Removed));
        assert!(ledger.is_empty());
        assert!(ledger.total().is_zero());
    }

    #[test]
    fn test_set_quantity_replaces_quantity() {
        let mut ledger = CartLedger::new();
        let p1 = dish("pizza", dec!(9.99));
        ledger.add(p1.clone());

        assert_eq!(ledger.set_quantity(p1.id, 4), Ok(QuantityChange::Updated));
        assert_eq!(ledger.get(p1.id).unwrap().quantity, 4);
        assert_eq!(ledger.total().amount(), dec!(39.96));
    }

    #[test]
    fn test_set_quantity_on_absent_item_is_noop() {
        let mut ledger = CartLedger::new();
        ledger.add(dish("poke", dec!(11.00)));
        let before = ledger.clone();

        assert_eq!(
            ledger.set_quantity(ProductId::generate(), 3),
            Ok(QuantityChange::Missing)
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_clear_after_two_items() {
        let mut ledger = CartLedger::new();
        ledger.add(dish("tacos", dec!(7.25)));
        ledger.add(dish("nachos", dec!(6.75)));

        ledger.clear();
        assert!(ledger.items().is_empty());
        assert!(ledger.total().is_zero());
        assert_eq!(ledger, CartLedger::new());
    }

    #[test]
    fn test_remove_absent_is_idempotent() {
        let mut ledger = CartLedger::new();
        let p1 = dish("gyoza", dec!(4.50));
        ledger.add(p1.clone());
        ledger.remove(p1.id);
        let before = ledger.clone();

        assert!(ledger.remove(p1.id).is_none());
        assert!(ledger.remove(ProductId::generate()).is_none());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_existing_line_keeps_first_price() {
        let mut ledger = CartLedger::new();
        let mut p1 = dish("risotto", dec!(14.00));
        ledger.add(p1.clone());

        p1.price = Price::try_new(dec!(99.00)).unwrap();
        ledger.add(p1.clone());

        assert_eq!(ledger.get(p1.id).unwrap().unit_price.amount(), dec!(14.00));
        assert_eq!(ledger.total().amount(), dec!(28.00));
    }

    #[test]
    fn test_add_quantity() {
        let mut ledger = CartLedger::new();
        let p1 = dish("bibimbap", dec!(10.50));

        assert!(ledger.add_quantity(p1.clone(), 0).unwrap().is_none());
        assert!(ledger.is_empty());

        assert_eq!(
            ledger.add_quantity(p1.clone(), 3).unwrap().unwrap().quantity,
            3
        );
        ledger.add(p1.clone());
        assert_eq!(ledger.item_count(), 4);
        assert_eq!(ledger.total().amount(), dec!(42.00));
    }

    #[test]
    fn test_item_count_sums_quantities() {
        let mut ledger = CartLedger::new();
        let p1 = dish("soup", dec!(5.00));
        let p2 = dish("bread", dec!(2.00));
        ledger.add(p1.clone());
        ledger.add(p1);
        ledger.add(p2);

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.item_count(), 3);
    }

    #[test]
    fn test_random_sequences_keep_total_exact() {
        let menu: Vec<ProductCandidate> = [
            dec!(0.10),
            dec!(0.20),
            dec!(3.33),
            dec!(9.99),
            dec!(12.00),
            dec!(0.00),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, price)| dish(&format!("dish-{i}"), price))
        .collect();

        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut ledger = CartLedger::new();

            for _ in 0..200 {
                let candidate = &menu[rng.random_range(0..menu.len())];
                match rng.random_range(0..4) {
                    0 | 1 => {
                        let before = ledger.get(candidate.id).map_or(0, |item| item.quantity);
                        let after = ledger.add(candidate.clone()).quantity;
                        assert_eq!(after, (before + 1).min(MAX_LINE_QUANTITY));
                    }
                    2 => {
                        ledger.remove(candidate.id);
                        assert!(ledger.get(candidate.id).is_none());
                    }
                    _ => {
                        let quantity = rng.random_range(-2..6_i64);
                        ledger.set_quantity(candidate.id, quantity).unwrap();
                    }
                }

                assert_eq!(ledger.total().amount(), expected_total(&ledger));
                assert!(
                    ledger
                        .items()
                        .iter()
                        .all(|item| (1..=MAX_LINE_QUANTITY).contains(&item.quantity))
                );
                let mut ids: Vec<_> = ledger.items().iter().map(|item| item.id).collect();
                ids.sort();
                ids.dedup();
                assert_eq!(ids.len(), ledger.len());
            }
        }
    }

    #[test]
    fn test_serde_round_trip_through_session() {
        let mut ledger = CartLedger::new();
        ledger.add(dish("curry", dec!(13.40)));
        ledger.add(dish("naan", dec!(2.10)));

        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json["total"], "15.50");
        let restored: CartLedger = serde_json::from_value(json).unwrap();
        assert_eq!(restored, ledger);
    }

    #[test]
    fn test_deserialize_repairs_tampered_snapshot() {
        let id = ProductId::generate();
        let other = ProductId::generate();
        let json = serde_json::json!({
            "items": [
                {"id": id, "name": "udon", "unit_price": "6.00", "quantity": 1, "image": null},
                {"id": other, "name": "tea", "unit_price": "1.50", "quantity": 0, "image": null},
                {"id": id, "name": "udon", "unit_price": "6.00", "quantity": 2, "image": null}
            ],
            "total": "1000.00"
        });

        let ledger: CartLedger = serde_json::from_value(json).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(id).unwrap().quantity, 3);
        assert!(ledger.get(other).is_none());
        assert_eq!(ledger.total().amount(), dec!(18.00));
    }

    #[test]
    fn test_set_quantity_above_limit_is_rejected() {
        let mut ledger = CartLedger::new();
        let p1 = dish("lasagna", dec!(12.00));
        ledger.add(p1.clone());
        let before = ledger.clone();

        assert_eq!(
            ledger.set_quantity(p1.id, 10_000_000_000),
            Err(CartError::QuantityTooLarge {
                requested: 10_000_000_000
            })
        );
        assert_eq!(ledger, before);
        assert_eq!(
            ledger.set_quantity(p1.id, i64::from(MAX_LINE_QUANTITY)),
            Ok(QuantityChange::Updated)
        );
        assert_eq!(ledger.total().amount(), dec!(1188.00));
    }

    #[test]
    fn test_add_quantity_past_limit_is_rejected() {
        let mut ledger = CartLedger::new();
        let p1 = dish("gnocchi", dec!(11.00));
        ledger.add_quantity(p1.clone(), MAX_LINE_QUANTITY - 1).unwrap();

        assert_eq!(
            ledger.add_quantity(p1.clone(), 2),
            Err(CartError::QuantityTooLarge { requested: 100 })
        );
        assert_eq!(ledger.get(p1.id).unwrap().quantity, MAX_LINE_QUANTITY - 1);
        assert!(ledger.add_quantity(p1.clone(), u32::MAX).is_err());
    }

    #[test]
    fn test_add_stops_at_limit() {
        let mut ledger = CartLedger::new();
        let p1 = dish("ramen", dec!(14.00));
        ledger.add_quantity(p1.clone(), MAX_LINE_QUANTITY).unwrap();

        assert_eq!(ledger.add(p1).quantity, MAX_LINE_QUANTITY);
        assert_eq!(ledger.total().amount(), dec!(1386.00));
    }

    #[test]
    fn test_deserialize_caps_oversized_quantity() {
        let id = ProductId::generate();
        let json = serde_json::json!({
            "items": [
                {"id": id, "name": "pho", "unit_price": "12.00", "quantity": u32::MAX, "image": null}
            ]
        });

        let ledger: CartLedger = serde_json::from_value(json).unwrap();
        assert_eq!(ledger.get(id).unwrap().quantity, MAX_LINE_QUANTITY);
        assert_eq!(ledger.total().amount(), dec!(1188.00));
    }
}
