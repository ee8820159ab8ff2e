//! The shopping cart: line items persisted under [`CART_KEY`] after every
//! mutation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, ValidationError};
use crate::store::KeyValueStore;

pub const CART_KEY: &str = "cart";

/// Upper bound on units or strips for a single line.
pub const MAX_QUANTITY_PER_ITEM: u32 = 999;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Product id. One line per product.
    pub id: String,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    pub quantity: u32,
    /// Package multiplier, e.g. strips of ten tablets. Never below 1.
    #[serde(default = "default_strip_quantity")]
    pub strip_quantity: u32,
    #[serde(default)]
    pub prescription_required: bool,
}

fn default_strip_quantity() -> u32 {
    1
}

impl CartLineItem {
    /// A single unit, one strip, no discount.
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            discount_price: None,
            quantity: 1,
            strip_quantity: 1,
            prescription_required: false,
        }
    }

    #[must_use]
    pub fn with_discount_price(mut self, price: Decimal) -> Self {
        self.discount_price = Some(price);
        self
    }

    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub fn with_strip_quantity(mut self, strips: u32) -> Self {
        self.strip_quantity = strips.max(1);
        self
    }

    #[must_use]
    pub fn prescription_required(mut self, required: bool) -> Self {
        self.prescription_required = required;
        self
    }

    /// The discount price when one is set, otherwise the unit price.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.unit_price)
    }

    /// `effective_price x quantity x strip_quantity`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::AmountOutOfRange`] if the product does not
    /// fit in a `Decimal`.
    pub fn line_total(&self) -> Result<Decimal, ValidationError> {
        self.effective_price()
            .checked_mul(Decimal::from(self.quantity))
            .and_then(|t| t.checked_mul(Decimal::from(self.strip_quantity)))
            .ok_or(ValidationError::AmountOutOfRange)
    }
}

/// Cart state backed by a [`KeyValueStore`].
///
/// Mutations are written to the store before they are applied in memory, so
/// a failed write leaves both unchanged.
pub struct CartStore<S> {
    store: S,
    items: Vec<CartLineItem>,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Loads the persisted cart, or starts empty when none is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the stored cart cannot be read or decoded.
    pub fn load(store: S) -> Result<Self, StoreError> {
        let items: Vec<CartLineItem> = store.get(CART_KEY)?.unwrap_or_default();
        tracing::debug!(lines = items.len(), "cart loaded");
        Ok(Self { store, items })
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Adds `item`. A product already in the cart gets its quantity bumped
    /// by `item.quantity` instead of a second line.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be persisted.
    pub fn add_item(&mut self, item: CartLineItem) -> Result<(), StoreError> {
        let added = item.quantity.max(1);
        let mut items = self.items.clone();
        if let Some(existing) = items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing
                .quantity
                .saturating_add(added)
                .min(MAX_QUANTITY_PER_ITEM);
            tracing::debug!(id = %existing.id, quantity = existing.quantity, "cart: quantity increased");
        } else {
            let mut item = item;
            item.quantity = added.min(MAX_QUANTITY_PER_ITEM);
            item.strip_quantity = item.strip_quantity.clamp(1, MAX_QUANTITY_PER_ITEM);
            tracing::debug!(id = %item.id, "cart: line added");
            items.push(item);
        }
        self.commit(items)
    }

    /// Sets the unit count of a line. Zero or less removes the line.
    /// Returns `false` when `id` is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be persisted.
    pub fn set_quantity(&mut self, id: &str, quantity: i64) -> Result<bool, StoreError> {
        if quantity <= 0 {
            return self.remove_item(id);
        }
        self.update_line(id, |item| item.quantity = clamp_count(quantity))
    }

    /// Sets the strip multiplier of a line. Values below 1 are raised to 1.
    /// Returns `false` when `id` is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be persisted.
    pub fn set_strip_quantity(&mut self, id: &str, strips: i64) -> Result<bool, StoreError> {
        self.update_line(id, |item| item.strip_quantity = clamp_count(strips.max(1)))
    }

    /// Removes the line for `id`. Absent ids are a no-op returning `false`
    /// and do not touch the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be persisted.
    pub fn remove_item(&mut self, id: &str) -> Result<bool, StoreError> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        let items = self.items.iter().filter(|i| i.id != id).cloned().collect();
        self.commit(items)?;
        tracing::debug!(id, "cart: line removed");
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be persisted.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.commit(Vec::new())
    }

    /// Total units across lines, ignoring strips.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of all line totals.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::AmountOutOfRange`] if a line total or the
    /// sum overflows, which only happens with absurd prices.
    pub fn subtotal(&self) -> Result<Decimal, ValidationError> {
        self.items.iter().try_fold(Decimal::ZERO, |acc, item| {
            acc.checked_add(item.line_total()?)
                .ok_or(ValidationError::AmountOutOfRange)
        })
    }

    #[must_use]
    pub fn requires_prescription(&self) -> bool {
        self.items.iter().any(|i| i.prescription_required)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn update_line(
        &mut self,
        id: &str,
        apply: impl FnOnce(&mut CartLineItem),
    ) -> Result<bool, StoreError> {
        let mut items = self.items.clone();
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            return Ok(false);
        };
        apply(item);
        self.commit(items)?;
        Ok(true)
    }

    fn commit(&mut self, items: Vec<CartLineItem>) -> Result<(), StoreError> {
        self.store.set(CART_KEY, &items)?;
        self.items = items;
        Ok(())
    }
}

fn clamp_count(value: i64) -> u32 {
    u32::try_from(value.clamp(1, i64::from(MAX_QUANTITY_PER_ITEM))).unwrap_or(MAX_QUANTITY_PER_ITEM)
}

#[cfg(test)]
#[path = "cart_test.rs"]
mod tests;
