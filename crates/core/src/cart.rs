//! Shopping cart state container.
//!
//! A cart is an ordered list of line items. A line is identified by the
//! product together with the chosen size and color, so the same product in
//! two sizes is two lines. Insertion order is kept for display.
//!
//! Invariants:
//! - at most one line per (product, size, color)
//! - every line has a quantity of at least 1; asking for a quantity of zero
//!   or less removes the line
//!
//! Every operation is a total function over the in-memory list. Quantity
//! arithmetic saturates rather than overflowing, and no stock limit is
//! enforced here.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    /// Display name, copied from the product when the line was added.
    pub name: String,
    /// Unit price at the time the line was added.
    pub price: Price,
    pub quantity: u32,
    pub size: String,
    pub color: String,
    pub image_url: String,
}

impl CartItem {
    /// Whether this line has the given identity key.
    #[must_use]
    pub fn matches(&self, product_id: ProductId, size: &str, color: &str) -> bool {
        self.product_id == product_id && self.size == size && self.color == color
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find the line with the given identity key.
    #[must_use]
    pub fn get(&self, product_id: ProductId, size: &str, color: &str) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|item| item.matches(product_id, size, color))
    }

    /// Add `item` to the cart.
    ///
    /// If a line with the same key exists its quantity grows by
    /// `item.quantity`; otherwise the item is appended. Adding zero units is
    /// a no-op.
    pub fn add_item(&mut self, item: CartItem) {
        if item.quantity == 0 {
            return;
        }

        match self
            .items
            .iter_mut()
            .find(|line| line.matches(item.product_id, &item.size, &item.color))
        {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => self.items.push(item),
        }
    }

    /// Drop the matching line. No-op if absent.
    pub fn remove_item(&mut self, product_id: ProductId, size: &str, color: &str) {
        self.items
            .retain(|item| !item.matches(product_id, size, color));
    }

    /// Set the quantity of the matching line.
    ///
    /// A quantity of zero or less removes the line. No-op if absent.
    pub fn update_quantity(&mut self, product_id: ProductId, size: &str, color: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id, size, color);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self
            .items
            .iter_mut()
            .find(|item| item.matches(product_id, size, color))
        {
            line.quantity = quantity;
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of unit price times quantity across all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(n: u128) -> ProductId {
        ProductId::new(uuid::Uuid::from_u128(n))
    }

    fn item(n: u128, price_cents: i64, quantity: u32, size: &str, color: &str) -> CartItem {
        CartItem {
            product_id: product(n),
            name: format!("Product {n}"),
            price: Price::from_cents(price_cents),
            quantity,
            size: size.to_string(),
            color: color.to_string(),
            image_url: format!("https://images.example.com/{n}.jpg"),
        }
    }

    #[test]
    fn test_same_key_merges() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 1000, 1, "M", "red"));
        cart.add_item(item(1, 1000, 2, "M", "red"));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total_price(), Price::from_cents(3000));
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_size_or_color_makes_a_new_line() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 1000, 1, "M", "red"));
        cart.add_item(item(1, 1000, 1, "L", "red"));
        cart.add_item(item(1, 1000, 1, "M", "blue"));

        assert_eq!(cart.items().len(), 3);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut cart = Cart::new();
        cart.add_item(item(2, 500, 1, "", ""));
        cart.add_item(item(1, 500, 1, "", ""));
        cart.add_item(item(2, 500, 4, "", ""));

        let order: Vec<_> = cart.items().iter().map(|i| i.product_id).collect();
        assert_eq!(order, vec![product(2), product(1)]);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 1000, 1, "M", "red"));
        cart.add_item(item(2, 2500, 1, "S", "black"));
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Price::ZERO);
    }

    #[test]
    fn test_update_quantity_zero_or_negative_removes() {
        for quantity in [0, -1, i64::MIN] {
            let mut cart = Cart::new();
            cart.add_item(item(1, 1000, 2, "M", "red"));
            cart.update_quantity(product(1), "M", "red", quantity);
            assert!(cart.is_empty(), "quantity {quantity} should remove the line");
        }
    }

    #[test]
    fn test_update_quantity_replaces() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 1000, 2, "M", "red"));
        cart.update_quantity(product(1), "M", "red", 5);

        assert_eq!(cart.get(product(1), "M", "red").unwrap().quantity, 5);
    }

    #[test]
    fn test_update_quantity_missing_key_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 1000, 2, "M", "red"));
        let before = cart.clone();
        cart.update_quantity(product(1), "L", "red", 7);

        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_quantity_clamps_to_u32() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 100, 1, "M", "red"));
        cart.update_quantity(product(1), "M", "red", i64::MAX);

        assert_eq!(cart.items()[0].quantity, u32::MAX);
    }

    #[test]
    fn test_add_saturates() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 100, u32::MAX, "M", "red"));
        cart.add_item(item(1, 100, 10, "M", "red"));

        assert_eq!(cart.items()[0].quantity, u32::MAX);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 100, 0, "M", "red"));

        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 1000, 1, "M", "red"));
        let before = cart.clone();
        cart.remove_item(product(9), "M", "red");

        assert_eq!(cart, before);
    }

    #[test]
    fn test_serde_keeps_lines() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 1999, 2, "M", "red"));
        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();

        assert_eq!(back, cart);
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    fn product(n: u8) -> ProductId {
        ProductId::new(uuid::Uuid::from_u128(u128::from(n)))
    }

    fn arb_line() -> impl Strategy<Value = (u8, &'static str, &'static str, i64, u32)> {
        (
            0u8..8,
            prop::sample::select(vec!["S", "M", "L"]),
            prop::sample::select(vec!["red", "black"]),
            0i64..100_000,
            1u32..50,
        )
    }

    fn to_item((n, size, color, cents, quantity): (u8, &str, &str, i64, u32)) -> CartItem {
        CartItem {
            product_id: product(n),
            name: format!("Product {n}"),
            price: Price::from_cents(cents),
            quantity,
            size: size.to_string(),
            color: color.to_string(),
            image_url: String::new(),
        }
    }

    proptest! {
        #[test]
        fn repeated_adds_sum_quantities(quantities in prop::collection::vec(1u32..1_000, 1..20)) {
            let mut cart = Cart::new();
            for &quantity in &quantities {
                cart.add_item(to_item((1, "M", "red", 1000, quantity)));
            }

            prop_assert_eq!(cart.items().len(), 1);
            prop_assert_eq!(cart.items()[0].quantity, quantities.iter().sum::<u32>());
        }

        #[test]
        fn total_price_ignores_insertion_order(
            (lines, shuffled) in prop::collection::vec(arb_line(), 0..16)
                .prop_flat_map(|lines| (Just(lines.clone()), Just(lines).prop_shuffle()))
        ) {
            // Keep the first occurrence of each key so both carts hold the
            // same lines with the same prices.
            let mut seen = std::collections::HashSet::new();
            let lines: Vec<_> = lines
                .into_iter()
                .filter(|(n, size, color, _, _)| seen.insert((*n, *size, *color)))
                .collect();
            let keep: std::collections::HashSet<_> = lines.iter().copied().collect();

            let mut forward = Cart::new();
            for line in &lines {
                forward.add_item(to_item(*line));
            }

            let mut backward = Cart::new();
            let mut seen = std::collections::HashSet::new();
            for line in shuffled.into_iter().filter(|line| keep.contains(line)) {
                if seen.insert((line.0, line.1, line.2)) {
                    backward.add_item(to_item(line));
                }
            }

            let expected: Price = forward
                .items()
                .iter()
                .map(|item| item.price.times(item.quantity))
                .sum();
            prop_assert_eq!(forward.total_price(), expected);
            prop_assert_eq!(backward.total_price(), expected);
        }

        #[test]
        fn remove_missing_key_leaves_cart_unchanged(
            lines in prop::collection::vec(arb_line(), 0..10),
            missing in 100u8..200,
        ) {
            let mut cart = Cart::new();
            for line in lines {
                cart.add_item(to_item(line));
            }
            let before = cart.clone();
            cart.remove_item(product(missing), "M", "red");

            prop_assert_eq!(cart, before);
        }

        #[test]
        fn non_positive_update_removes(
            lines in prop::collection::vec(arb_line(), 1..10),
            quantity in i64::MIN..=0,
        ) {
            let mut cart = Cart::new();
            for line in &lines {
                cart.add_item(to_item(*line));
            }
            let target = lines[0];
            cart.update_quantity(product(target.0), target.1, target.2, quantity);

            prop_assert!(cart.get(product(target.0), target.1, target.2).is_none());
            prop_assert!(cart.items().iter().all(|item| item.quantity >= 1));
        }
    }
}
