//! Cart rows and the joined view the reconciler keeps in memory.

use serde::{Deserialize, Serialize};

use crate::types::id::{CartItemId, ProductId};
use crate::types::price::Price;

/// A raw `cart_items` row.
///
/// At most one row exists per `(user_id, product_id)`; `quantity` is always
/// at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    /// Actor partition key (authenticated user id or anonymous id).
    pub user_id: String,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The product columns joined onto a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    pub price: Price,
    #[serde(rename = "image_url")]
    pub image_path: Option<String>,
}

/// A cart row joined with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub product: ProductSnapshot,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price * self.quantity
    }
}

/// A cart row as returned by the joined select.
///
/// `product` is `None` when the referenced product no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRow {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub product: Option<ProductSnapshot>,
}

impl CartRow {
    /// The joined line, or `None` if the product reference dangles.
    #[must_use]
    pub fn into_line(self) -> Option<CartLine> {
        let product = self.product?;
        Some(CartLine {
            id: self.id,
            product_id: self.product_id,
            quantity: self.quantity,
            product,
        })
    }
}

/// Sum of `price × quantity` over all lines.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Price {
    lines.iter().map(CartLine::line_total).sum()
}

/// Total number of units across all lines.
#[must_use]
pub fn item_count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|l| u64::from(l.quantity)).sum()
}
