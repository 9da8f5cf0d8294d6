//! WhatsApp checkout.
//!
//! There is no payment step: checkout composes a pre-filled WhatsApp message
//! listing the cart and its total, addressed to the shop's number.

use boutique_core::{CartLine, Price, cart_total};

use crate::error::{Result, ShopError};

/// WhatsApp click-to-chat endpoint.
pub const WHATSAPP_ENDPOINT: &str = "https://wa.me";

/// First line of an order message.
pub const ORDER_GREETING: &str = "Bonjour, je souhaite commander :";

/// Message used by the contact link.
pub const CONTACT_GREETING: &str = "Bonjour, je suis intéressé(e) par vos produits.";

/// A composed order, ready to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLink {
    /// Number the order is addressed to.
    pub number: String,
    /// Plain-text message.
    pub message: String,
    /// Cart total at the time of checkout.
    pub total: Price,
    /// Click-to-chat URL with the message pre-filled.
    pub url: String,
}

/// Compose the order message for `lines`.
///
/// # Errors
///
/// Returns `ShopError::EmptyCart` if there are no lines.
pub fn order_message(lines: &[CartLine]) -> Result<String> {
    if lines.is_empty() {
        return Err(ShopError::EmptyCart);
    }
    let items = lines
        .iter()
        .map(|line| format!("{} (x{})", line.product.name, line.quantity))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(format!(
        "{ORDER_GREETING}\n{items}\n\nTotal: {}",
        cart_total(lines).display()
    ))
}

/// Click-to-chat URL for `number` with `message` pre-filled.
#[must_use]
pub fn whatsapp_url(number: &str, message: &str) -> String {
    format!(
        "{WHATSAPP_ENDPOINT}/{}?text={}",
        number.trim(),
        urlencoding::encode(message)
    )
}

/// Click-to-chat URL with the contact greeting.
#[must_use]
pub fn contact_url(number: &str) -> String {
    whatsapp_url(number, CONTACT_GREETING)
}

/// Compose the full checkout link for `lines`.
///
/// # Errors
///
/// Returns `ShopError::EmptyCart` if there are no lines.
pub fn compose(number: &str, lines: &[CartLine]) -> Result<CheckoutLink> {
    let message = order_message(lines)?;
    Ok(CheckoutLink {
        number: number.trim().to_string(),
        url: whatsapp_url(number, &message),
        total: cart_total(lines),
        message,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use boutique_core::{CartItemId, ProductId, ProductSnapshot};

    use super::*;

    fn line(name: &str, price: i64, quantity: u32) -> CartLine {
        CartLine {
            id: CartItemId::generate(),
            product_id: ProductId::generate(),
            quantity,
            product: ProductSnapshot {
                name: name.to_string(),
                price: Price::from_units(price),
                image_path: None,
            },
        }
    }

    #[test]
    fn test_order_message() {
        let lines = [line("Casque", 1000, 2), line("Câble", 500, 1)];
        assert_eq!(
            order_message(&lines).unwrap(),
            "Bonjour, je souhaite commander :\nCasque (x2)\nCâble (x1)\n\nTotal: 2 500 FCFA"
        );
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert!(matches!(order_message(&[]), Err(ShopError::EmptyCart)));
        assert!(matches!(compose("+237695959595", &[]), Err(ShopError::EmptyCart)));
    }

    #[test]
    fn test_url_encodes_message() {
        let link = compose(" +237695959595 ", &[line("Casque", 1000, 1)]).unwrap();
        assert_eq!(link.number, "+237695959595");
        assert!(link.url.starts_with("https://wa.me/+237695959595?text=Bonjour%2C%20je"));
        assert!(link.url.contains("Casque%20%28x1%29%0A%0ATotal%3A%201%20000%20FCFA"));
        assert_eq!(link.total, Price::from_units(1000));
    }

    #[test]
    fn test_contact_url() {
        assert_eq!(
            contact_url("+237612345678"),
            "https://wa.me/+237612345678?text=Bonjour%2C%20je%20suis%20int%C3%A9ress%C3%A9%28e%29%20par%20vos%20produits."
        );
    }
}
