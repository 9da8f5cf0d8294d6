//! Terminal rendering.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use boutique_core::{CartLine, Category, Price, ShopSettings};
use boutique_storefront::catalog::CatalogEntry;
use boutique_storefront::checkout::CheckoutLink;

pub fn line(text: &str) {
    println!("{text}");
}

pub fn error(text: &str) {
    eprintln!("error: {text}");
}

pub fn entries(entries: &[CatalogEntry]) {
    if entries.is_empty() {
        println!("Aucun produit trouvé");
        return;
    }
    for entry in entries {
        println!(
            "{}  {:<40} {:>14}  [{}]",
            entry.product.id,
            entry.product.name,
            entry.product.price.display(),
            entry.category
        );
    }
}

pub fn entry(entry: &CatalogEntry) {
    let product = &entry.product;
    println!("{}", product.name);
    println!("  id:        {}", product.id);
    println!("  prix:      {}", product.price.display());
    println!("  catégorie: {}", entry.category);
    if let Some(url) = &entry.image_url {
        println!("  image:     {url}");
    }
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
}

pub fn categories(categories: &[Category]) {
    for category in categories {
        println!("{}  {}", category.id, category.name);
    }
}

pub fn cart(lines: &[CartLine], total: Price) {
    if lines.is_empty() {
        println!("Votre panier est vide");
        return;
    }
    for line in lines {
        println!(
            "{}  {:<40} x{:<4} {:>14}",
            line.product_id,
            line.product.name,
            line.quantity,
            line.line_total().display()
        );
    }
    println!("Total: {}", total.display());
}

pub fn checkout(link: &CheckoutLink) {
    println!("{}", link.message);
    println!();
    println!("{}", link.url);
}

pub fn settings(settings: &ShopSettings) {
    println!("shop_name:     {}", settings.shop_name);
    println!("contact_email: {}", settings.contact_email);
    println!("whatsapp:      {}", settings.whatsapp);
    println!("address:       {}", settings.address);
    println!("language:      {}", settings.language);
}
