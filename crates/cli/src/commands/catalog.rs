//! Catalog browsing commands.

use boutique_core::{CategoryId, ProductId};
use boutique_storefront::AppState;
use boutique_storefront::catalog::CatalogQuery;

use crate::error::{CliError, Result};
use crate::output;

pub async fn list(state: &AppState, category: Option<CategoryId>, search: Option<String>) -> Result<()> {
    let entries = state
        .catalog()
        .browse(&CatalogQuery { category, search })
        .await?;
    output::entries(&entries);
    Ok(())
}

pub async fn show(state: &AppState, id: ProductId) -> Result<()> {
    let entry = state
        .catalog()
        .browse(&CatalogQuery::default())
        .await?
        .into_iter()
        .find(|entry| entry.product.id == id)
        .ok_or(CliError::ProductNotFound(id))?;
    output::entry(&entry);
    Ok(())
}

pub async fn categories(state: &AppState) -> Result<()> {
    output::categories(&state.catalog().list_categories().await?);
    Ok(())
}
