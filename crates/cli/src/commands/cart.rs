//! Cart, checkout and identity commands.

use boutique_core::{ActorId, ProductId};
use boutique_gateway::AuthProvider;
use boutique_storefront::AppState;

use crate::error::Result;
use crate::output;

pub async fn show(state: &AppState) -> Result<()> {
    let lines = state.cart().fetch_cart().await?;
    output::cart(&lines, state.cart().total());
    Ok(())
}

pub async fn add(state: &AppState, id: ProductId) -> Result<()> {
    state.cart().add_to_cart(id).await?;
    show(state).await
}

pub async fn set(state: &AppState, id: ProductId, quantity: i64) -> Result<()> {
    state.cart().update_quantity(id, quantity).await?;
    show(state).await
}

pub async fn remove(state: &AppState, id: ProductId) -> Result<()> {
    state.cart().remove_from_cart(id).await?;
    show(state).await
}

pub async fn clear(state: &AppState) -> Result<()> {
    state.cart().clear_cart().await?;
    Ok(())
}

pub async fn checkout(state: &AppState) -> Result<()> {
    let link = state.checkout().await?;
    output::checkout(&link);
    Ok(())
}

pub async fn contact(state: &AppState) {
    output::line(&state.contact_link().await);
}

pub fn whoami(state: &AppState) -> Result<()> {
    match state.identity().current_actor()? {
        ActorId::Authenticated(id) => {
            let email = state
                .backend()
                .current_session()
                .and_then(|s| s.user.email)
                .unwrap_or_default();
            output::line(&format!("authenticated {id} {email}"));
        }
        ActorId::Anonymous(id) => output::line(&format!("anonymous {id}")),
    }
    Ok(())
}
