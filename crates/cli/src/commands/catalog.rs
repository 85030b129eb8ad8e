//! Catalog browsing commands.

use std::io::Write;

use kaimono_core::{Price, ProductId, UserId};
use kaimono_storefront::{AppState, ProductFilter};
use tracing::info;

use super::CommandResult;
use crate::output;

/// List products, narrowed down by category slug and maximum price.
pub async fn list(
    state: &AppState,
    out: &mut impl Write,
    category: Option<String>,
    max_price: Option<Price>,
) -> CommandResult {
    let filter = ProductFilter {
        category,
        max_price,
    };

    let all = state.api().list_products().await?;
    let total = all.len();
    let products = filter.apply(all);

    if let Some(description) = filter.describe() {
        info!(shown = products.len(), total, filter = %description, "Filtered catalog");
    }

    output::products(out, &products)?;
    Ok(())
}

pub async fn show(state: &AppState, out: &mut impl Write, id: ProductId) -> CommandResult {
    let product = state.api().get_product(id).await?;
    output::product(out, &product)?;
    Ok(())
}

pub async fn categories(state: &AppState, out: &mut impl Write) -> CommandResult {
    let categories = state.api().list_categories().await?;
    output::categories(out, &categories)?;
    Ok(())
}

/// A seller's public shop page.
pub async fn shop(state: &AppState, out: &mut impl Write, user_id: UserId) -> CommandResult {
    let (seller, products) = tokio::try_join!(
        state.api().get_user(user_id),
        state.api().user_products(user_id),
    )?;
    output::shop(out, &seller, &products)?;
    Ok(())
}
