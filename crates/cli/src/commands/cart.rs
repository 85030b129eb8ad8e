//! Cart commands.
//!
//! Only `add` talks to the ProductAPI, to snapshot the product; every other
//! command works on the local cart alone.

use std::io::Write;

use kaimono_cart::ProductSnapshot;
use kaimono_core::ProductId;
use kaimono_storefront::AppState;
use tracing::warn;

use super::{CommandError, CommandResult};
use crate::output;

pub fn show(state: &AppState, out: &mut impl Write) -> CommandResult {
    output::cart(out, state.cart())?;
    Ok(())
}

/// Add a product, merging with an existing line.
pub async fn add(
    state: &mut AppState,
    out: &mut impl Write,
    id: ProductId,
    quantity: u32,
) -> CommandResult {
    let product = state.api().get_product(id).await?;
    if !product.is_purchasable() {
        return Err(CommandError::NotPurchasable(id));
    }

    let cart = state.cart_mut();
    cart.add_item(&ProductSnapshot::from(&product), quantity);

    if let Some(line) = cart.get(id)
        && line.quantity > product.stock
    {
        warn!(
            product_id = %id,
            in_cart = line.quantity,
            stock = product.stock,
            "Cart holds more than the current stock"
        );
    }

    finish(state, out)
}

pub fn remove(state: &mut AppState, out: &mut impl Write, id: ProductId) -> CommandResult {
    state.cart_mut().remove_item(id);
    finish(state, out)
}

/// Set a line's quantity. Zero or a negative number removes the line.
pub fn set(state: &mut AppState, out: &mut impl Write, id: ProductId, quantity: i64) -> CommandResult {
    state.cart_mut().set_quantity(id, clamp_quantity(quantity));
    finish(state, out)
}

pub fn clear(state: &mut AppState, out: &mut impl Write) -> CommandResult {
    state.cart_mut().clear();
    finish(state, out)
}

fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(0)).unwrap_or(u32::MAX)
}

/// Print the cart after a mutation, flagging a failed save.
fn finish(state: &AppState, out: &mut impl Write) -> CommandResult {
    if state.cart().last_flush_failed() {
        warn!(
            data_dir = %state.data_dir().display(),
            "Cart could not be saved; changes will be lost on exit"
        );
    }
    output::cart(out, state.cart())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(-3), 0);
        assert_eq!(clamp_quantity(0), 0);
        assert_eq!(clamp_quantity(7), 7);
        assert_eq!(clamp_quantity(i64::MAX), u32::MAX);
    }
}
