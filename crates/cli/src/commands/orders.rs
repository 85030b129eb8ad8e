//! Checkout and order history.

use std::io::Write;

use clap::Args;
use kaimono_core::OrderId;
use kaimono_storefront::{AppState, ShippingInfo, place_order};

use super::CommandResult;
use crate::output;

/// Shipping details for `kaimono checkout`.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Recipient name
    #[arg(long)]
    name: String,

    #[arg(long)]
    phone: String,

    /// e.g. `150-0001`
    #[arg(long)]
    postal_code: String,

    #[arg(long)]
    prefecture: String,

    #[arg(long)]
    city: String,

    /// Street address
    #[arg(long)]
    address1: String,

    /// Building and room number
    #[arg(long)]
    address2: Option<String>,
}

impl From<CheckoutArgs> for ShippingInfo {
    fn from(args: CheckoutArgs) -> Self {
        Self {
            name: args.name,
            phone: args.phone,
            postal_code: args.postal_code,
            prefecture: args.prefecture,
            city: args.city,
            address1: args.address1,
            address2: args.address2,
        }
    }
}

/// Order the whole cart. The cart is emptied only if the order goes through.
pub async fn checkout(state: &mut AppState, out: &mut impl Write, args: CheckoutArgs) -> CommandResult {
    let shipping = ShippingInfo::from(args);
    shipping.validate()?;

    state.restore_session().await?;
    let (api, session, cart) = state.checkout_parts();
    let order = place_order(api, session, cart, &shipping).await?;

    writeln!(out, "Thank you for your order!")?;
    output::order(out, &order)?;
    Ok(())
}

pub async fn list(state: &AppState, out: &mut impl Write) -> CommandResult {
    let token = state.session().token()?;
    let orders = state.api().list_orders(token).await?;
    if orders.is_empty() {
        writeln!(out, "No orders yet.")?;
    }
    for order in &orders {
        output::order_line(out, order)?;
    }
    Ok(())
}

pub async fn show(state: &AppState, out: &mut impl Write, id: OrderId) -> CommandResult {
    let token = state.session().token()?;
    let order = state.api().get_order(token, id).await?;
    output::order(out, &order)?;
    Ok(())
}
