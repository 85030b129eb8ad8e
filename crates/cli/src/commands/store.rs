//! Seller store commands.

use std::io::Write;

use clap::Args;
use kaimono_core::{CategoryId, Price, ProductId, ProductStatus};
use kaimono_storefront::AppState;
use kaimono_storefront::api::{NewProduct, ProductUpdate};
use tracing::info;

use super::{CommandError, CommandResult};
use crate::output;

/// Fields to change with `kaimono store edit`. Omitted flags are left alone.
#[derive(Debug, Default, Args)]
pub struct EditArgs {
    #[arg(short, long)]
    name: Option<String>,

    #[arg(short, long)]
    price: Option<Price>,

    #[arg(short, long)]
    category_id: Option<CategoryId>,

    #[arg(short, long)]
    stock: Option<u32>,

    #[arg(short, long)]
    description: Option<String>,

    #[arg(short, long)]
    image_url: Option<String>,

    /// `available`, `sold` or `deleted`
    #[arg(long)]
    status: Option<ProductStatus>,
}

impl From<EditArgs> for ProductUpdate {
    fn from(args: EditArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            price: args.price,
            category_id: args.category_id,
            image_url: args.image_url,
            stock: args.stock,
            is_active: None,
            status: args.status,
        }
    }
}

pub async fn list(state: &AppState, out: &mut impl Write) -> CommandResult {
    let token = state.session().token()?;
    let products = state.api().my_products(token).await?;
    output::products(out, &products)?;
    Ok(())
}

pub async fn create(state: &AppState, out: &mut impl Write, product: &NewProduct) -> CommandResult {
    let token = state.session().token()?;
    let created = state.api().create_product(token, product).await?;
    writeln!(out, "Listed:")?;
    output::product_line(out, &created)?;
    Ok(())
}

/// Edit one of your listings (admins may edit any listing).
pub async fn edit(state: &AppState, out: &mut impl Write, id: ProductId, args: EditArgs) -> CommandResult {
    let update = ProductUpdate::from(args);
    if update.is_empty() {
        return Err(CommandError::NothingToUpdate);
    }

    let token = state.session().token()?;
    let updated = state.api().update_product(token, id, &update).await?;
    info!(product_id = %id, "Listing updated");
    writeln!(out, "Updated:")?;
    output::product_line(out, &updated)?;
    Ok(())
}

pub async fn delete(state: &AppState, out: &mut impl Write, id: ProductId) -> CommandResult {
    let token = state.session().token()?;
    let response = state.api().delete_product(token, id).await?;
    writeln!(out, "{}", response.message)?;
    Ok(())
}
