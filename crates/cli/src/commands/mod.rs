//! Command implementations.
//!
//! Each command writes its user-facing output to the writer it is given and
//! reports failures as a [`CommandError`]; logging goes through `tracing`.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod store;

use kaimono_core::{EmailError, ProductId};
use kaimono_storefront::{ApiError, ConfigError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Product #{0} is not available for purchase")]
    NotPurchasable(ProductId),

    #[error("Nothing to update: pass at least one field to change")]
    NothingToUpdate,

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

pub type CommandResult = Result<(), CommandError>;
