//! User administration commands.
//!
//! Every command validates the session first so a non-admin gets a clear
//! `Forbidden` before anything is sent.

use std::io::Write;

use clap::Args;
use kaimono_core::{Email, UserId, UserRole};
use kaimono_storefront::AppState;
use kaimono_storefront::api::UserUpdate;
use tracing::info;

use super::{CommandError, CommandResult};
use crate::output;

/// Fields to change with `kaimono admin update-user`.
#[derive(Debug, Default, Args)]
pub struct UpdateUserArgs {
    /// `user` or `admin`
    #[arg(long)]
    role: Option<UserRole>,

    /// Enable or disable the account
    #[arg(long)]
    is_active: Option<bool>,

    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    email: Option<String>,
}

impl UpdateUserArgs {
    fn into_update(self) -> Result<UserUpdate, CommandError> {
        Ok(UserUpdate {
            username: self.username,
            email: self.email.as_deref().map(Email::parse).transpose()?,
            role: self.role,
            is_active: self.is_active,
            password: None,
        })
    }
}

pub async fn users(state: &mut AppState, out: &mut impl Write) -> CommandResult {
    state.restore_session().await?;
    let token = state.session().require_admin()?;
    let users = state.api().admin_list_users(token).await?;
    for user in &users {
        output::user(out, user)?;
    }
    Ok(())
}

pub async fn update_user(
    state: &mut AppState,
    out: &mut impl Write,
    id: UserId,
    args: UpdateUserArgs,
) -> CommandResult {
    let update = args.into_update()?;
    if update.is_empty() {
        return Err(CommandError::NothingToUpdate);
    }

    state.restore_session().await?;
    let token = state.session().require_admin()?;
    let response = state.api().admin_update_user(token, id, &update).await?;
    info!(user_id = %id, "User updated");
    writeln!(out, "{}", response.message)?;
    Ok(())
}

pub async fn delete_user(state: &mut AppState, out: &mut impl Write, id: UserId) -> CommandResult {
    state.restore_session().await?;
    let token = state.session().require_admin()?;
    let response = state.api().admin_delete_user(token, id).await?;
    info!(user_id = %id, "User deleted");
    writeln!(out, "{}", response.message)?;
    Ok(())
}
