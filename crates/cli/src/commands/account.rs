//! Account commands.

use std::io::Write;

use kaimono_core::Email;
use kaimono_storefront::AppState;
use kaimono_storefront::api::Registration;
use secrecy::SecretString;
use tracing::info;

use super::CommandResult;
use crate::output;

pub async fn login(
    state: &mut AppState,
    out: &mut impl Write,
    username: &str,
    password: String,
) -> CommandResult {
    let password = SecretString::from(password);
    let api = state.api().clone();
    let user = state.session_mut().login(&api, username, &password).await?;
    writeln!(out, "Logged in as {} ({})", user.username, user.role)?;
    Ok(())
}

pub fn logout(state: &mut AppState, out: &mut impl Write) -> CommandResult {
    state.session_mut().logout();
    writeln!(out, "Logged out.")?;
    Ok(())
}

/// Validate the stored token and show who it belongs to.
pub async fn whoami(state: &mut AppState, out: &mut impl Write) -> CommandResult {
    state.restore_session().await?;
    match state.session().user() {
        Some(user) => output::user(out, user)?,
        None => writeln!(out, "Not logged in.")?,
    }
    Ok(())
}

pub async fn register(
    state: &AppState,
    out: &mut impl Write,
    email: &str,
    username: String,
    password: String,
) -> CommandResult {
    let registration = Registration {
        email: Email::parse(email)?,
        username,
        password,
    };
    let user = state.api().register(&registration).await?;
    info!(user_id = %user.id, "Account created");
    writeln!(out, "Account {} created. Log in with `kaimono login`.", user.username)?;
    Ok(())
}
