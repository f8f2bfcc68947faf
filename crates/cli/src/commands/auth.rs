//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! ecom login -e shopper@example.com -p secret [--admin]
//! ecom register -n "Jane Doe" -d 1990-04-01 --phone 0900000000 -e jane@example.com -p secret
//! ecom profile
//! ecom status
//! ecom logout
//! ```

use std::io::Write;

use ecom_client::CredentialStore;
use ecom_client::services::AuthService;
use ecom_core::{LoginRequest, RegisterRequest};

use super::{CliError, Context, print_json};

/// Sign in and persist the returned token pair.
pub async fn login(
    ctx: &Context,
    email: String,
    password: String,
    admin: bool,
) -> Result<(), CliError> {
    let auth = AuthService::new(ctx.client()?);
    let request = LoginRequest { email, password };

    let login = if admin {
        auth.admin_login(&request).await?
    } else {
        auth.login(&request).await?
    };

    let roles: Vec<String> = login.roles.iter().map(ToString::to_string).collect();
    tracing::info!("Signed in as {} ({})", login.email, roles.join(", "));
    Ok(())
}

/// Register a customer account. The password is used for confirmation too.
///
/// Registration does not sign in; the session file is left as it was.
pub async fn register(
    ctx: &Context,
    full_name: String,
    date_of_birth: String,
    phone: String,
    email: String,
    password: String,
) -> Result<(), CliError> {
    let auth = AuthService::new(ctx.client()?);
    let request = RegisterRequest {
        full_name,
        date_of_birth,
        phone,
        email,
        confirm_password: password.clone(),
        password,
    };

    auth.register(&request).await?;
    tracing::info!("Registered {}. Run `ecom login` to sign in", request.email);
    Ok(())
}

/// Revoke the session on the backend and delete the session file.
///
/// A failed backend call is reported but the local session is gone either way.
pub async fn logout(ctx: &Context) -> Result<(), CliError> {
    let store = ctx.store();
    if !store.has_token() {
        tracing::info!("No stored session");
        return Ok(());
    }

    let auth = AuthService::new(ctx.client()?);
    if let Err(e) = auth.logout().await {
        tracing::warn!("Backend logout failed ({e}), local session removed");
    }
    Ok(())
}

/// Fetch the profile, cache it and print it.
pub async fn profile(ctx: &Context) -> Result<(), CliError> {
    if !ctx.store().has_token() {
        return Err(CliError::NotSignedIn);
    }

    let auth = AuthService::new(ctx.client()?);
    let profile = auth.profile().await?;
    print_json(&profile)
}

/// Print what the session file holds.
pub fn status(ctx: &Context) -> Result<(), CliError> {
    let store = ctx.store();
    let mut stdout = std::io::stdout().lock();

    writeln!(stdout, "Session file: {}", store.path().display())?;
    if !store.has_token() {
        writeln!(stdout, "Signed in:    no")?;
        return Ok(());
    }

    writeln!(stdout, "Signed in:    yes")?;
    match store.user_profile() {
        Some(profile) => {
            let roles: Vec<String> = profile.roles.iter().map(ToString::to_string).collect();
            writeln!(stdout, "User:         {} <{}>", profile.full_name, profile.email)?;
            writeln!(stdout, "Roles:        {}", roles.join(", "))?;
        }
        None => writeln!(stdout, "User:         unknown (run `ecom profile`)")?,
    }
    Ok(())
}
