use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::AuthConfig;
use crate::error::{AppError, Result};

/// Build the `Authorization` header value for the configured credentials.
///
/// A token wins over username/password when both are present.
pub fn authorization_header(auth: &AuthConfig) -> Result<String> {
    if let Some(token) = auth.token.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(format!("Bearer {token}"));
    }

    match (auth.username.as_deref(), auth.password.as_deref()) {
        (Some(user), Some(password)) if !user.is_empty() => {
            let encoded = STANDARD.encode(format!("{user}:{password}"));
            Ok(format!("Basic {encoded}"))
        }
        _ => Err(AppError::Config(
            "No Jira credentials configured. Set jira.auth.token or jira.auth.username/password"
                .to_string(),
        )),
    }
}
