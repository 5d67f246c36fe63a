/// Anti-forgery tokens scoped to one action on one resource.
///
/// Each session carries a random secret. A form for a mutating action embeds
/// a token derived from that secret, the action (`Intent`) and the resource
/// id, so a token issued for `delete-website 7` is useless for
/// `delete-website 8` or `edit-website 7`.
///
/// Usage in handlers:
/// ```rust,ignore
/// let check = client.check_intent(Intent::DeleteWebsite, id, &form.csrf_token);
/// match websites::delete(db, client.principal(), id, check).await? {
///     Mutation::Applied(theme) => ...,
///     // A bad token is answered exactly like a success.
///     Mutation::Skipped => ...,
/// }
/// ```
use crate::error::AppError;
use rand::{distributions::Alphanumeric, Rng};

pub const CSRF_TOKEN_LENGTH: usize = 32;
const CSRF_SESSION_KEY: &str = "csrf_token";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    NewTheme,
    EditTheme,
    DeleteTheme,
    Follow,
    Unfollow,
    NewWebsite,
    EditWebsite,
    DeleteWebsite,
    Moderate,
    Settings,
    Password,
    DeleteAccount,
    Login,
    Register,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::NewTheme => "new-theme",
            Intent::EditTheme => "edit-theme",
            Intent::DeleteTheme => "delete-theme",
            Intent::Follow => "follow",
            Intent::Unfollow => "unfollow",
            Intent::NewWebsite => "new-website",
            Intent::EditWebsite => "edit-website",
            Intent::DeleteWebsite => "delete-website",
            Intent::Moderate => "moderate",
            Intent::Settings => "settings",
            Intent::Password => "password",
            Intent::DeleteAccount => "delete-account",
            Intent::Login => "login",
            Intent::Register => "register",
        }
    }
}

/// Outcome of comparing a submitted token with the expected one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenCheck {
    Valid,
    Invalid,
}

impl TokenCheck {
    pub fn is_valid(self) -> bool {
        self == TokenCheck::Valid
    }
}

/// Generate a new session secret
pub fn generate_csrf_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Get or create the secret for the current session
///
/// Called when ClientCtx is created from the session, so every request that
/// renders a form has a secret to derive tokens from.
pub fn get_or_create_csrf_token(session: &actix_session::Session) -> Result<String, AppError> {
    match session.get::<String>(CSRF_SESSION_KEY) {
        Ok(Some(token)) => Ok(token),
        _ => {
            let token = generate_csrf_token();
            session
                .insert(CSRF_SESSION_KEY, token.clone())
                .map_err(|e| AppError::Internal(format!("Failed to store CSRF token: {}", e)))?;
            Ok(token)
        }
    }
}

fn intent_hash(secret: &str, intent: Intent, id: i32) -> blake3::Hash {
    let key = blake3::hash(secret.as_bytes());
    blake3::keyed_hash(
        key.as_bytes(),
        format!("{}{}", intent.as_str(), id).as_bytes(),
    )
}

/// Token for `intent` on resource `id`, hex encoded.
pub fn intent_token(secret: &str, intent: Intent, id: i32) -> String {
    intent_hash(secret, intent, id).to_hex().to_string()
}

/// Compares in constant time. An empty secret never validates.
pub fn verify_intent_token(secret: &str, intent: Intent, id: i32, provided: &str) -> TokenCheck {
    if secret.is_empty() {
        return TokenCheck::Invalid;
    }

    match blake3::Hash::from_hex(provided.trim()) {
        Ok(provided) if provided == intent_hash(secret, intent, id) => TokenCheck::Valid,
        _ => {
            log::debug!(
                "CSRF token validation failed for {} {}",
                intent.as_str(),
                id
            );
            TokenCheck::Invalid
        }
    }
}
