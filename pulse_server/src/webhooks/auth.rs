//! Webhook sender authentication — path tokens, shared secrets, HMAC
//! signatures. Runs strictly before payload parsing so unauthenticated
//! callers learn nothing about validation.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::WebhookError;
use crate::models::profile::Profile;
use crate::store::Store;

type HmacSha256 = Hmac<Sha256>;

/// Resolve the account owning an opaque path token.
pub async fn resolve_path_token(store: &dyn Store, token: &str) -> Result<Profile, WebhookError> {
    match store.profile_by_token(token).await? {
        Some(profile) => Ok(profile),
        None => {
            tracing::warn!("Unknown webhook token");
            Err(WebhookError::Unauthorized)
        }
    }
}

/// Resolve the account a shared-secret request acts for: an explicit path
/// token when given, otherwise the sole registered account. With zero or
/// several accounts and no token there is no unambiguous owner.
pub async fn resolve_scoped_account(
    store: &dyn Store,
    token: Option<&str>,
) -> Result<Profile, WebhookError> {
    match token {
        Some(token) => resolve_path_token(store, token).await,
        None => match store.sole_profile().await? {
            Some(profile) => Ok(profile),
            None => {
                tracing::warn!(
                    "No unambiguous account for unscoped webhook; append the webhook token to the URL"
                );
                Err(WebhookError::Unauthorized)
            }
        },
    }
}

/// Compare a provider-presented secret against the configured value.
/// An unset configured secret rejects every request.
pub fn verify_shared_secret(
    configured: &str,
    presented: Option<&str>,
) -> Result<(), WebhookError> {
    if configured.is_empty() {
        tracing::warn!("Shared webhook secret not configured; rejecting request");
        return Err(WebhookError::Unauthorized);
    }

    match presented {
        Some(presented) if presented == configured => Ok(()),
        _ => Err(WebhookError::Unauthorized),
    }
}

/// Validate a GitHub-style HMAC-SHA256 signature (`sha256=<hex>`) computed
/// over the raw request body.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        return false;
    }

    let sig = signature.strip_prefix("sha256=").unwrap_or(signature);
    let sig_bytes = match hex::decode(sig) {
        Ok(b) => b,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(payload);

    mac.verify_slice(&sig_bytes).is_ok()
}
