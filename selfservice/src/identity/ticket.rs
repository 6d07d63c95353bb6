//! Signed identity ticket
//!
//! The composite identity is remembered in a browser cookie of the form
//! `base64url(composite).base64url(HMAC-SHA256(secret, composite))`. Nothing is
//! kept server-side, so the ticket must be verified on every request.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::utils::{base64url_decode, base64url_encode};

use super::errors::IdentityError;
use super::types::CompositeId;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &[u8], payload: &[u8]) -> Result<HmacSha256, IdentityError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| IdentityError::Crypto(e.to_string()))?;
    mac.update(payload);
    Ok(mac)
}

/// Sign `composite_id` into a ticket
///
/// A user containing `;` would reopen as a different user, so it is refused.
pub fn seal_identity(secret: &[u8], composite_id: &CompositeId) -> Result<String, IdentityError> {
    if composite_id.user.contains(';') {
        return Err(IdentityError::Malformed(
            "user must not contain ';'".to_string(),
        ));
    }
    let payload = composite_id.to_string();
    let signature = mac_for(secret, payload.as_bytes())?.finalize().into_bytes();
    Ok(format!(
        "{}.{}",
        base64url_encode(payload.as_bytes()),
        base64url_encode(&signature)
    ))
}

pub fn open_identity(secret: &[u8], ticket: &str) -> Result<CompositeId, IdentityError> {
    let (payload, signature) = ticket
        .split_once('.')
        .ok_or_else(|| IdentityError::Malformed("missing signature".to_string()))?;

    let payload =
        base64url_decode(payload).map_err(|e| IdentityError::Malformed(e.to_string()))?;
    let signature =
        base64url_decode(signature).map_err(|e| IdentityError::Malformed(e.to_string()))?;

    mac_for(secret, &payload)?
        .verify_slice(&signature)
        .map_err(|_| {
            tracing::error!("Identity ticket signature mismatch");
            IdentityError::Signature
        })?;

    let composite =
        String::from_utf8(payload).map_err(|e| IdentityError::Malformed(e.to_string()))?;
    if composite.is_empty() {
        return Err(IdentityError::Malformed("empty identity".to_string()));
    }
    Ok(CompositeId::parse(&composite))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn test_seal_and_open() {
        let id = CompositeId::parse("alice@corp;userauthcookie=abc");
        let ticket = seal_identity(SECRET, &id).unwrap();
        assert!(!ticket.contains(';'));
        assert_eq!(open_identity(SECRET, &ticket).unwrap(), id);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let ticket = seal_identity(SECRET, &CompositeId::parse("bob")).unwrap();
        assert_eq!(
            open_identity(b"other-secret", &ticket),
            Err(IdentityError::Signature)
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let ticket = seal_identity(SECRET, &CompositeId::parse("bob")).unwrap();
        let (_, signature) = ticket.split_once('.').unwrap();
        let forged = format!("{}.{}", base64url_encode(b"admin"), signature);
        assert_eq!(open_identity(SECRET, &forged), Err(IdentityError::Signature));
    }

    #[test]
    fn test_user_with_separator_not_sealed() {
        let result = seal_identity(SECRET, &CompositeId::new("eve;admin", None));
        assert!(matches!(result, Err(IdentityError::Malformed(_))));
    }

    #[test]
    fn test_malformed_tickets_rejected() {
        assert!(matches!(
            open_identity(SECRET, "no-separator"),
            Err(IdentityError::Malformed(_))
        ));
        assert!(matches!(
            open_identity(SECRET, "!!!.???"),
            Err(IdentityError::Malformed(_))
        ));
    }
}
