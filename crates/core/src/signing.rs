//! Quote signature methods and public signing-link tokens.
//!
//! A signing link is a random token handed to the client. Only its SHA-256
//! hash is stored, so a database leak cannot be replayed into signatures.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Length of a generated signing token (alphanumeric characters).
pub const TOKEN_LENGTH: usize = 48;

/// Default lifetime of a signing link in hours (one week).
pub const DEFAULT_LINK_TTL_HOURS: i64 = 168;

/// Maximum accepted length of a signer's name.
pub const MAX_SIGNER_NAME_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureMethod {
    /// Signed by a logged-in tenant member on behalf of the client.
    Authenticated,
    /// Signed by the client through a public signing link.
    PublicLink,
}

impl SignatureMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            SignatureMethod::Authenticated => "authenticated",
            SignatureMethod::PublicLink => "public_link",
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly generated signing token.
pub struct GeneratedToken {
    /// Shown to the user exactly once, never stored.
    pub plaintext: String,
    /// SHA-256 hex digest stored in `quote_signing_links.token_hash`.
    pub hash: String,
}

pub fn generate_signing_token() -> GeneratedToken {
    let plaintext: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();
    let hash = hash_token(&plaintext);
    GeneratedToken { plaintext, hash }
}

pub fn hash_token(token: &str) -> String {
    crate::hashing::sha256_hex(token.as_bytes())
}

/// Trim and validate the signer's displayed name.
pub fn normalize_signer_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Signer name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_SIGNER_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Signer name exceeds {MAX_SIGNER_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}
