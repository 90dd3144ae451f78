//! The installation's pairing secret.
//!
//! One [`Credential`] exists per installation.  The control surface proves it
//! was paired either with the long random token (scanned from the pairing
//! URI) or with the six-digit PIN shown at startup.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Schema version written to `auth.json`.
pub const CREDENTIAL_VERSION: &str = "1.0";

/// Random bytes behind the token.
const TOKEN_BYTES: usize = 32;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// URL-safe base64 of 32 random bytes, no padding.
    pub token: String,
    /// Six decimal digits, `100000..=999999`.
    pub pin: String,
    pub created_at: DateTime<Utc>,
    pub version: String,
}

impl Credential {
    /// Generates a fresh token and PIN from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; TOKEN_BYTES];
        rng.fill_bytes(&mut bytes);
        let pin: u32 = rng.gen_range(100_000..=999_999);

        Self {
            token: URL_SAFE_NO_PAD.encode(bytes),
            pin: format!("{pin:06}"),
            created_at: Utc::now(),
            version: CREDENTIAL_VERSION.to_string(),
        }
    }

    /// Returns `true` if the stored values have the expected shape.
    pub fn is_well_formed(&self) -> bool {
        self.pin.len() == 6
            && self.pin.bytes().all(|b| b.is_ascii_digit())
            && !self.pin.starts_with('0')
            && URL_SAFE_NO_PAD
                .decode(&self.token)
                .map(|b| b.len() == TOKEN_BYTES)
                .unwrap_or(false)
    }

    /// Checks offered credentials.
    ///
    /// A non-empty token is authoritative: when one is offered the PIN is not
    /// consulted.  The PIN is compared after trimming surrounding whitespace.
    pub fn verify(&self, token: Option<&str>, pin: Option<&str>) -> bool {
        match (token.filter(|t| !t.is_empty()), pin) {
            (Some(token), _) => constant_time_eq(token.as_bytes(), self.token.as_bytes()),
            (None, Some(pin)) => constant_time_eq(pin.trim().as_bytes(), self.pin.as_bytes()),
            (None, None) => false,
        }
    }

    /// First eight characters of the token, for status output.
    pub fn token_preview(&self) -> String {
        let preview: String = self.token.chars().take(8).collect();
        format!("{preview}...")
    }

    /// The URI encoded in the pairing QR code.
    pub fn pairing_uri(&self, host: &str, port: u16) -> String {
        format!(
            "artremote://connect?token={}&host={host}&port={port}",
            self.token
        )
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &self.token_preview())
            .field("pin", &"******")
            .field("created_at", &self.created_at)
            .field("version", &self.version)
            .finish()
    }
}

/// Compares two byte strings without an early exit on the first mismatch.
///
/// The length is not secret (both secrets have fixed lengths), so a length
/// mismatch returns immediately.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
