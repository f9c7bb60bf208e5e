//! Communication token generation.
//!
//! The communication token is the locally generated secret that authenticates
//! this instance to the platform during registration. Generation sits behind a
//! trait so tests can supply deterministic values.

use rand::RngCore;
use rand::rngs::OsRng;

/// Number of random bytes backing a communication token.
pub const TOKEN_ENTROPY_BYTES: usize = 32;

/// Source of communication tokens.
pub trait TokenGenerator: Send + Sync {
    /// Produces a fresh URL-safe token. Implementations must never return the
    /// same value twice.
    fn generate(&self) -> String;
}

/// Production token generator backed by the operating system RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlSafeTokenGenerator;

impl TokenGenerator for UrlSafeTokenGenerator {
    fn generate(&self) -> String {
        let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        base64_url::encode(&bytes)
    }
}
