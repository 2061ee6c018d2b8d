//! SSO token generation.
//!
//! Tokens are 16 random bytes run through a message digest and rendered as
//! uppercase hex, so a token is twice the digest output length in characters
//! (32 for the default MD5). The random source is seeded from the current time
//! mixed with a configurable entropy string; generation is serialized per
//! generator instance because the draw and the digest must not interleave
//! across threads.

use md5::{Digest, Md5};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha1::Sha1;
use sha2::Sha256;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use super::error::GateError;

/// Digest used when the configured algorithm name does not resolve.
pub const DEFAULT_ALGORITHM: &str = "MD5";

/// Random source used when none is configured.
pub const DEFAULT_RANDOM_SOURCE: &str = "chacha20";

/// Number of random bytes drawn per token.
const TOKEN_BYTES: usize = 16;

/// Message digest applied to the random bytes of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "MD5" => Some(Self::Md5),
            "SHA-1" | "SHA1" => Some(Self::Sha1),
            "SHA-256" | "SHA256" => Some(Self::Sha256),
            _ => None,
        }
    }

    #[must_use]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Md5 => Md5::digest(data).to_vec(),
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    #[must_use]
    pub fn output_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }
}

/// Generator for opaque SSO tokens.
///
/// Built eagerly at stage construction; the mutex only serializes token
/// generation, not initialization.
pub struct TokenGenerator {
    algorithm: DigestAlgorithm,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGenerator")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenGenerator {
    /// Resolve the digest and seed the random source.
    ///
    /// An unknown algorithm name falls back to [`DEFAULT_ALGORITHM`]; if that
    /// too fails to resolve the generator is unusable and construction errors.
    pub fn new(
        algorithm_name: &str,
        random_source: &str,
        entropy: &str,
    ) -> Result<Self, GateError> {
        let algorithm = DigestAlgorithm::from_name(algorithm_name)
            .or_else(|| {
                warn!("Unknown digest algorithm {algorithm_name:?}, using {DEFAULT_ALGORITHM}");
                DigestAlgorithm::from_name(DEFAULT_ALGORITHM)
            })
            .ok_or_else(|| GateError::DigestUnavailable(algorithm_name.to_string()))?;

        let seed = mix_seed(now_millis(), entropy);
        Ok(Self {
            algorithm,
            rng: Mutex::new(build_random(random_source, seed)),
        })
    }

    /// Generator with an injected random source, for deterministic tests.
    #[must_use]
    pub fn with_rng(algorithm: DigestAlgorithm, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            algorithm,
            rng: Mutex::new(rng),
        }
    }

    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Draw, digest, and hex-render a fresh token.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.fill_bytes(&mut bytes);
        to_hex_upper(&self.algorithm.digest(&bytes))
    }
}

/// Mix the entropy string into a time-based seed.
///
/// Each byte is sign-extended and shifted left by `(index % 8) * 8` bits
/// before being XORed in, so an eight-byte window of the string perturbs the
/// whole seed.
#[must_use]
pub(crate) fn mix_seed(now_millis: i64, entropy: &str) -> u64 {
    let mut seed = now_millis;
    for (index, byte) in entropy.bytes().enumerate() {
        seed ^= i64::from(byte as i8) << ((index % 8) * 8);
    }
    u64::from_ne_bytes(seed.to_ne_bytes())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(0))
}

/// Construct the named random source, falling back to a freshly-entropied
/// default when the name is unknown.
fn build_random(name: &str, seed: u64) -> Box<dyn RngCore + Send> {
    match name.trim().to_ascii_lowercase().as_str() {
        "chacha20" | "chacha" => Box::new(ChaCha20Rng::seed_from_u64(seed)),
        other => {
            debug!("Unknown random source {other:?}, using default seeding");
            Box::new(StdRng::from_entropy())
        }
    }
}

fn to_hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect()
}
