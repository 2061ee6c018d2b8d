//! Stage configuration.

use super::token::{DEFAULT_ALGORITHM, DEFAULT_RANDOM_SOURCE};

/// Tunable surface of the access-control stage.
///
/// Defaults match production use: identity caching on, proxy-cache
/// suppression on, MD5 token digest over a crypto-strong random source.
#[derive(Clone, Debug)]
pub struct StageConfig {
    algorithm: String,
    cache: bool,
    disable_proxy_caching: bool,
    random_source: String,
    entropy: Option<String>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StageConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: DEFAULT_ALGORITHM.to_string(),
            cache: true,
            disable_proxy_caching: true,
            random_source: DEFAULT_RANDOM_SOURCE.to_string(),
            entropy: None,
        }
    }

    /// Message digest used for SSO token generation.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    /// Cache authenticated principals in the session.
    #[must_use]
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Add headers that forbid intermediary caching of protected responses.
    #[must_use]
    pub fn with_disable_proxy_caching(mut self, disable: bool) -> Self {
        self.disable_proxy_caching = disable;
        self
    }

    /// Named random source backing token generation.
    #[must_use]
    pub fn with_random_source(mut self, random_source: impl Into<String>) -> Self {
        self.random_source = random_source.into();
        self
    }

    /// Extra entropy mixed into the random seed.
    #[must_use]
    pub fn with_entropy(mut self, entropy: impl Into<String>) -> Self {
        self.entropy = Some(entropy.into());
        self
    }

    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    #[must_use]
    pub fn cache(&self) -> bool {
        self.cache
    }

    #[must_use]
    pub fn disable_proxy_caching(&self) -> bool {
        self.disable_proxy_caching
    }

    #[must_use]
    pub fn random_source(&self) -> &str {
        &self.random_source
    }

    #[must_use]
    pub fn entropy(&self) -> Option<&str> {
        self.entropy.as_deref()
    }
}
