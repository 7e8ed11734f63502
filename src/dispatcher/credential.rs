//! Credentials and the credential pool
//!
//! Credentials are loaded once at startup from a fixed list of configuration
//! slots. Empty slots are dropped; an empty pool is a fatal startup error.

use crate::logging::mask_secret;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Configuration slots read at startup, in pool order
///
/// There are more slots than features so that unassigned credentials can
/// provide extra fallback capacity.
pub const CREDENTIAL_SLOTS: [&str; 10] = [
    "GEMINI_API_KEY",
    "GEMINI_API_KEY_1",
    "GEMINI_API_KEY_2",
    "GEMINI_API_KEY_3",
    "GEMINI_API_KEY_4",
    "GEMINI_API_KEY_5",
    "GEMINI_API_KEY_6",
    "GEMINI_API_KEY_7",
    "GEMINI_API_KEY_8",
    "GEMINI_API_KEY_9",
];

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("At least one GEMINI_API_KEY credential is required")]
    NoCredentialsConfigured,
}

// ============================================================================
// Credential
// ============================================================================

/// A named API key
///
/// Cheap to clone. The secret is never exposed through `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    name: Arc<str>,
    secret: Arc<str>,
}

impl Credential {
    pub fn new(name: impl Into<Arc<str>>, secret: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// The API key to send to the provider
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("secret", &mask_secret(&self.secret))
            .finish()
    }
}

// ============================================================================
// Credential Pool
// ============================================================================

/// Ordered, immutable set of usable credentials
#[derive(Debug, Clone)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
}

impl CredentialPool {
    /// Build a pool from `(name, secret)` slots
    ///
    /// Slots with a missing or blank secret are discarded, as are repeated
    /// names (first one wins). Fails if nothing is left.
    pub fn from_slots<I, N, S>(slots: I) -> Result<Self, PoolError>
    where
        I: IntoIterator<Item = (N, Option<S>)>,
        N: Into<Arc<str>>,
        S: AsRef<str>,
    {
        let mut credentials: Vec<Credential> = Vec::new();

        for (name, secret) in slots {
            let Some(secret) = secret else { continue };
            let secret = secret.as_ref().trim();
            if secret.is_empty() {
                continue;
            }
            let name: Arc<str> = name.into();
            if credentials.iter().any(|c| c.name() == &*name) {
                tracing::warn!(credential = %name, "Ignoring duplicate credential slot");
                continue;
            }
            credentials.push(Credential::new(name, secret));
        }

        if credentials.is_empty() {
            return Err(PoolError::NoCredentialsConfigured);
        }

        tracing::info!(
            credential_count = credentials.len(),
            credentials = ?credentials.iter().map(Credential::name).collect::<Vec<_>>(),
            "Loaded credentials for feature rotation with automatic fallback"
        );

        Ok(Self { credentials })
    }

    /// Convenience constructor from plain `(name, secret)` pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self, PoolError> {
        Self::from_slots(pairs.into_iter().map(|(name, secret)| (name, Some(secret))))
    }

    pub fn get(&self, name: &str) -> Option<&Credential> {
        self.credentials.iter().find(|c| c.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.credentials.iter().map(Credential::name)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slots_are_discarded() {
        let pool = CredentialPool::from_slots([
            ("GEMINI_API_KEY", None),
            ("GEMINI_API_KEY_1", Some("key-1")),
            ("GEMINI_API_KEY_2", Some("")),
            ("GEMINI_API_KEY_3", Some("   ")),
            ("GEMINI_API_KEY_4", Some("key-4")),
        ])
        .unwrap();

        assert_eq!(pool.len(), 2);
        let names: Vec<&str> = pool.names().collect();
        assert_eq!(names, vec!["GEMINI_API_KEY_1", "GEMINI_API_KEY_4"]);
        assert_eq!(pool.get("GEMINI_API_KEY_4").unwrap().secret(), "key-4");
    }

    #[test]
    fn test_empty_pool_is_fatal() {
        let result = CredentialPool::from_slots([("GEMINI_API_KEY", None::<&str>)]);
        assert_eq!(result.unwrap_err(), PoolError::NoCredentialsConfigured);

        let result = CredentialPool::from_pairs([("A", ""), ("B", " ")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let pool = CredentialPool::from_pairs([("A", "first"), ("A", "second")]).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.get("A").unwrap().secret(), "first");
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let cred = Credential::new("GEMINI_API_KEY", "AIzaSyD-super-secret-value");
        let debug = format!("{:?}", cred);
        assert!(debug.contains("GEMINI_API_KEY"));
        assert!(!debug.contains("super-secret"));
    }
}
