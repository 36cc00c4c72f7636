use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "tonal-client";

/// Tonal account passwords kept in the OS keychain, keyed by username.
///
/// A missing entry is not an error: lookups return `None` and deletes
/// succeed. Backend failures (locked keychain, no secret service) are
/// reported so callers can tell them apart from "nothing saved".
pub struct CredentialStore;

impl CredentialStore {
    pub fn store(username: &str, password: &str) -> Result<()> {
        entry(username)?
            .set_password(password)
            .with_context(|| format!("Failed to save password for {} in keychain", username))
    }

    /// The saved password for `username`, if there is one.
    pub fn get_password(username: &str) -> Result<Option<String>> {
        missing_as_none(entry(username)?.get_password())
            .with_context(|| format!("Failed to read password for {} from keychain", username))
    }

    pub fn delete(username: &str) -> Result<()> {
        missing_as_none(entry(username)?.delete_credential())
            .map(|_| ())
            .with_context(|| format!("Failed to remove password for {} from keychain", username))
    }
}

fn entry(username: &str) -> Result<Entry> {
    Entry::new(SERVICE_NAME, username).context("Failed to open keychain entry")
}

fn missing_as_none<T>(result: keyring::Result<T>) -> keyring::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entry_is_none() {
        assert_eq!(missing_as_none(Ok("hunter2".to_string())).unwrap().as_deref(), Some("hunter2"));
        assert!(missing_as_none::<String>(Err(keyring::Error::NoEntry)).unwrap().is_none());
    }

    #[test]
    fn test_backend_failure_is_an_error() {
        let err = missing_as_none::<()>(Err(keyring::Error::NoStorageAccess(
            "locked".into(),
        )))
        .unwrap_err();
        assert!(matches!(err, keyring::Error::NoStorageAccess(_)));
    }
}
