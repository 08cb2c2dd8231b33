//! Spotify settings on top of riffconfig
//!
//! [`SpotifyConfigExt`] adds the `accounts.spotify.*` accessors to
//! `riffconfig::Config`.

use crate::api::{DEFAULT_ACCOUNTS_BASE, DEFAULT_API_BASE};
use anyhow::{Result, anyhow};
use riffconfig::Config;
use riffconfig::encryption;
use serde_yaml::Value;

const SPOTIFY_PATH: [&str; 2] = ["accounts", "spotify"];

fn spotify_key(key: &str) -> [&str; 3] {
    [SPOTIFY_PATH[0], SPOTIFY_PATH[1], key]
}

/// Extension trait for Spotify settings
///
/// ```rust,ignore
/// use riffconfig::get_config;
/// use riffspotify::SpotifyConfigExt;
///
/// let config = get_config();
/// let (client_id, client_secret) = config.get_spotify_credentials()?;
/// ```
pub trait SpotifyConfigExt {
    /// Application client id
    ///
    /// # Errors
    ///
    /// Fails when no client id is configured
    fn get_spotify_client_id(&self) -> Result<String>;

    fn set_spotify_client_id(&self, client_id: &str) -> Result<()>;

    /// Application client secret, decrypted if stored encrypted
    fn get_spotify_client_secret(&self) -> Result<String>;

    /// Stores the client secret encrypted
    fn set_spotify_client_secret(&self, secret: &str) -> Result<()>;

    /// Both credentials at once
    fn get_spotify_credentials(&self) -> Result<(String, String)>;

    /// Web API base URL, `https://api.spotify.com` unless overridden
    fn get_spotify_api_base(&self) -> String;

    /// Accounts service base URL, `https://accounts.spotify.com` unless overridden
    fn get_spotify_accounts_base(&self) -> String;
}

impl SpotifyConfigExt for Config {
    fn get_spotify_client_id(&self) -> Result<String> {
        self.get_string(&spotify_key("client_id"))
            .ok_or_else(|| anyhow!("Spotify client id is not configured"))
    }

    fn set_spotify_client_id(&self, client_id: &str) -> Result<()> {
        self.set_value(&spotify_key("client_id"), Value::String(client_id.to_string()))
    }

    fn get_spotify_client_secret(&self) -> Result<String> {
        self.get_secret(&spotify_key("client_secret"))?
            .ok_or_else(|| anyhow!("Spotify client secret is not configured"))
    }

    fn set_spotify_client_secret(&self, secret: &str) -> Result<()> {
        let encrypted = encryption::encrypt_password(secret)?;
        self.set_value(&spotify_key("client_secret"), Value::String(encrypted))
    }

    fn get_spotify_credentials(&self) -> Result<(String, String)> {
        Ok((
            self.get_spotify_client_id()?,
            self.get_spotify_client_secret()?,
        ))
    }

    fn get_spotify_api_base(&self) -> String {
        self.get_string(&spotify_key("api_base"))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    fn get_spotify_accounts_base(&self) -> String {
        self.get_string(&spotify_key("accounts_base"))
            .unwrap_or_else(|| DEFAULT_ACCOUNTS_BASE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_defaults() {
        let (_dir, config) = config();
        assert!(config.get_spotify_client_id().is_err());
        assert!(config.get_spotify_credentials().is_err());
        assert_eq!(config.get_spotify_api_base(), "https://api.spotify.com");
        assert_eq!(
            config.get_spotify_accounts_base(),
            "https://accounts.spotify.com"
        );
    }

    #[test]
    fn test_secret_is_stored_encrypted() {
        // no machine id, no encryption key
        if encryption::encrypt_password("machine-id-check").is_err() {
            return;
        }
        let (_dir, config) = config();
        config.set_spotify_client_id("my-client").unwrap();
        config.set_spotify_client_secret("s3cr3t").unwrap();

        let raw = config.get_string(&spotify_key("client_secret")).unwrap();
        assert!(encryption::is_encrypted(&raw));
        assert_eq!(
            config.get_spotify_credentials().unwrap(),
            ("my-client".to_string(), "s3cr3t".to_string())
        );
    }
}
