//! Keyring-based credential storage for the Subsonic account

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use keyring::Entry;
use tracing::{debug, info};

use crate::service::SubsonicClient;

const KEYRING_SERVICE: &str = "tunedl";

/// Subsonic server credentials
#[derive(Debug, Clone)]
pub struct SubsonicCredentials {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl SubsonicCredentials {
    pub fn client(&self, page_size: u32) -> Result<SubsonicClient> {
        Ok(SubsonicClient::new(&self.url, &self.username, &self.password)?.with_page_size(page_size))
    }
}

/// Manages authentication credentials storage
pub struct AuthManager;

impl AuthManager {
    /// Authenticate with the Subsonic server
    ///
    /// Reuses keyring credentials unless `force` is set, otherwise prompts for
    /// whatever was not given. New credentials are verified before storing.
    pub async fn authenticate(
        url: Option<String>,
        username: Option<String>,
        password: Option<String>,
        force: bool,
    ) -> Result<SubsonicCredentials> {
        if !force {
            if let Ok(creds) = Self::load() {
                info!("Found existing credentials in keyring");
                return Ok(creds);
            }
        } else {
            debug!("Force flag set, ignoring stored credentials");
        }

        let url = match url {
            Some(url) => url,
            None => Input::new()
                .with_prompt("Subsonic server URL")
                .interact_text()
                .context("Failed to read URL")?,
        };

        let username = match username {
            Some(username) => username,
            None => Input::new()
                .with_prompt("Username")
                .interact_text()
                .context("Failed to read username")?,
        };

        let password = match password {
            Some(password) => password,
            None => Password::new()
                .with_prompt("Password")
                .interact()
                .context("Failed to read password")?,
        };

        let creds = SubsonicCredentials {
            url: url.trim_end_matches('/').to_string(),
            username,
            password,
        };

        Self::verify(&creds).await?;

        Self::store(&creds)?;
        info!("Credentials stored in keyring");

        Ok(creds)
    }

    /// Load credentials from keyring
    pub fn load() -> Result<SubsonicCredentials> {
        let url = Self::get_entry("url")?
            .get_password()
            .context("No Subsonic URL in keyring")?;

        let username = Self::get_entry("username")?
            .get_password()
            .context("No Subsonic username in keyring")?;

        let password = Self::get_entry("password")?
            .get_password()
            .context("No Subsonic password in keyring")?;

        Ok(SubsonicCredentials {
            url,
            username,
            password,
        })
    }

    /// Load stored credentials, pointing at `tunedl auth` when there are none
    pub fn require() -> Result<SubsonicCredentials> {
        Self::load().context("Not authenticated. Run `tunedl auth` first")
    }

    /// Store credentials in keyring
    pub fn store(creds: &SubsonicCredentials) -> Result<()> {
        Self::get_entry("url")?
            .set_password(&creds.url)
            .context("Failed to store URL in keyring")?;

        Self::get_entry("username")?
            .set_password(&creds.username)
            .context("Failed to store username in keyring")?;

        Self::get_entry("password")?
            .set_password(&creds.password)
            .context("Failed to store password in keyring")?;

        debug!("Credentials stored in keyring");
        Ok(())
    }

    /// Verify credentials by pinging the Subsonic server
    async fn verify(creds: &SubsonicCredentials) -> Result<()> {
        debug!("Verifying credentials against {}", creds.url);

        let client = SubsonicClient::new(&creds.url, &creds.username, &creds.password)?;
        client.ping().await.context("Failed to verify credentials")?;

        info!("Credentials verified successfully");
        Ok(())
    }

    fn get_entry(key: &str) -> Result<Entry> {
        let entry_key = format!("subsonic:{}", key);
        Entry::new(KEYRING_SERVICE, &entry_key).context("Failed to access keyring")
    }
}
