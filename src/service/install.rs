//! One-time bootstrap: check status, validate database settings, create the
//! owner, finalize with a recovery key.

use crate::db::KomikStorage;
use crate::error::KomikError;
use crate::security::password::hash_password;
use crate::security::recovery::generate_recovery_key;
use crate::service::auth::{AuthService, RegisterRequest};
use crate::types::Role;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstallationStatus {
    pub is_installed: bool,
    pub has_owner: bool,
    pub database_connected: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_key: Option<String>,
}

impl StepOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
            recovery_key: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            recovery_key: None,
        }
    }
}

#[derive(Clone)]
pub struct InstallService {
    storage: KomikStorage,
    auth: AuthService,
}

impl InstallService {
    pub fn new(storage: KomikStorage, auth: AuthService) -> Self {
        Self { storage, auth }
    }

    pub async fn status(&self) -> InstallationStatus {
        let mut status = InstallationStatus {
            is_installed: false,
            has_owner: false,
            database_connected: false,
        };
        if let Err(e) = self.storage.ping().await {
            warn!(error = %e, "install status: database unreachable");
            return status;
        }
        status.database_connected = true;
        status.has_owner = self
            .storage
            .count_users_with_role(Role::Owner)
            .await
            .map(|n| n > 0)
            .unwrap_or(false);
        status.is_installed = self.storage.is_installed().await.unwrap_or(false);
        status
    }

    /// Check that the submitted settings form a usable connection URL.
    /// The running service keeps its own configured database.
    pub fn test_database(&self, settings: &DatabaseSettings) -> StepOutcome {
        if settings.host.trim().is_empty()
            || settings.username.trim().is_empty()
            || settings.database.trim().is_empty()
        {
            return StepOutcome::failed("Missing required fields");
        }
        match connection_url(settings) {
            Ok(_) => StepOutcome::ok(),
            Err(e) => StepOutcome::failed(e),
        }
    }

    pub async fn create_owner(&self, req: RegisterRequest) -> Result<StepOutcome, KomikError> {
        if self.storage.count_users_with_role(Role::Owner).await? > 0 {
            return Ok(StepOutcome::failed("Owner account already exists"));
        }
        match self.auth.create_user(req, Role::Owner).await {
            Ok(owner) => {
                info!(user_id = %owner.id, "install: owner account created");
                Ok(StepOutcome::ok())
            }
            Err(KomikError::Validation(msg) | KomikError::Conflict(msg)) => {
                Ok(StepOutcome::failed(msg))
            }
            Err(e) => Err(e),
        }
    }

    /// Generate the recovery key, store its hash and mark the install done.
    /// The plain key is returned exactly once.
    pub async fn complete(&self) -> Result<StepOutcome, KomikError> {
        if self.storage.count_users_with_role(Role::Owner).await? == 0 {
            return Ok(StepOutcome::failed("Owner account must be created first"));
        }
        if self.storage.is_installed().await? {
            return Ok(StepOutcome::failed("Already installed"));
        }

        let recovery_key = generate_recovery_key();
        let key_hash = hash_password(&recovery_key).await?;
        if !self.storage.mark_installed(&key_hash).await? {
            return Ok(StepOutcome::failed("Already installed"));
        }
        info!("install: completed, recovery key issued");
        Ok(StepOutcome {
            success: true,
            error: None,
            recovery_key: Some(recovery_key),
        })
    }
}

fn connection_url(settings: &DatabaseSettings) -> Result<Url, String> {
    let mut url = Url::parse(&format!("mysql://{}", settings.host.trim()))
        .map_err(|e| format!("Invalid host: {e}"))?;
    url.set_username(settings.username.trim())
        .map_err(|_| "Invalid username".to_string())?;
    if !settings.password.is_empty() {
        url.set_password(Some(&settings.password))
            .map_err(|_| "Invalid password".to_string())?;
    }
    url.set_port(Some(settings.port.unwrap_or(3306)))
        .map_err(|_| "Invalid port".to_string())?;
    url.set_path(settings.database.trim());
    Ok(url)
}
