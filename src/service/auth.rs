use crate::db::models::DbUser;
use crate::db::sqlite::KEY_RECOVERY_KEY_HASH;
use crate::db::{KomikStorage, NewUser};
use crate::error::KomikError;
use crate::security::TokenService;
use crate::security::password::{burn_verification, hash_password, verify_password};
use crate::security::recovery::normalize_recovery_key;
use crate::service::validation::{
    PASSWORD_MIN, normalize_email, validate_email, validate_password, validate_username,
};
use crate::types::Role;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, info};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverRequest {
    pub recovery_key: String,
    pub new_password: String,
}

/// Authenticated caller, resolved from the stored user rather than the token.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
}

impl From<&DbUser> for Principal {
    fn from(u: &DbUser) -> Self {
        Self {
            id: u.id.clone(),
            email: u.email.clone(),
            username: u.username.clone(),
            role: u.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserView {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: AuthUserView,
}

#[derive(Clone)]
pub struct AuthService {
    storage: KomikStorage,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(storage: KomikStorage, tokens: TokenService) -> Self {
        Self { storage, tokens }
    }

    fn respond(&self, user: &DbUser) -> Result<AuthResponse, KomikError> {
        Ok(AuthResponse {
            access_token: self.tokens.issue(user)?,
            user: AuthUserView {
                id: user.id.clone(),
                email: user.email.clone(),
                username: user.username.clone(),
                role: user.role,
                avatar_url: user.avatar_url.clone(),
            },
        })
    }

    /// Validate input, reject duplicates and insert a user with `role`.
    pub async fn create_user(
        &self,
        req: RegisterRequest,
        role: Role,
    ) -> Result<DbUser, KomikError> {
        let email = normalize_email(&req.email);
        validate_email(&email)?;
        validate_username(&req.username)?;
        validate_password(&req.password)?;

        if self.storage.find_user_by_email(&email).await?.is_some() {
            return Err(KomikError::conflict("Email already registered"));
        }
        if self
            .storage
            .find_user_by_username(&req.username)
            .await?
            .is_some()
        {
            return Err(KomikError::conflict("Username already taken"));
        }

        let password_hash = hash_password(&req.password).await?;
        self.storage
            .insert_user(NewUser {
                email,
                username: req.username,
                password_hash,
                role,
            })
            .await
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, KomikError> {
        let user = self.create_user(req, Role::Member).await?;
        info!(user_id = %user.id, username = %user.username, "user registered");
        self.respond(&user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, KomikError> {
        let email = normalize_email(&req.email);
        validate_email(&email)?;
        if req.password.chars().count() < PASSWORD_MIN {
            return Err(KomikError::validation(format!(
                "password must be at least {PASSWORD_MIN} characters"
            )));
        }

        let Some(user) = self.storage.find_user_by_email(&email).await? else {
            burn_verification(&req.password).await;
            debug!("login rejected: unknown email");
            return Err(KomikError::Unauthorized(INVALID_CREDENTIALS));
        };
        if !verify_password(&req.password, &user.password_hash).await? {
            debug!(user_id = %user.id, "login rejected: password mismatch");
            return Err(KomikError::Unauthorized(INVALID_CREDENTIALS));
        }

        self.storage.touch_last_login(&user.id).await?;
        self.respond(&user)
    }

    /// Resolve a bearer token to the current user, rejecting tokens whose
    /// stamp no longer matches.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, KomikError> {
        let claims = self.tokens.decode(token)?;
        let Some(user) = self.storage.find_user_by_id(&claims.sub).await? else {
            return Err(KomikError::Unauthorized("User not found"));
        };
        let stamp_matches: bool = user
            .security_stamp
            .as_bytes()
            .ct_eq(claims.security_stamp.as_bytes())
            .into();
        if !stamp_matches {
            return Err(KomikError::Unauthorized("Token has been invalidated"));
        }
        Ok(Principal::from(&user))
    }

    /// Verify the current password, store the new one and rotate the stamp.
    /// Every token issued before this call stops verifying.
    pub async fn change_password(
        &self,
        principal: &Principal,
        req: ChangePasswordRequest,
    ) -> Result<AuthResponse, KomikError> {
        validate_password(&req.new_password)?;
        let user = self
            .storage
            .find_user_by_id(&principal.id)
            .await?
            .ok_or(KomikError::Unauthorized("User not found"))?;
        if !verify_password(&req.current_password, &user.password_hash).await? {
            return Err(KomikError::Unauthorized(INVALID_CREDENTIALS));
        }

        let password_hash = hash_password(&req.new_password).await?;
        self.storage.update_password(&user.id, &password_hash).await?;
        info!(user_id = %user.id, "password changed; previous tokens invalidated");

        let refreshed = self
            .storage
            .find_user_by_id(&user.id)
            .await?
            .ok_or(KomikError::NotFound("User"))?;
        self.respond(&refreshed)
    }

    /// Reset the owner's password with the installation recovery key.
    /// The key is burned on success.
    pub async fn recover(&self, req: RecoverRequest) -> Result<AuthResponse, KomikError> {
        validate_password(&req.new_password)?;
        let Some(stored_hash) = self.storage.get_config(KEY_RECOVERY_KEY_HASH).await? else {
            return Err(KomikError::Unauthorized("Invalid recovery key"));
        };
        let key = normalize_recovery_key(&req.recovery_key);
        if !verify_password(&key, &stored_hash).await? {
            return Err(KomikError::Unauthorized("Invalid recovery key"));
        }
        let owner = self
            .storage
            .find_owner()
            .await?
            .ok_or(KomikError::NotFound("Owner account"))?;

        let password_hash = hash_password(&req.new_password).await?;
        self.storage
            .redeem_recovery_key(&owner.id, &password_hash)
            .await?;
        info!(user_id = %owner.id, "owner password reset with recovery key");

        let refreshed = self
            .storage
            .find_user_by_id(&owner.id)
            .await?
            .ok_or(KomikError::NotFound("User"))?;
        self.respond(&refreshed)
    }
}
