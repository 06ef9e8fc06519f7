use axum::RequestPartsExt;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};

use crate::error::KomikError;
use crate::router::KomikState;
use crate::service::Principal;
use crate::types::{PRIVILEGED_ROLES, Role};

/// Ensure the principal's role is in `allowed`.
pub fn ensure_role(principal: &Principal, allowed: &[Role]) -> Result<(), KomikError> {
    if principal.role.is_one_of(allowed) {
        Ok(())
    } else {
        Err(KomikError::Forbidden)
    }
}

/// Any caller with a valid bearer token whose security stamp is current.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl<S> FromRequestParts<S> for AuthUser
where
    KomikState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = KomikError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| KomikError::Unauthorized("Missing bearer token"))?;
        let state = KomikState::from_ref(state);
        let principal = state.auth.authenticate(bearer.token()).await?;
        Ok(Self(principal))
    }
}

/// Authenticated caller holding OWNER or ADMIN.
#[derive(Debug, Clone)]
pub struct Privileged(pub Principal);

impl<S> FromRequestParts<S> for Privileged
where
    KomikState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = KomikError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        ensure_role(&principal, PRIVILEGED_ROLES)?;
        Ok(Self(principal))
    }
}

/// Authenticated caller holding OWNER.
#[derive(Debug, Clone)]
pub struct OwnerOnly(pub Principal);

impl<S> FromRequestParts<S> for OwnerOnly
where
    KomikState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = KomikError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        ensure_role(&principal, &[Role::Owner])?;
        Ok(Self(principal))
    }
}
