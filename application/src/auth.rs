//! Authorization of HTTP API requests.

use std::sync::Arc;

use axum::{
    async_trait, extract::FromRequestParts, Extension, RequestPartsExt as _,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use secrecy::{ExposeSecret as _, SecretString};
use subtle::ConstantTimeEq as _;

use crate::{define_error, AsError as _, Error};

/// Shared secret the trusted clients authorize their requests with.
#[derive(Clone, Debug)]
pub struct Secret(Arc<SecretString>);

impl From<SecretString> for Secret {
    fn from(secret: SecretString) -> Self {
        Self(Arc::new(secret))
    }
}

/// Proof of the HTTP request carrying a valid `Bearer` [`Secret`].
///
/// Extracting it rejects the request otherwise.
#[derive(Clone, Copy, Debug)]
pub struct Authorized;

#[async_trait]
impl<S> FromRequestParts<S> for Authorized
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let Extension(Secret(secret)) = parts
            .extract::<Extension<Secret>>()
            .await
            .map_err(|_| Error::internal(&"missing `Secret` extension"))?;

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                if e.is_missing() {
                    AuthError::AuthorizationRequired.into()
                } else {
                    e.into_error()
                }
            })?;

        let token = bearer.token().as_bytes();
        if !bool::from(token.ct_eq(secret.expose_secret().as_bytes())) {
            return Err(AuthError::InvalidSecret.into());
        }
        Ok(Self)
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INVALID_SECRET"]
        #[status = UNAUTHORIZED]
        #[message = "Provided `Bearer` secret is invalid"]
        InvalidSecret,
    }
}
