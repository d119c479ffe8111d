use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::UserEntity,
    dto::validation::{validate_not_blank, validate_password},
};

/// Payload used to create a new account.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    /// Display name, at most 120 characters.
    #[validate(length(max = 120), custom(function = "validate_not_blank"))]
    pub name: String,
    /// Stored trimmed and lowercased.
    #[serde(deserialize_with = "crate::dto::trimmed")]
    #[validate(email)]
    pub email: String,
    /// At most 72 UTF-8 bytes.
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

/// OAuth2 password-flow form (`application/x-www-form-urlencoded`).
/// `username` carries the account e-mail.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    /// Account e-mail.
    pub username: String,
    /// Plain-text password, checked against the stored hash.
    pub password: String,
}

/// Bearer token returned by a successful login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Signed JWT to send as `Authorization: Bearer <token>`.
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: String,
}

impl TokenResponse {
    /// Wrap a signed token with the `bearer` type.
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".into(),
        }
    }
}

/// Public projection of a user; never exposes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    /// User identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Lowercased e-mail.
    pub email: String,
}

impl From<UserEntity> for UserSummary {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}
