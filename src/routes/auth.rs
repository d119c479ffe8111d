use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, header, request::Parts},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dao::models::UserEntity,
    dto::auth::{LoginForm, RegisterRequest, TokenResponse, UserSummary},
    error::AppError,
    routes::extract::{AppForm, AppJson},
    services::auth_service,
    state::SharedState,
};

/// Authenticated caller, resolved from an `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserEntity);

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| AppError::Unauthorized("not authenticated".into()))?;

        let user = auth_service::current_user(state, token).await?;
        Ok(CurrentUser(user))
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Account routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/users", get(list_users))
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserSummary),
        (status = 400, description = "Invalid payload or e-mail already registered"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserSummary>), AppError> {
    payload.validate()?;
    let user = auth_service::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for a bearer token (OAuth2 password flow).
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    AppForm(form): AppForm<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    Ok(Json(auth_service::login(&state, form).await?))
}

/// List every registered account.
#[utoipa::path(
    get,
    path = "/users",
    tag = "auth",
    responses((status = 200, description = "Registered users", body = [UserSummary]))
)]
pub async fn list_users(
    State(state): State<SharedState>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    Ok(Json(auth_service::list_users(&state).await?))
}

#[cfg(test)]
mod tests {
    use super::bearer_token;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer  abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
