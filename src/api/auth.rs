//! Token endpoint

use axum::{extract::State, Form, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppError, error::AppResult, AppState};

/// OAuth2 password-flow form
#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always "bearer"
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/token",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse),
        (status = 422, description = "Missing form fields", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Form(form), _): WithRejection<Form<LoginForm>, AppError>,
) -> AppResult<Json<TokenResponse>> {
    let (token, _user) = state
        .services
        .auth
        .login(&form.username, &form.password)
        .await?;

    Ok(Json(TokenResponse {
        access_token: token.access_token,
        token_type: "bearer".to_string(),
        expires_in: token.expires_in,
    }))
}
