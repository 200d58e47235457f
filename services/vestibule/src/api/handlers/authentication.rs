//! Authentication ceremony endpoints.

use super::extract_bearer_token;
use crate::flow::{
    AuthenticationOutcome, AuthenticationStep, BeginAuthenticationRequest, FlowError, FlowState,
    RefreshAccessTokenRequest, SendPromptRequest, SubmitPromptRequest, Tokens,
};
use axum::extract::Extension;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use std::sync::Arc;

// Steps answer 200, freshly issued tokens 201.
fn outcome_response(outcome: AuthenticationOutcome) -> Response {
    match outcome {
        AuthenticationOutcome::Step(step) => (StatusCode::OK, Json(step)).into_response(),
        AuthenticationOutcome::Tokens(tokens) => {
            (StatusCode::CREATED, Json(tokens)).into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/authentication/begin",
    request_body = BeginAuthenticationRequest,
    responses(
        (status = 200, description = "First pending step", body = AuthenticationStep),
        (status = 201, description = "Ceremony completed immediately", body = Tokens),
        (status = 400, description = "State does not match the ceremony")
    ),
    tag = "authentication"
)]
pub async fn begin(
    Extension(flow): Extension<Arc<FlowState>>,
    Json(request): Json<BeginAuthenticationRequest>,
) -> Result<Response, FlowError> {
    let outcome = flow.begin_authentication(request.scope).await?;
    Ok(outcome_response(outcome))
}

#[utoipa::path(
    post,
    path = "/v1/authentication/submit-prompt",
    request_body = SubmitPromptRequest,
    responses(
        (status = 200, description = "Accepted, next step pending", body = AuthenticationStep),
        (status = 201, description = "Ceremony completed", body = Tokens),
        (status = 400, description = "Component is not currently pending"),
        (status = 401, description = "Continuation state expired"),
        (status = 403, description = "Credential value rejected")
    ),
    tag = "authentication"
)]
pub async fn submit_prompt(
    Extension(flow): Extension<Arc<FlowState>>,
    Json(request): Json<SubmitPromptRequest>,
) -> Result<Response, FlowError> {
    let outcome = flow
        .submit_authentication_prompt(&request.id, &request.value, request.state.as_deref())
        .await?;
    Ok(outcome_response(outcome))
}

#[utoipa::path(
    post,
    path = "/v1/authentication/send-prompt",
    request_body = SendPromptRequest,
    responses(
        (status = 200, description = "Whether delivery was accepted", body = bool),
        (status = 400, description = "Component is not currently pending")
    ),
    tag = "authentication"
)]
pub async fn send_prompt(
    Extension(flow): Extension<Arc<FlowState>>,
    Json(request): Json<SendPromptRequest>,
) -> Result<Json<bool>, FlowError> {
    let sent = flow
        .send_authentication_prompt(&request.id, request.locale.as_deref(), request.state.as_deref())
        .await?;
    Ok(Json(sent))
}

#[utoipa::path(
    post,
    path = "/v1/authentication/refresh-access-token",
    request_body = RefreshAccessTokenRequest,
    responses(
        (status = 200, description = "Rotated token set", body = Tokens),
        (status = 403, description = "Refresh token or session rejected")
    ),
    tag = "authentication"
)]
pub async fn refresh_access_token(
    Extension(flow): Extension<Arc<FlowState>>,
    Json(request): Json<RefreshAccessTokenRequest>,
) -> Result<Json<Tokens>, FlowError> {
    let tokens = flow.issuer().refresh(&request.refresh_token).await?;
    Ok(Json(tokens))
}

#[utoipa::path(
    post,
    path = "/v1/authentication/sign-out",
    responses(
        (status = 200, description = "Whether a session was deleted", body = bool),
        (status = 403, description = "Bearer token rejected")
    ),
    security(("bearer" = [])),
    tag = "authentication"
)]
pub async fn sign_out(
    Extension(flow): Extension<Arc<FlowState>>,
    headers: HeaderMap,
) -> Result<Json<bool>, FlowError> {
    let access_token = extract_bearer_token(&headers).ok_or(FlowError::Forbidden)?;
    let deleted = flow.issuer().sign_out(&access_token).await?;
    Ok(Json(deleted))
}
