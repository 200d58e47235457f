//! Registration ceremony endpoints.

use crate::flow::{
    FlowError, FlowState, RegistrationOutcome, RegistrationStep, SendPromptRequest,
    SubmitPromptRequest, Tokens,
};
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use std::sync::Arc;

fn outcome_response(outcome: RegistrationOutcome) -> Response {
    match outcome {
        RegistrationOutcome::Step(step) => (StatusCode::OK, Json(step)).into_response(),
        RegistrationOutcome::Tokens(tokens) => (StatusCode::CREATED, Json(tokens)).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/registration/begin",
    responses(
        (status = 200, description = "First setup step", body = RegistrationStep),
        (status = 201, description = "Ceremony completed immediately", body = Tokens)
    ),
    tag = "registration"
)]
pub async fn begin(Extension(flow): Extension<Arc<FlowState>>) -> Result<Response, FlowError> {
    let outcome = flow.begin_registration().await?;
    Ok(outcome_response(outcome))
}

#[utoipa::path(
    post,
    path = "/v1/registration/submit-prompt",
    request_body = SubmitPromptRequest,
    responses(
        (status = 200, description = "Component set up, next step pending", body = RegistrationStep),
        (status = 201, description = "Ceremony completed", body = Tokens),
        (status = 400, description = "Component is not a current candidate"),
        (status = 403, description = "Setup value rejected"),
        (status = 409, description = "Identification already registered")
    ),
    tag = "registration"
)]
pub async fn submit_prompt(
    Extension(flow): Extension<Arc<FlowState>>,
    Json(request): Json<SubmitPromptRequest>,
) -> Result<Response, FlowError> {
    let outcome = flow
        .submit_registration_prompt(&request.id, &request.value, request.state.as_deref())
        .await?;
    Ok(outcome_response(outcome))
}

#[utoipa::path(
    post,
    path = "/v1/registration/send-validation-code",
    request_body = SendPromptRequest,
    responses(
        (status = 200, description = "Whether delivery was accepted", body = bool),
        (status = 400, description = "No component awaiting validation")
    ),
    tag = "registration"
)]
pub async fn send_validation_code(
    Extension(flow): Extension<Arc<FlowState>>,
    Json(request): Json<SendPromptRequest>,
) -> Result<Json<bool>, FlowError> {
    let sent = flow
        .send_registration_validation_code(
            &request.id,
            request.locale.as_deref(),
            request.state.as_deref(),
        )
        .await?;
    Ok(Json(sent))
}

#[utoipa::path(
    post,
    path = "/v1/registration/submit-validation-code",
    request_body = SubmitPromptRequest,
    responses(
        (status = 200, description = "Component confirmed, next step pending", body = RegistrationStep),
        (status = 201, description = "Ceremony completed", body = Tokens),
        (status = 400, description = "No component awaiting validation"),
        (status = 403, description = "Validation code rejected"),
        (status = 409, description = "Identification already registered")
    ),
    tag = "registration"
)]
pub async fn submit_validation_code(
    Extension(flow): Extension<Arc<FlowState>>,
    Json(request): Json<SubmitPromptRequest>,
) -> Result<Response, FlowError> {
    let outcome = flow
        .submit_registration_validation_code(&request.id, &request.value, request.state.as_deref())
        .await?;
    Ok(outcome_response(outcome))
}
