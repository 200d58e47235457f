//! HTTP surface tests driven through the router without binding a port.

mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header::AUTHORIZATION, header::CONTENT_TYPE, Request, StatusCode};
use ceremony::CeremonyNode;
use common::{email_draft, harness, password_draft, seed_identity, VALIDATION_CODE};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn email_then_password() -> CeremonyNode {
    CeremonyNode::sequence(vec![
        CeremonyNode::component("email"),
        CeremonyNode::component("password"),
    ])
}

async fn json_body(response: axum::response::Response) -> Result<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

fn post(uri: &str, payload: &Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))?)
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    let harness = harness(&email_then_password());
    let app = vestibule::api::app(harness.flow);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    assert_eq!(body["name"], json!("vestibule"));
    assert_eq!(body["documents"], json!("ok"));
    Ok(())
}

#[tokio::test]
async fn authentication_over_http_completes_with_created() -> Result<()> {
    let harness = harness(&email_then_password());
    seed_identity(
        &harness.documents,
        "identity-1",
        vec![email_draft("ada@example.com", true), password_draft("lovelace")],
    )
    .await;
    let app = vestibule::api::app(harness.flow);

    let response = app
        .clone()
        .oneshot(post("/v1/authentication/begin", &json!({ "scope": [] }))?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let step = json_body(response).await?;
    assert_eq!(step["current"]["kind"], json!("component"));
    assert_eq!(step["current"]["id"], json!("email"));
    let state = step["state"].as_str().expect("state token").to_string();

    let response = app
        .clone()
        .oneshot(post(
            "/v1/authentication/submit-prompt",
            &json!({ "id": "email", "value": "ada@example.com", "state": state }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let step = json_body(response).await?;
    let state = step["state"].as_str().expect("state token").to_string();

    let response = app
        .clone()
        .oneshot(post(
            "/v1/authentication/submit-prompt",
            &json!({ "id": "password", "value": "lovelace", "state": state }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let tokens = json_body(response).await?;
    assert!(tokens["access_token"].is_string());
    assert!(tokens["refresh_token"].is_string());

    // The refresh endpoint accepts what we just minted.
    let response = app
        .oneshot(post(
            "/v1/authentication/refresh-access-token",
            &json!({ "refresh_token": tokens["refresh_token"] }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_return_forbidden_with_error_body() -> Result<()> {
    let harness = harness(&email_then_password());
    let app = vestibule::api::app(harness.flow);

    let response = app
        .clone()
        .oneshot(post("/v1/authentication/begin", &json!({}))?)
        .await?;
    let step = json_body(response).await?;
    let state = step["state"].as_str().expect("state token").to_string();

    let response = app
        .oneshot(post(
            "/v1/authentication/submit-prompt",
            &json!({ "id": "email", "value": "nobody@example.com", "state": state }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await?;
    assert_eq!(body["error"], json!("authentication_submit_prompt"));
    Ok(())
}

#[tokio::test]
async fn out_of_turn_component_is_bad_request() -> Result<()> {
    let harness = harness(&email_then_password());
    let app = vestibule::api::app(harness.flow);

    let response = app
        .oneshot(post(
            "/v1/authentication/submit-prompt",
            &json!({ "id": "password", "value": "lovelace" }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await?;
    assert_eq!(body["error"], json!("invalid_authentication_state"));
    Ok(())
}

#[tokio::test]
async fn registration_over_http_completes_with_created() -> Result<()> {
    let harness = harness(&email_then_password());
    let app = vestibule::api::app(harness.flow);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/registration/begin")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let step = json_body(response).await?;
    assert_eq!(step["validating"], json!(false));
    let state = step["state"].as_str().expect("state token").to_string();

    let response = app
        .clone()
        .oneshot(post(
            "/v1/registration/submit-prompt",
            &json!({ "id": "email", "value": "ada@example.com", "state": state }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let step = json_body(response).await?;
    assert_eq!(step["validating"], json!(true));
    let state = step["state"].as_str().expect("state token").to_string();

    let response = app
        .clone()
        .oneshot(post(
            "/v1/registration/send-validation-code",
            &json!({ "id": "email", "state": state }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let sent = json_body(response).await?;
    assert_eq!(sent, json!(true));

    let response = app
        .clone()
        .oneshot(post(
            "/v1/registration/submit-validation-code",
            &json!({ "id": "email", "value": VALIDATION_CODE, "state": state }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let step = json_body(response).await?;
    assert_eq!(step["validating"], json!(false));
    let state = step["state"].as_str().expect("state token").to_string();

    let response = app
        .oneshot(post(
            "/v1/registration/submit-prompt",
            &json!({ "id": "password", "value": "lovelace", "state": state }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let tokens = json_body(response).await?;
    assert!(tokens["access_token"].is_string());
    Ok(())
}

#[tokio::test]
async fn sign_out_requires_a_bearer_token() -> Result<()> {
    let harness = harness(&email_then_password());
    let app = vestibule::api::app(harness.flow);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/authentication/sign-out")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/authentication/sign-out")
                .header(AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}
