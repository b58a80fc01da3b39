use anyhow::Context;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::domain::{SubscriberEmail, VerificationCode};
use crate::email_client::EmailClient;
use crate::routes::message_page;
use crate::startup::AppState;
use crate::utils::error_chain_fmt;
use crate::verification::{VerificationError, VerificationFlow};

#[derive(thiserror::Error)]
pub enum RequestCodeError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for RequestCodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for RequestCodeError {
    fn into_response(self) -> Response {
        match &self {
            Self::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                message_page("Invalid email", message),
            )
                .into_response(),
            Self::UnexpectedError(_) => {
                tracing::error!(error.cause_chain = ?self, "Failed to issue a verification code.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message_page("Something went wrong", "We could not send you a verification code. Please try again later."),
                )
                    .into_response()
            }
        }
    }
}

#[derive(thiserror::Error)]
pub enum ConfirmError {
    #[error("{0}")]
    ValidationError(String),
    #[error("The verification code was rejected.")]
    InvalidCode(#[source] VerificationError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ConfirmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for ConfirmError {
    fn into_response(self) -> Response {
        match &self {
            Self::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                message_page("Invalid input", message),
            )
                .into_response(),
            Self::InvalidCode(reason) => (
                StatusCode::UNAUTHORIZED,
                message_page("Invalid verification code", &reason.to_string()),
            )
                .into_response(),
            Self::UnexpectedError(_) => {
                tracing::error!(error.cause_chain = ?self, "Failed to confirm a verification code.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message_page("Something went wrong", "Please try again later."),
                )
                    .into_response()
            }
        }
    }
}

/// Validates the address, then issues and mails a code for `flow`.
///
/// Unsubscribe codes are only mailed to registered addresses; the visitor
/// sees the same outcome either way.
pub(crate) async fn request_code(
    state: &AppState,
    email: String,
    flow: VerificationFlow,
) -> Result<SubscriberEmail, RequestCodeError> {
    let email = SubscriberEmail::parse(email).map_err(RequestCodeError::ValidationError)?;
    if flow == VerificationFlow::Unsubscribe
        && !state
            .registry
            .is_registered(&email)
            .await
            .context("Failed to look up the subscriber.")?
    {
        tracing::info!("Not sending an unsubscribe code to an unknown address.");
        return Ok(email);
    }
    let code = state.verifications.issue(&email, flow).await;
    if let Err(e) = send_verification_email(&state.email_client, &email, code, flow).await {
        state.verifications.discard(&email, flow, code).await;
        return Err(anyhow::Error::new(e)
            .context("Failed to send a verification email.")
            .into());
    }
    Ok(email)
}

/// Checks a submitted code, consuming it on success.
pub(crate) async fn confirm_code(
    state: &AppState,
    email: String,
    code: String,
    flow: VerificationFlow,
) -> Result<SubscriberEmail, ConfirmError> {
    let email = SubscriberEmail::parse(email).map_err(ConfirmError::ValidationError)?;
    let code = VerificationCode::parse(&code).map_err(ConfirmError::ValidationError)?;
    state
        .verifications
        .verify(&email, flow, code)
        .await
        .map_err(ConfirmError::InvalidCode)?;
    Ok(email)
}

#[tracing::instrument(
    name = "Send a verification code",
    skip(email_client, recipient, code),
)]
async fn send_verification_email(
    email_client: &EmailClient,
    recipient: &SubscriberEmail,
    code: VerificationCode,
    flow: VerificationFlow,
) -> Result<(), reqwest::Error> {
    let (html_body, plain_body) = match flow {
        VerificationFlow::Register => (
            format!("<p>Your verification code is: <strong>{}</strong></p>", code),
            format!("Your verification code is: {}", code),
        ),
        VerificationFlow::Unsubscribe => (
            format!("<p>To confirm un-subscription, use this code: <strong>{}</strong></p>", code),
            format!("To confirm un-subscription, use this code: {}", code),
        ),
    };
    email_client
        .send_email(recipient, flow.email_subject(), &html_body, &plain_body)
        .await
}
