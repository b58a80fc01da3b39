use anyhow::Context;
use axum::{extract::State, response::Html, Form};

use crate::routes::message_page;
use crate::routes::verification::{confirm_code, ConfirmError};
use crate::startup::AppState;
use crate::verification::VerificationFlow;

#[derive(serde::Deserialize)]
pub struct FormData {
    #[serde(default)]
    email: String,
    #[serde(default)]
    verification_code: String,
}

#[tracing::instrument(
    name = "Confirm a pending subscriber",
    skip(state, form_data),
    fields(
        subscriber_email = %form_data.email,
    )
)]
pub async fn confirm(
    State(state): State<AppState>,
    Form(form_data): Form<FormData>,
) -> Result<Html<String>, ConfirmError> {
    let email = confirm_code(
        &state,
        form_data.email,
        form_data.verification_code,
        VerificationFlow::Register,
    )
    .await?;
    state
        .registry
        .register(&email)
        .await
        .context("Failed to register the subscriber.")?;
    Ok(message_page(
        "Subscribed",
        "Your email has been verified. You will now receive GitHub timeline updates.",
    ))
}
