use anyhow::Context;
use axum::{extract::State, response::Html, Form};

use crate::routes::message_page;
use crate::routes::verification::{confirm_code, ConfirmError};
use crate::startup::AppState;
use crate::verification::VerificationFlow;

#[derive(serde::Deserialize)]
pub struct FormData {
    #[serde(default)]
    unsubscribe_email: String,
    #[serde(default)]
    unsubscribe_verification_code: String,
}

#[tracing::instrument(
    name = "Confirm an un-subscription",
    skip(state, form_data),
    fields(
        subscriber_email = %form_data.unsubscribe_email,
    )
)]
pub async fn confirm_unsubscribe(
    State(state): State<AppState>,
    Form(form_data): Form<FormData>,
) -> Result<Html<String>, ConfirmError> {
    let email = confirm_code(
        &state,
        form_data.unsubscribe_email,
        form_data.unsubscribe_verification_code,
        VerificationFlow::Unsubscribe,
    )
    .await?;
    state
        .registry
        .unsubscribe(&email)
        .await
        .context("Failed to unsubscribe the subscriber.")?;
    Ok(message_page(
        "Unsubscribed",
        "You have been unsubscribed from GitHub timeline updates.",
    ))
}
