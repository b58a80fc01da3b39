use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::digest::{Digest, DigestEmail};
use crate::domain::SubscriberEmail;
use crate::startup::AppState;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum CronError {
    #[error("Failed to deliver the digest to {0} subscriber(s).")]
    DeliveryFailed(usize),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for CronError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for CronError {
    fn into_response(self) -> Response {
        tracing::error!(error.cause_chain = ?self, "The digest run failed.");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// Mails the latest activity digest to every subscriber.
#[tracing::instrument(
    name = "Sending the activity digest",
    skip(state),
    fields(
        events = tracing::field::Empty,
        sent = tracing::field::Empty,
        failed = tracing::field::Empty,
    )
)]
pub async fn send_digest(State(state): State<AppState>) -> Result<StatusCode, CronError> {
    let events = state
        .github_client
        .fetch_events()
        .await
        .context("Failed to fetch the activity feed.")?;
    let digest = Digest::new(events);
    tracing::Span::current().record("events", digest.events().len() as u64);

    let subscribers = state
        .registry
        .list_subscribers()
        .await
        .context("Failed to list subscribers.")?;

    let mut sent = 0;
    let mut failed = 0;
    for subscriber in subscribers {
        match subscriber {
            Ok(subscriber) => {
                if let Err(e) = send_to_subscriber(&state, &digest, &subscriber).await {
                    failed += 1;
                    tracing::error!(
                        error.cause_chain = ?e,
                        subscriber_email = %subscriber,
                        "Failed to send the digest.",
                    );
                } else {
                    sent += 1;
                }
            }
            Err(e) => {
                tracing::warn!(
                    error.cause_chain = ?e,
                    "Skipping a subscriber. \
                    Their stored email address is invalid.",
                );
            }
        }
    }
    tracing::Span::current()
        .record("sent", sent as u64)
        .record("failed", failed as u64);

    if failed > 0 {
        return Err(CronError::DeliveryFailed(failed));
    }
    Ok(StatusCode::OK)
}

async fn send_to_subscriber(
    state: &AppState,
    digest: &Digest,
    subscriber: &SubscriberEmail,
) -> Result<(), reqwest::Error> {
    let email = DigestEmail::compose(
        digest,
        state.digest.format,
        &state.digest.subject,
        &state.base_url,
        subscriber,
    );
    state
        .email_client
        .send_email(
            subscriber,
            &email.subject,
            &email.html_content,
            &email.text_content,
        )
        .await
}
