use axum::{extract::State, response::Html, Form};
use htmlescape::encode_attribute;
use serde::Deserialize;

use crate::domain::SubscriberEmail;
use crate::routes::verification::{request_code, RequestCodeError};
use crate::startup::AppState;
use crate::verification::VerificationFlow;

#[derive(Deserialize)]
pub struct FormData {
    #[serde(default)]
    email: String,
}

#[tracing::instrument(
    name = "Requesting a subscription",
    skip(form_data, state),
    fields(
        subscriber_email = %form_data.email,
    )
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Form(form_data): Form<FormData>,
) -> Result<Html<String>, RequestCodeError> {
    let email = request_code(&state, form_data.email, VerificationFlow::Register).await?;
    Ok(verification_form(&email))
}

fn verification_form(email: &SubscriberEmail) -> Html<String> {
    let email = encode_attribute(email.as_ref());
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>Verify your email</title>
</head>
<body>
    <p>We sent a verification code to your inbox. Enter it below to complete your subscription.</p>
    <form action="/subscriptions/confirm" method="post">
        <input type="hidden" name="email" value="{email}">
        <label>Verification code
            <input
                type="text"
                inputmode="numeric"
                maxlength="6"
                placeholder="Enter the 6-digit code"
                name="verification_code"
                required
            >
        </label>
        <button id="submit-verification" type="submit">Verify</button>
    </form>
</body>
</html>"#
    ))
}
