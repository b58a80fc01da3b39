use axum::{extract::State, response::Html, Form};
use htmlescape::encode_attribute;

use crate::domain::SubscriberEmail;
use crate::routes::verification::{request_code, RequestCodeError};
use crate::startup::AppState;
use crate::verification::VerificationFlow;

#[derive(serde::Deserialize)]
pub struct FormData {
    #[serde(default)]
    unsubscribe_email: String,
}

#[tracing::instrument(
    name = "Requesting an un-subscription",
    skip(state, form_data),
    fields(
        subscriber_email = %form_data.unsubscribe_email,
    )
)]
pub async fn request_unsubscribe(
    State(state): State<AppState>,
    Form(form_data): Form<FormData>,
) -> Result<Html<String>, RequestCodeError> {
    let email = request_code(
        &state,
        form_data.unsubscribe_email,
        VerificationFlow::Unsubscribe,
    )
    .await?;
    Ok(unsubscribe_verification_form(&email))
}

fn unsubscribe_verification_form(email: &SubscriberEmail) -> Html<String> {
    let email = encode_attribute(email.as_ref());
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>Confirm un-subscription</title>
</head>
<body>
    <p>If this address is subscribed, a confirmation code is on its way.</p>
    <form action="/unsubscribe/confirm" method="post">
        <input type="hidden" name="unsubscribe_email" value="{email}">
        <label>Verification code
            <input
                type="text"
                inputmode="numeric"
                maxlength="6"
                placeholder="Enter the 6-digit code"
                name="unsubscribe_verification_code"
                required
            >
        </label>
        <button id="verify-unsubscribe" type="submit">Verify</button>
    </form>
</body>
</html>"#
    ))
}
