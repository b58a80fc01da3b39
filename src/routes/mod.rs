mod cron;
mod health_check;
mod home;
mod subscriptions;
mod subscriptions_confirm;
mod unsubscribe;
mod verification;

pub use cron::{send_digest, CronError};
pub use health_check::health_check;
pub use home::home;
pub use subscriptions::subscribe;
pub use subscriptions_confirm::confirm;
pub use unsubscribe::{confirm_unsubscribe, request_unsubscribe, unsubscribe_form};
pub use verification::{ConfirmError, RequestCodeError};

use axum::response::Html;
use htmlescape::encode_minimal;

/// A bare page carrying a single message for the visitor.
pub(crate) fn message_page(title: &str, message: &str) -> Html<String> {
    let title = encode_minimal(title);
    let message = encode_minimal(message);
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>{title}</title>
</head>
<body>
    <p>{message}</p>
    <p><a href="/">&lt;- Home</a></p>
</body>
</html>"#
    ))
}
