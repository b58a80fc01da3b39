use axum::{
    extract::Query,
    http::StatusCode,
    response::Html,
};
use htmlescape::encode_attribute;

#[derive(serde::Deserialize)]
pub struct Parameters {
    email: Option<String>,
}

pub async fn unsubscribe_form(Query(parameters): Query<Parameters>) -> (StatusCode, Html<String>) {
    let email = encode_attribute(parameters.email.as_deref().unwrap_or_default().trim());
    let html = Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>Unsubscribe</title>
</head>
<body>
    <form action="/unsubscribe" method="post">
        <label>Email
            <input
                type="email"
                placeholder="Enter your email"
                name="unsubscribe_email"
                value="{email}"
                required
            >
        </label>
        <button id="submit-unsubscribe" type="submit">Unsubscribe</button>
    </form>
</body>
</html>"#
    ));
    (StatusCode::OK, html)
}
