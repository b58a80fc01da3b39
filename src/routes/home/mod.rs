use axum::response::Html;

/// Landing page with the subscription form and a link to unsubscribe.
pub async fn home() -> Html<&'static str> {
    Html(include_str!("home.html"))
}
