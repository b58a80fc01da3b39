use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{another_code, mount_email_api, spawn_app};

#[tokio::test]
async fn unsubscribe_page_shows_the_request_form() {
    let app = spawn_app().await;

    let response = app.get_unsubscribe("").await;

    assert_eq!(200, response.status().as_u16());
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains(r#"<form action="/unsubscribe" method="post">"#));
    assert!(html_page.contains(r#"name="unsubscribe_email""#));
    assert!(html_page.contains(r#"id="submit-unsubscribe""#));
}

#[tokio::test]
async fn unsubscribe_page_does_not_reflect_markup_from_the_query() {
    let app = spawn_app().await;

    let response = app.get_unsubscribe("?email=%3Cscript%3Ealert(1)%3C%2Fscript%3E").await;

    assert_eq!(200, response.status().as_u16());
    assert!(!response.text().await.unwrap().contains("<script>"));
}

#[tokio::test]
async fn requesting_an_unsubscribe_mails_a_confirmation_code() {
    // Arrange
    let app = spawn_app().await;
    mount_email_api(&app).await;
    app.register("a@x.com").await;

    // Act
    let response = app.post_unsubscribe("unsubscribe_email=a%40x.com".into()).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains(r#"<form action="/unsubscribe/confirm" method="post">"#));
    assert!(html_page.contains(r#"name="unsubscribe_verification_code""#));
    assert!(html_page.contains(r#"id="verify-unsubscribe""#));

    let emails = app.sent_emails().await;
    let last = emails.last().unwrap();
    assert_eq!(last["To"], "a@x.com");
    assert_eq!(last["Subject"], "Confirm Un-subscription");
    // Still registered until the code is confirmed
    assert_eq!(app.registered_emails(), vec!["a@x.com"]);
}

#[tokio::test]
async fn confirming_an_unsubscribe_removes_only_that_address() {
    let app = spawn_app().await;
    mount_email_api(&app).await;
    app.register("a@x.com").await;
    app.register("b@x.com").await;
    app.post_unsubscribe("unsubscribe_email=a%40x.com".into()).await;
    let code = app.last_verification_code("a@x.com").await;

    let response = app.post_unsubscribe_confirm("a@x.com", &code).await;

    assert_eq!(200, response.status().as_u16());
    assert!(response.text().await.unwrap().contains("You have been unsubscribed"));
    assert_eq!(app.registered_emails(), vec!["b@x.com"]);
}

#[tokio::test]
async fn unknown_addresses_get_the_same_page_but_no_email() {
    let app = spawn_app().await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app.post_unsubscribe("unsubscribe_email=nobody%40x.com".into()).await;

    assert_eq!(200, response.status().as_u16());
    assert!(response
        .text()
        .await
        .unwrap()
        .contains(r#"id="verify-unsubscribe""#));
}

#[tokio::test]
async fn unsubscribe_rejects_invalid_addresses_with_a_400() {
    let app = spawn_app().await;
    let test_cases = vec![
        ("", "missing the email"),
        ("unsubscribe_email=", "empty email"),
        ("unsubscribe_email=not-an-email", "missing the @"),
    ];

    for (body, description) in test_cases {
        let response = app.post_unsubscribe(body.into()).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not return a 400 Bad Request when the payload was {}.",
            description
        );
    }
}

#[tokio::test]
async fn a_wrong_unsubscribe_code_keeps_the_subscription() {
    let app = spawn_app().await;
    mount_email_api(&app).await;
    app.register("a@x.com").await;
    app.post_unsubscribe("unsubscribe_email=a%40x.com".into()).await;
    let code = app.last_verification_code("a@x.com").await;

    let response = app
        .post_unsubscribe_confirm("a@x.com", &another_code(&code))
        .await;

    assert_eq!(401, response.status().as_u16());
    assert_eq!(app.registered_emails(), vec!["a@x.com"]);
}

#[tokio::test]
async fn a_subscription_code_cannot_confirm_an_unsubscribe() {
    let app = spawn_app().await;
    mount_email_api(&app).await;
    app.register("b@x.com").await;
    // Registered, with a pending subscription code
    app.register("a@x.com").await;
    app.post_subscriptions("email=a%40x.com".into()).await;
    let subscription_code = app.last_verification_code("a@x.com").await;

    let response = app
        .post_unsubscribe_confirm("a@x.com", &subscription_code)
        .await;

    assert_eq!(401, response.status().as_u16());
    assert_eq!(app.registered_emails(), vec!["b@x.com", "a@x.com"]);
}

#[tokio::test]
async fn unsubscribe_fails_if_the_confirmation_email_cannot_be_sent() {
    let app = spawn_app().await;
    app.seed_registry("a@x.com\n");
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_unsubscribe("unsubscribe_email=a%40x.com".into()).await;

    assert_eq!(500, response.status().as_u16());
}
