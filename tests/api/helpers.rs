use std::path::PathBuf;

use github_digest::configuration::get_configuration;
use github_digest::startup::Application;
use github_digest::telemetry::{get_subscriber, init_subscriber};
use once_cell::sync::Lazy;
use reqwest::Url;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Ensure that the tracing stack is only initialized once using once_cell
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = String::from("info");
    let subscriber_name = String::from("test");

    // TEST_LOG=true cargo test | bunyan
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub email_server: MockServer,
    pub github_server: MockServer,
    pub registry_path: PathBuf,
    api_client: reqwest::Client,
    _registry_dir: TempDir,
}

impl TestApp {
    pub async fn get_home_html(&self) -> String {
        self.api_client
            .get(format!("{}/", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
            .text()
            .await
            .unwrap()
    }

    pub async fn post_subscriptions(&self, body: String) -> reqwest::Response {
        self.post_form_body("/subscriptions", body).await
    }

    pub async fn post_subscriptions_confirm(&self, email: &str, code: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/subscriptions/confirm", &self.address))
            .form(&[("email", email), ("verification_code", code)])
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_unsubscribe(&self, query: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}/unsubscribe{}", &self.address, query))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_unsubscribe(&self, body: String) -> reqwest::Response {
        self.post_form_body("/unsubscribe", body).await
    }

    pub async fn post_unsubscribe_confirm(&self, email: &str, code: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/unsubscribe/confirm", &self.address))
            .form(&[
                ("unsubscribe_email", email),
                ("unsubscribe_verification_code", code),
            ])
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_cron(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/cron", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn post_form_body(&self, route: &str, body: String) -> reqwest::Response {
        self.api_client
            .post(format!("{}{}", &self.address, route))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Every email captured by the mail API mock, as JSON bodies.
    pub async fn sent_emails(&self) -> Vec<serde_json::Value> {
        self.email_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }

    /// The code carried by the most recent email sent to `recipient`.
    pub async fn last_verification_code(&self, recipient: &str) -> String {
        let emails = self.sent_emails().await;
        let email = emails
            .iter()
            .rev()
            .find(|email| email["To"].as_str() == Some(recipient))
            .expect("No email was sent to the recipient.");
        extract_code(email["TextBody"].as_str().unwrap())
    }

    /// Runs the whole subscription flow for `email`.
    pub async fn register(&self, email: &str) {
        let response = self
            .post_subscriptions(format!("email={}", urlencoding::encode(email)))
            .await;
        assert_eq!(response.status().as_u16(), 200);
        let code = self.last_verification_code(email).await;
        let response = self.post_subscriptions_confirm(email, &code).await;
        assert_eq!(response.status().as_u16(), 200);
    }

    pub fn registered_emails(&self) -> Vec<String> {
        std::fs::read_to_string(&self.registry_path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn seed_registry(&self, contents: &str) {
        std::fs::write(&self.registry_path, contents).unwrap();
    }

    /// Points a link from an email at the test server.
    pub fn local_link(&self, raw_link: &str) -> Url {
        let mut link = Url::parse(raw_link).unwrap();
        assert_eq!(link.host_str().unwrap(), "127.0.0.1");
        link.set_port(Some(self.port)).unwrap();
        link
    }
}

pub fn extract_code(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 6)
        .expect("No 6-digit code in the email.")
        .to_string()
}

/// A code that is well-formed but different from `code`.
pub fn another_code(code: &str) -> String {
    let value: u32 = code.parse().unwrap();
    let other = if value == 999_999 { 100_000 } else { value + 1 };
    other.to_string()
}

pub async fn mount_email_api(app: &TestApp) {
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;
}

// Launch application in the background
pub async fn spawn_app() -> TestApp {
    // Initialize tracing stack only once!
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;
    let github_server = MockServer::start().await;
    let registry_dir = TempDir::new().expect("Failed to create a temporary directory.");
    let registry_path = registry_dir.path().join("registered_emails.txt");

    let config = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.host = "127.0.0.1".to_string();
        c.application.port = 0;
        c.application.base_url = "http://127.0.0.1".to_string();
        c.registry.path = registry_path.clone();
        c.email_client.base_url = email_server.uri();
        c.github.base_url = github_server.uri();
        c
    };

    let application = Application::build(config)
        .await
        .expect("Failed to build application.");
    let port = application.port();
    let address = format!("http://127.0.0.1:{}", port);
    let _ = tokio::spawn(application.run_until_stopped());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        port,
        email_server,
        github_server,
        registry_path,
        api_client,
        _registry_dir: registry_dir,
    }
}
