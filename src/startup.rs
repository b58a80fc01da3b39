use std::net::TcpListener;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post, IntoMakeService},
    Router,
};
use hyper::server::conn::AddrIncoming;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::configuration::{DigestSettings, Settings};
use crate::email_client::EmailClient;
use crate::github_client::GitHubClient;
use crate::middleware::MakeRequestUuid;
use crate::registry::{FileSubscriberRegistry, SubscriberRegistry};
use crate::routes::*;
use crate::telemetry::MakeSpanWithRequestId;
use crate::verification::PendingVerifications;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn SubscriberRegistry>,
    pub verifications: Arc<PendingVerifications>,
    pub email_client: Arc<EmailClient>,
    pub github_client: Arc<GitHubClient>,
    pub base_url: String,
    pub digest: DigestSettings,
}

pub struct Application {
    port: u16,
    server: axum::Server<AddrIncoming, IntoMakeService<Router>>,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let registry = FileSubscriberRegistry::new(configuration.registry.path.clone());
        registry
            .initialize()
            .await
            .context("Failed to initialize the subscriber registry.")?;

        let sender = configuration
            .email_client
            .sender()
            .map_err(anyhow::Error::msg)
            .context("Invalid sender email address.")?;
        let email_client = EmailClient::new(
            configuration.email_client.base_url.clone(),
            sender,
            configuration.email_client.authorization_token.clone(),
            configuration.email_client.timeout(),
        )
        .context("Failed to build the email client.")?;
        let github_client = GitHubClient::new(
            configuration.github.base_url.clone(),
            &configuration.github.user_agent,
            configuration.github.per_page,
            configuration.github.timeout(),
        )
        .context("Failed to build the GitHub client.")?;
        let verifications = PendingVerifications::new(
            configuration.verification.ttl(),
            configuration.verification.max_attempts,
        );

        let app_state = AppState {
            registry: Arc::new(registry),
            verifications: Arc::new(verifications),
            email_client: Arc::new(email_client),
            github_client: Arc::new(github_client),
            base_url: configuration.application.base_url,
            digest: configuration.digest,
        };

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {}", address))?;
        let port = listener.local_addr()?.port();
        let server = run(listener, app_state)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> hyper::Result<()> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    app_state: AppState,
) -> hyper::Result<axum::Server<AddrIncoming, IntoMakeService<Router>>> {
    if let Ok(address) = listener.local_addr() {
        tracing::info!("listening on {}", address);
    }
    let app = app_router(app_state);
    Ok(axum::Server::from_tcp(listener)?.serve(app.into_make_service()))
}

pub fn app_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health_check", get(health_check))
        .route("/subscriptions", post(subscribe))
        .route("/subscriptions/confirm", post(confirm))
        .route("/unsubscribe", get(unsubscribe_form).post(request_unsubscribe))
        .route("/unsubscribe/confirm", post(confirm_unsubscribe))
        .route("/cron", get(send_digest))
        .with_state(app_state)
        .layer(PropagateRequestIdLayer::x_request_id())
        // A span is created for each request and ends when the response is sent
        .layer(TraceLayer::new_for_http().make_span_with(MakeSpanWithRequestId))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
