use std::io::Error;
use std::sync::Arc;
use std::time::Duration;

use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;
use sqlx::postgres::PgPoolOptions;
use tokio::main;
use tracing::info;
use tracing_subscriber::EnvFilter;

use followup::{
    application::{
        handlers::{
            nudge_dispatcher::NudgeDispatcher, scheduler::NudgeScheduler,
            webhook_reconciler::WebhookReconciler,
        },
        services::{
            decision::{DecisionEngine, FallbackDecisionEngine},
            outbound::NudgeSender,
        },
    },
    config::Config,
    infrastructure::{
        decision::http::HttpDecisionClient,
        messaging::whatsapp::WhatsAppClient,
        repositories::postgres::{
            PostgresContactRepository, PostgresConversationRepository,
            PostgresIntegrationRepository, PostgresMessageRepository, PostgresNudgeRepository,
            PostgresPreferencesRepository,
        },
    },
    presentation::http::endpoints::{
        cron::CronEndpoints, health::HealthEndpoints, root::ApiState, webhooks::WebhookEndpoints,
    },
};

#[main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::try_parse().map_err(Error::other)?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(Error::other)?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(Error::other)?;

    let contacts = PostgresContactRepository::new(pool.clone());
    let conversations = PostgresConversationRepository::new(pool.clone());
    let nudges = PostgresNudgeRepository::new(pool.clone());
    let messages = PostgresMessageRepository::new(pool.clone());
    let integrations = PostgresIntegrationRepository::new(pool.clone());
    let preferences = PostgresPreferencesRepository::new(pool.clone());

    let delivery = WhatsAppClient::new(
        config.graph_api_base.clone(),
        config.whatsapp_api_version.clone(),
        config.send_timeout_secs,
    );
    let decisions: Arc<dyn DecisionEngine> = match &config.decision_api_url {
        Some(url) => HttpDecisionClient::new(url.clone(), config.send_timeout_secs),
        None => Arc::new(FallbackDecisionEngine),
    };
    let sender = Arc::new(NudgeSender::new(delivery.clone(), messages.clone()));

    let dispatcher = Arc::new(NudgeDispatcher::new(
        nudges.clone(),
        conversations.clone(),
        contacts.clone(),
        messages.clone(),
        integrations.clone(),
        preferences,
        sender,
    ));
    let reconciler = Arc::new(WebhookReconciler::new(
        contacts,
        conversations,
        nudges,
        messages,
        integrations,
        decisions,
        delivery,
    ));

    let scheduler = if config.scheduler_enabled {
        let interval = Duration::from_secs(config.scheduler_interval_secs);
        Some(NudgeScheduler::new(dispatcher.clone(), interval).spawn())
    } else {
        None
    };

    let state = Arc::new(ApiState {
        dispatcher,
        reconciler,
        webhook_verify_token: config.webhook_verify_token,
        cron_secret: config.cron_secret,
    });

    let server_url = format!("http://{}:{}", config.host, config.port);

    info!("Starting server at {}", server_url);

    let api_service = OpenApiService::new(
        (
            HealthEndpoints,
            WebhookEndpoints::new(state.clone()),
            CronEndpoints::new(state),
        ),
        "Follow-up API",
        "0.1.0",
    )
    .server(format!("{}/api", server_url));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/", ui);

    let result = Server::new(TcpListener::bind(format!("{}:{}", config.host, config.port)))
        .run(app)
        .await;

    if let Some(handle) = scheduler {
        handle.shutdown().await;
    }

    result
}
