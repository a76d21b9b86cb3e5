//! Estate Concierge server entry point.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use estate_concierge::adapters::http::{api_router, ConversationHandlers, TenantHandlers};
use estate_concierge::adapters::{
    HttpMessagingGateway, InMemoryLeadStore, InMemoryTenantRepository, LoggingGateway,
    MockCompletionService, OpenAiCompletionService, OpenAiConfig, PostgresLeadStore,
    PostgresTenantRepository, StaticPropertyMatcher, MIGRATOR,
};
use estate_concierge::application::{
    AlertDispatcher, AlertSettings, BotControlHandler, DigestTimer, EngagementSupervisor,
    HandleMessageHandler, RegisterAdminHandler, SchedulerDeps, SchedulerSettings,
};
use estate_concierge::config::{AiProvider, AppConfig, ServerConfig};
use estate_concierge::domain::conversation::{ConversationEngine, EngineSettings};
use estate_concierge::domain::engagement::NudgePolicy;
use estate_concierge::domain::tenant::Tenant;
use estate_concierge::ports::{
    CompletionService, LeadStore, MessagingGateway, PropertySummary, TenantRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let (tenants, leads) = stores(&config).await?;
    let gateway: Arc<dyn MessagingGateway> = match config.gateway.webhook_url {
        Some(ref url) => Arc::new(HttpMessagingGateway::new(url.clone(), config.gateway.timeout())?),
        None => {
            warn!("no gateway webhook configured, outbound messages are only logged");
            Arc::new(LoggingGateway)
        }
    };
    let completion = completion_service(&config)?;
    let provider = completion.provider_info();
    info!(provider = %provider.name, model = %provider.model, "completion service ready");
    let properties = Arc::new(StaticPropertyMatcher::new(load_listings(&config)?));

    let alerts = Arc::new(AlertDispatcher::new(
        gateway.clone(),
        leads.clone(),
        AlertSettings {
            retry_delay: config.alerts.retry_delay(),
        },
    ));
    let engine = ConversationEngine::new(EngineSettings {
        max_tokens: config.ai.max_tokens,
        temperature: config.ai.temperature,
        ..EngineSettings::default()
    });
    let handle_message = Arc::new(HandleMessageHandler::new(
        tenants.clone(),
        leads.clone(),
        gateway.clone(),
        completion,
        properties,
        alerts.clone(),
        engine,
    ));

    let supervisor = Arc::new(EngagementSupervisor::new(
        SchedulerDeps {
            tenants: tenants.clone(),
            leads: leads.clone(),
            gateway,
        },
        SchedulerSettings {
            poll_interval: config.engagement.poll_interval(),
            policy: NudgePolicy::new(config.engagement.fast_after(), config.engagement.value_after()),
            backoff_initial: config.engagement.backoff_initial(),
            backoff_max: config.engagement.backoff_max(),
        },
        config.engagement.restart_delay(),
    ));
    if config.engagement.autostart {
        for tenant in tenants.list_active_tenants().await? {
            supervisor.start_tenant(tenant.id).await;
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let digest = DigestTimer::new(tenants.clone(), leads, alerts, config.engagement.digest_hour_utc);
    let digest_task = tokio::spawn(async move { digest.run(shutdown_rx).await });

    let router = api_router(
        ConversationHandlers::new(handle_message),
        TenantHandlers::new(
            Arc::new(RegisterAdminHandler::new(tenants.clone())),
            Arc::new(BotControlHandler::new(tenants, supervisor.clone())),
        ),
        supervisor.clone(),
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, environment = ?config.server.environment, "estate concierge listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down background tasks");
    let _ = shutdown_tx.send(true);
    supervisor.shutdown_all().await;
    if let Err(e) = digest_task.await {
        warn!(error = %e, "digest timer ended abnormally");
    }
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if server.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn stores(config: &AppConfig) -> anyhow::Result<(Arc<dyn TenantRepository>, Arc<dyn LeadStore>)> {
    if let Some(ref database) = config.database {
        let pool = database
            .pool_options()
            .connect(&database.url)
            .await
            .context("connecting to PostgreSQL")?;
        if database.run_migrations {
            MIGRATOR.run(&pool).await.context("running migrations")?;
        }
        info!("using PostgreSQL stores");
        return Ok((
            Arc::new(PostgresTenantRepository::new(pool.clone())),
            Arc::new(PostgresLeadStore::new(pool)),
        ));
    }

    let tenants = InMemoryTenantRepository::new();
    if let Some(ref path) = config.seed.tenants_file {
        let seeded: Vec<Tenant> = read_json(path)?;
        info!(count = seeded.len(), path = %path, "seeded tenants");
        for tenant in seeded {
            tenants.insert(tenant).await;
        }
    }
    warn!("no database configured, using in-memory stores");
    Ok((Arc::new(tenants), Arc::new(InMemoryLeadStore::new())))
}

fn completion_service(config: &AppConfig) -> anyhow::Result<Arc<dyn CompletionService>> {
    match config.ai.provider {
        AiProvider::OpenAI => {
            let key = config.ai.api_key.clone().context("ESTATE_CONCIERGE__AI__API_KEY is required for the openai provider")?;
            let service = OpenAiCompletionService::new(
                OpenAiConfig::new(key)
                    .with_model(config.ai.model.clone())
                    .with_base_url(config.ai.base_url.clone())
                    .with_timeout(config.ai.timeout())
                    .with_max_retries(config.ai.max_retries),
            )?;
            Ok(Arc::new(service))
        }
        AiProvider::Mock => {
            warn!("using mock completion service");
            Ok(Arc::new(MockCompletionService::new()))
        }
    }
}

fn load_listings(config: &AppConfig) -> anyhow::Result<Vec<PropertySummary>> {
    match config.seed.listings_file {
        Some(ref path) => read_json(path),
        None => Ok(Vec::new()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
