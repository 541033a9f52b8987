use std::sync::Arc;

use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use timeledger_app::app::api::routes;
use timeledger_app::config::ConfigHandler;
use timeledger_app::service_handler::{AdminServiceHandler, ScheduleServiceHandler};
use timeledger_calendar::store::ScheduleStore;
use timeledger_core::config::load_config;
use timeledger_db::admin::ScheduleAdmin;
use timeledger_db::db::connection::{SplitPool, run_migrations};
use timeledger_db::memory::MemoryScheduleStore;
use timeledger_db::store::PgScheduleStore;
use timeledger_service::admin::AdminService;
use timeledger_service::schedule::ScheduleService;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

/// Shares one store between the read and admin services.
fn shared<S: ScheduleAdmin + 'static>(
    store: S,
) -> (Arc<dyn ScheduleStore>, Arc<dyn ScheduleAdmin>) {
    let store = Arc::new(store);
    let reader: Arc<dyn ScheduleStore> = store.clone();
    let admin: Arc<dyn ScheduleAdmin> = store;
    (reader, admin)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting timeledger schedule server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let (store, admin) = if config.database.is_configured() {
        run_migrations(&config.database.url).await?;
        let pool = SplitPool::connect(&config.database).await?;
        tracing::info!("Database connection pools created.");
        shared(PgScheduleStore::new(Arc::new(pool)))
    } else {
        tracing::warn!("No database configured, serving from an empty in-memory store");
        shared(MemoryScheduleStore::new())
    };

    let service = ScheduleService::new(store, &config.schedule)?;
    let admin_service = AdminService::new(admin, &config.schedule)?;

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(ConfigHandler {
            settings: Arc::new(config.clone()),
        })
        .hoop(ScheduleServiceHandler { service })
        .hoop(AdminServiceHandler {
            service: admin_service,
        })
        .push(routes());

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
