use anyhow::{Context, Result};
use futures::FutureExt;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use restarter::config::ConfigManager;
use restarter::container::{ContainerHandle, DockerContainer};
use restarter::notify::{DiscordNotifier, NotificationSink};
use restarter::rcon::{RconClient, RetryPolicy, TcpRconConnector};
use restarter::restart::{RestartManager, RestartSettings};
use restarter::scheduler::{ManagerCell, RestartScheduler};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration decides the log level, so it is loaded before logging exists.
    let config_manager = ConfigManager::new("config".to_string()).await;
    let log_level = config_manager
        .as_ref()
        .map(|manager| manager.get_current_config().log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "restarter={level},server_log={level},bollard=warn,hyper=warn,reqwest=warn",
            level = log_level
        ))
    });
    fmt().with_env_filter(env_filter).init();

    let config = config_manager
        .context("Failed to load configuration")?
        .get_current_config();
    info!(
        "Starting restart manager for container '{}'",
        config.container
    );

    let notifier = Arc::new(DiscordNotifier::new(
        config.webhook_url.clone(),
        config.webhook_username.clone(),
        config.webhook_author(),
    ));
    if notifier.is_enabled() {
        match notifier.test_webhook().await {
            Ok(()) => info!("Notification webhook test successful"),
            Err(e) => {
                error!("Notification webhook test failed: {}", e);
                warn!("Notifications may not be delivered. Check DISCORD_WEBHOOK.");
            }
        }
    } else {
        warn!("No webhook configured - lifecycle notifications are disabled");
    }

    let factory_config = config.clone();
    let factory_notifier: Arc<dyn NotificationSink> = notifier.clone();
    let manager = Arc::new(ManagerCell::new(Box::new(move || {
        let config = factory_config.clone();
        let notifier = factory_notifier.clone();
        async move {
            let container: Arc<dyn ContainerHandle> =
                Arc::new(DockerContainer::connect(&config.container).await?);
            let connector = Arc::new(TcpRconConnector::new(
                config.rcon_address(),
                config.rcon_password.clone(),
            ));
            let rcon = RconClient::new(connector, container.clone(), RetryPolicy::default());
            Ok::<_, anyhow::Error>(RestartManager::new(
                RestartSettings::from_config(&config),
                rcon,
                container,
                notifier,
            ))
        }
        .boxed()
    })));

    // Build now so a missing container fails at startup and the first
    // announcement counts down from the scheduler's own start.
    manager
        .get()
        .await
        .context("Failed to initialize restart manager")?;

    let mut scheduler = RestartScheduler::new(
        manager.clone(),
        config.restart_interval(),
        config.notify_interval(),
    );

    scheduler
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    if manager.is_initialized() {
        manager.get().await?.rcon().disconnect();
    }
    info!("Restart manager stopped");

    Ok(())
}
