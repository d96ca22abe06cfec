// File: snapshotter/src/main.rs
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use snapshotter::cli::Cli;
use snapshotter::gateway::{CloudGateway, Ec2Gateway};
use snapshotter::{ConfigManager, Environment, LifecycleService, SnapshotterError, SystemClock};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("snapshotter=info".parse()?)
        .add_directive("aws_config=warn".parse()?)
        .add_directive("aws_smithy_runtime=warn".parse()?)
        .add_directive("hyper=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let plan = cli.plan()?;

    let environment = Environment::from_process_env()?;
    let config_manager = ConfigManager::new(cli.config.as_deref())
        .await?
        .with_throttle_override(cli.throttle);
    let settings = config_manager.get_current_settings().clone();

    info!(
        "Starting snapshot lifecycle run in region {} (create: {}, purge: {})",
        environment.region,
        plan.creation.is_some(),
        plan.purge
    );

    let source: Arc<dyn CloudGateway> = Arc::new(Ec2Gateway::new(
        &environment.credentials,
        &environment.region,
        settings.owner_filter(),
    ));

    let destination: Option<Arc<dyn CloudGateway>> = plan
        .creation
        .as_ref()
        .and_then(|creation| creation.copy_to.as_deref())
        .map(|region| {
            Arc::new(Ec2Gateway::new(
                &environment.credentials,
                region,
                settings.owner_filter(),
            )) as Arc<dyn CloudGateway>
        });

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current request");
            cancel_on_signal.cancel();
        }
    });

    let service = LifecycleService::new(
        source,
        destination,
        Arc::new(SystemClock),
        settings,
        cancel,
    );

    let summary = service.run(&plan).await?;

    match summary.into_result() {
        Ok(summary) => {
            info!("Run completed: {}", summary);
            Ok(())
        }
        Err(e @ (SnapshotterError::PartialFailure { .. } | SnapshotterError::Cancelled { .. })) => {
            error!("Run finished with errors: {}", e);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
