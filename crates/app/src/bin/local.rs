// Hyuga - Local Engine Runner

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hyuga_common::{Config, LogFormat};
use hyuga_projects::Completion;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config);

    info!(
        provider = %config.backend_provider,
        data_dir = %config.data_dir.display(),
        "Starting Hyuga engine"
    );

    let app = hyuga_app::create_app(&config).map_err(|e| {
        error!("Failed to create application: {}", e);
        e
    })?;

    match app.catalog.refresh().await? {
        Completion::Applied(projects) => {
            info!(count = projects.len(), "Projects loaded");
            for project in &projects {
                info!(
                    project_id = %project.id,
                    name = %project.name,
                    created_at = %project.created_at,
                    assets = project.assets.len(),
                    "Project"
                );
            }
        }
        Completion::Discarded => info!("Project list superseded"),
    }

    info!("Engine shutdown complete");
    Ok(())
}

/// `LOG_LEVEL` as the default, `RUST_LOG` directives on top
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(format!("{},{}", config.log_level, config.rust_log))
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init(),
    }
}
