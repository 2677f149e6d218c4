use anyhow::{Result, bail};
use backup_maintenance::{app, config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let settings = config::load()?;
    let config::Storage::Postgres(database_url) = settings.storage else {
        bail!("No database configured, nothing to migrate");
    };

    let _ = app::connect_to_db(database_url.as_str()).await?;
    tracing::info!("DB successfully initialized");

    Ok(())
}
