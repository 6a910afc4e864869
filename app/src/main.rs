//! Lantern Browser - headless shell
//!
//! Drives the application lifecycle without a window: startup, one browser
//! activity, then a final background save on Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lantern_core::{
    Application, BrowserActivity, Config, Engine, HeadlessEngine, ProcessIdentity, UiQueue,
};

const FINAL_SAVE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("LANTERN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| Config::data_dir().join("config.json"));
    let config = Config::load(&config_path)?;

    let engine: Arc<dyn Engine> = Arc::new(HeadlessEngine::new());
    let app = Application::new(config, ProcessIdentity::current(), engine, UiQueue::spawn());
    app.on_create();

    if !app.is_main_process() {
        app.ui().flush().await;
        tracing::info!("Auxiliary process initialized");
        return Ok(());
    }

    let activity = BrowserActivity::new(Arc::clone(&app));
    activity.on_create();
    app.ui().flush().await;

    tracing::info!("Lantern started");

    tokio::signal::ctrl_c().await?;
    app.shutdown(FINAL_SAVE_TIMEOUT).await;

    Ok(())
}
