/// Canvas Hub admin server

use canvas_hub::{config::ServerConfig, jobs, server, AppContext, HubResult};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> HubResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canvas_hub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    let config = ServerConfig::from_env()?;

    let ctx = Arc::new(AppContext::new(config)?);

    // Jobs stop when the handles drop, so keep them for the server's lifetime
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    let _jobs = scheduler.start();

    server::serve((*ctx).clone()).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
   ______                               __  __      __
  / ____/___ _____ _   ______ ______   / / / /_  __/ /_
 / /   / __ `/ __ \ | / / __ `/ ___/  / /_/ / / / / __ \
/ /___/ /_/ / / / / |/ / /_/ (__  )  / __  / /_/ / /_/ /
\____/\__,_/_/ /_/|___/\__,_/____/  /_/ /_/\__,_/_.___/

        Admin API v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
