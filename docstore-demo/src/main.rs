//! `hello-docstore`: run the twitter walkthrough against a document store.

use clap::Parser;
use docstore_client::DocStoreClient;
use docstore_demo::{Cli, DemoResult, Settings};
use docstore_log::{debug, error};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env file is fine.
    let dotenv = dotenvy::dotenv();

    if let Err(e) = docstore_log::try_init(cli.log_config()) {
        eprintln!("warning: logging not initialised: {}", e);
    }
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Walkthrough failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> DemoResult<()> {
    let settings = Settings::load(cli)?;
    debug!(
        "Resolved settings: urls={:?} collection={} healthcheck={}",
        settings.urls, settings.collection, settings.healthcheck
    );

    let client = DocStoreClient::connect(settings.client_config()).await?;

    let mut stdout = std::io::stdout().lock();
    let outcome = docstore_demo::run(&client, &settings.collection, &mut stdout).await;
    client.close();

    outcome.map(|_| ())
}
