use anyhow::Result;
use clap::Parser;
use dynamo_lifecycle::command_line::{self, Cli};
use dynamo_lifecycle::dynamodb::DynamoDb;
use dynamo_lifecycle::logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    let config = cli.config();
    info!("Using {}", config.target_display());

    let sdk_config = config.load_sdk_config().await;
    let ddb = DynamoDb::new(&sdk_config);
    ddb.check_auth().await?;

    command_line::run(&ddb, &config, &cli.command).await
}
