use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;

use crate::config::Config;
use crate::dynamodb::{
    batch_write, delete_items, scan_all, BatchSummary, Item, RetryPolicy, TableClient,
};
use crate::snapshot;

/// Back up, clear and restore the contents of a DynamoDB table.
///
/// Environment variables (a `.env` file is honored):
///   TABLE_NAME          - table to operate on
///   AWS_REGION          - AWS region
///   AWS_ENDPOINT_URL    - use local DynamoDB (e.g., http://localhost:8000)
///   MAX_RETRIES         - retries per batch of 25 items
#[derive(Debug, Parser)]
#[command(name = "dynamo-lifecycle", version, verbatim_doc_comment)]
pub struct Cli {
    /// Table to operate on.
    #[arg(long, env = "TABLE_NAME")]
    pub table: String,

    /// AWS region.
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Custom endpoint URL, e.g. for DynamoDB Local.
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Retries per batch of 25 operations.
    #[arg(long, env = "MAX_RETRIES", default_value_t = 5)]
    pub max_retries: usize,

    /// Retry every failed batch submission, including permanent errors
    /// such as access denied.
    #[arg(long)]
    pub retry_all_errors: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available lifecycle commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the table's key schema.
    Info,

    /// Print every item as one JSON object per line.
    Scan {
        /// Only print the number of items.
        #[arg(long)]
        count: bool,
    },

    /// Write every item to a JSON snapshot file.
    Backup {
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Write every item of a JSON snapshot file into the table.
    Restore {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Delete every item in the table.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Clear the table, then restore it from a snapshot.
    Reset {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

impl Cli {
    /// Builds the explicit configuration the core runs with.
    pub fn config(&self) -> Config {
        Config {
            table_name: self.table.clone(),
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
            retry: RetryPolicy::default()
                .with_max_retries(self.max_retries)
                .with_retry_permanent_errors(self.retry_all_errors),
        }
    }
}

/// Runs one command, reading confirmations from stdin.
pub async fn run<C>(client: &C, config: &Config, command: &Command) -> Result<()>
where
    C: TableClient + ?Sized,
{
    let stdin = io::stdin();
    execute(client, config, command, &mut stdin.lock()).await
}

/// Runs one command, reading confirmations from `input`.
pub async fn execute<C>(
    client: &C,
    config: &Config,
    command: &Command,
    input: &mut impl BufRead,
) -> Result<()>
where
    C: TableClient + ?Sized,
{
    match command {
        Command::Info => print_info(client, config).await,
        Command::Scan { count } => scan_items(client, config, *count).await,
        Command::Backup { output } => backup(client, config, output).await,
        Command::Restore { input: path } => {
            let items = snapshot::read_items(path)?;
            restore(client, config, &items).await.map(|_| ())
        }
        Command::Clear { yes } => {
            if *yes || confirm_clear(config, input)? {
                clear(client, config).await?;
            }
            Ok(())
        }
        Command::Reset { input: path, yes } => {
            let items = snapshot::read_items(path)?;
            if *yes || confirm_clear(config, input)? {
                clear(client, config).await?;
                restore(client, config, &items).await?;
            }
            Ok(())
        }
    }
}

/// Prints the key schema of the table.
async fn print_info<C>(client: &C, config: &Config) -> Result<()>
where
    C: TableClient + ?Sized,
{
    let table = client.describe_table(&config.table_name).await?;
    let schema = table.key_schema();
    let definitions = table.attribute_definitions();
    let describe = |name: &str| {
        definitions
            .get(name)
            .map_or_else(|| "?".to_string(), |t| t.to_string())
    };

    println!("\n--- Table Information ---");
    println!("Table Name: {}", table.name());
    println!(
        "Partition Key: {} ({})",
        schema.partition_key(),
        describe(schema.partition_key())
    );
    if let Some(key) = schema.sort_key() {
        println!("Sort Key: {} ({})", key, describe(key));
    }
    println!("-------------------------\n");
    Ok(())
}

async fn scan_items<C>(client: &C, config: &Config, count_only: bool) -> Result<()>
where
    C: TableClient + ?Sized,
{
    let items = scan_all(client, &config.table_name).await?;
    if count_only {
        println!("{}", items.len());
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for item in &items {
        serde_json::to_writer(&mut out, item)?;
        writeln!(out)?;
    }
    Ok(())
}

async fn backup<C>(client: &C, config: &Config, output: &Path) -> Result<()>
where
    C: TableClient + ?Sized,
{
    let items = scan_all(client, &config.table_name).await?;
    snapshot::write_items(output, &items)?;
    println!(
        "Backed up {} items from '{}' to {}",
        items.len(),
        config.table_name,
        output.display()
    );
    Ok(())
}

async fn restore<C>(client: &C, config: &Config, items: &[Item]) -> Result<BatchSummary>
where
    C: TableClient + ?Sized,
{
    let summary = batch_write(client, &config.table_name, items, &config.retry).await?;
    print_summary("Restored", &summary);
    Ok(summary)
}

/// Deletes every item, addressing each by the key schema the service reports.
async fn clear<C>(client: &C, config: &Config) -> Result<BatchSummary>
where
    C: TableClient + ?Sized,
{
    let table = client.describe_table(&config.table_name).await?;
    let items = scan_all(client, table.name()).await?;
    info!("Deleting {} items from '{}'", items.len(), table.name());

    let summary = delete_items(client, &table, &items, &config.retry).await?;
    print_summary("Deleted", &summary);
    Ok(summary)
}

fn print_summary(action: &str, summary: &BatchSummary) {
    println!(
        "{action} {} items in {} batches ({} retries)",
        summary.items, summary.groups, summary.retries
    );
}

fn confirm_clear(config: &Config, input: &mut impl BufRead) -> Result<bool> {
    let confirmed = prompt_bool(
        &format!(
            "Delete every item in table '{}'? This action cannot be undone.",
            config.table_name
        ),
        input,
    )?;
    if !confirmed {
        println!("Clear cancelled.");
    }
    Ok(confirmed)
}

/// Prompts the user for input and returns the entered string.
fn prompt(message: &str, input: &mut impl BufRead) -> Result<String> {
    print!("{message}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Asks a yes/no question; anything but `y` or `yes` means no.
fn prompt_bool(message: &str, input: &mut impl BufRead) -> Result<bool> {
    let answer = prompt(&format!("{message} (y/N)"), input)?.to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
