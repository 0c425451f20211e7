//! Command implementations

mod browse;
mod codec;
mod config;
mod delete;
mod list;
mod location;
mod toggle;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{ListOutput, LocationRow};
use crate::storage::Storage;
use anyhow::Result;
use spotmap_core::config::LayeredConfig;
use spotmap_core::models::{EntityKind, LocationId};
use spotmap_listing::{FetchCoordinator, FetchOutcome};

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Decode(args) => codec::decode(args, &config, &output),
        Commands::Encode(args) => codec::encode(args, &config, &output),
        Commands::Config => config::execute(&config, cli.config.as_deref(), &output),
        command => {
            let storage =
                Storage::new(&cli.storage, cli.data.as_deref(), &config.image_bucket.value)
                    .await?;
            let coordinator =
                FetchCoordinator::from_config(storage.locations, storage.images, &config);
            let result = dispatch(command, &coordinator, &config, &output).await;
            coordinator.settle_cleanups().await;
            result
        }
    }
}

async fn dispatch(
    command: Commands,
    coordinator: &FetchCoordinator,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    match command {
        Commands::List(args) => list::execute(args, coordinator, config, output).await,
        Commands::Browse(args) => browse::execute(args, coordinator, output).await,
        Commands::Toggle(args) => toggle::execute(args, coordinator, output).await,
        Commands::Delete(args) => delete::execute(args, coordinator, output).await,
        Commands::SetLocation(args) => location::execute(args, coordinator, output).await,
        // Handled without a store
        Commands::Decode(_) | Commands::Encode(_) | Commands::Config => Ok(()),
    }
}

fn parse_id(raw: &str) -> LocationId {
    match raw.parse() {
        Ok(id) => id,
        Err(never) => match never {},
    }
}

/// Print the rows currently shown for a kind
fn render_listing(
    coordinator: &FetchCoordinator,
    kind: EntityKind,
    outcome: &FetchOutcome,
    output: &OutputWriter,
) -> Result<()> {
    let Some(snapshot) = coordinator.snapshot(kind) else {
        output.info(format!("No {} rows loaded", kind));
        return Ok(());
    };

    let reconciled = match outcome {
        FetchOutcome::Applied { report, .. } => Some(*report),
        _ => None,
    };
    let listing = ListOutput::from_snapshot(&snapshot, coordinator.codec(), reconciled);

    if output.is_json() {
        return output.result(listing);
    }

    output.section(format!(
        "{} · page {}/{} · {} total",
        kind,
        listing.page,
        listing.total_pages.max(1),
        listing.total_count
    ));
    if !listing.search.is_empty() {
        output.kv("Search", &listing.search);
    }
    output.table(listing.rows.iter().map(LocationRow::from).collect());

    if let Some(report) = reconciled.filter(|r| r.dropped() > 0) {
        output.warning(format!(
            "Hid {} duplicate rows ({} repeated ids, {} repeated content, {} without id)",
            report.dropped(),
            report.duplicate_identity,
            report.duplicate_fingerprint,
            report.missing_identity
        ));
    }
    Ok(())
}
