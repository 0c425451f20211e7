use super::{parse_id, render_listing};
use crate::cli::BrowseArgs;
use crate::output::OutputWriter;
use anyhow::Result;
use spotmap_core::models::{EntityKind, GeoPoint, LocationId, SortDirection, SortKey};
use spotmap_listing::{FetchCoordinator, FetchOutcome, ListingIntent};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
kind <parking|service|repair_station>   switch listing
search [text]                           filter (empty text clears)
sort <column> [asc|desc]                change ordering
page <n> | next | prev                  move between pages
toggle <id> <on|off>                    set availability
move <id> <lat> <lon>                   set coordinates
delete <id>                             delete a row and its images
refresh                                 re-fetch the current page
quit";

/// One line typed into a browse session
#[derive(Debug, Clone, PartialEq)]
enum BrowseCommand {
    Listing(ListingIntent),
    Next,
    Prev,
    Toggle(LocationId, bool),
    Move(LocationId, GeoPoint),
    Delete(LocationId),
    Refresh,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<Option<BrowseCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (verb.to_lowercase().as_str(), rest.as_slice()) {
        ("kind" | "k", [kind]) => {
            let kind: EntityKind = kind.parse().map_err(|e| format!("{}", e))?;
            BrowseCommand::Listing(ListingIntent::SwitchKind(kind))
        }
        ("search" | "s", terms) => BrowseCommand::Listing(ListingIntent::Search(terms.join(" "))),
        ("sort", [key]) | ("sort", [key, _]) => {
            let key: SortKey = key.parse().map_err(|e| format!("{}", e))?;
            let direction = match rest.get(1) {
                Some(d) => d.parse::<SortDirection>().map_err(|e| format!("{}", e))?,
                None => SortDirection::Ascending,
            };
            BrowseCommand::Listing(ListingIntent::Sort(key, direction))
        }
        ("page" | "p", [n]) => {
            let page = n.parse::<u32>().map_err(|_| format!("Not a page number: {}", n))?;
            BrowseCommand::Listing(ListingIntent::GoToPage(page))
        }
        ("next" | "n", []) => BrowseCommand::Next,
        ("prev", []) => BrowseCommand::Prev,
        ("toggle" | "t", [id, value]) => {
            let available = match value.to_lowercase().as_str() {
                "on" | "true" | "yes" => true,
                "off" | "false" | "no" => false,
                other => return Err(format!("Expected on or off, got {}", other)),
            };
            BrowseCommand::Toggle(parse_id(id), available)
        }
        ("move", [id, lat, lon]) => {
            let latitude = lat.parse::<f64>().map_err(|_| format!("Not a latitude: {}", lat))?;
            let longitude = lon.parse::<f64>().map_err(|_| format!("Not a longitude: {}", lon))?;
            BrowseCommand::Move(parse_id(id), GeoPoint::new(latitude, longitude))
        }
        ("delete" | "rm", [id]) => BrowseCommand::Delete(parse_id(id)),
        ("refresh" | "r", []) => BrowseCommand::Refresh,
        ("help" | "?", []) => BrowseCommand::Help,
        ("quit" | "q" | "exit", []) => BrowseCommand::Quit,
        _ => return Err(format!("Unrecognized command: {} (type help)", line.trim())),
    };
    Ok(Some(command))
}

pub async fn execute(
    args: BrowseArgs,
    coordinator: &FetchCoordinator,
    output: &OutputWriter,
) -> Result<()> {
    let start = coordinator.with_state(|s| s.next_params(ListingIntent::SwitchKind(args.kind)));
    let outcome = coordinator.request(start).await?;
    render_listing(coordinator, args.kind, &outcome, output)?;
    if !output.is_json() {
        output.info("Type help for commands");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                output.error(message);
                continue;
            }
        };
        if command == BrowseCommand::Quit {
            break;
        }
        if let Err(e) = run(command, coordinator, output).await {
            output.error(e);
        }
    }
    Ok(())
}

async fn run(
    command: BrowseCommand,
    coordinator: &FetchCoordinator,
    output: &OutputWriter,
) -> Result<()> {
    let kind = coordinator.with_state(|s| s.active_kind());
    let outcome = match command {
        BrowseCommand::Listing(ListingIntent::Search(text)) => {
            let params = coordinator.with_state(|s| s.next_params(ListingIntent::Search(text)));
            coordinator.search(params).await?
        }
        BrowseCommand::Listing(intent) => {
            let params = coordinator.with_state(|s| s.next_params(intent));
            coordinator.request(params).await?
        }
        BrowseCommand::Next => step(coordinator, kind, true).await?,
        BrowseCommand::Prev => step(coordinator, kind, false).await?,
        BrowseCommand::Toggle(id, available) => {
            coordinator.toggle_availability(kind, &id, available).await?;
            let label = if available { "available" } else { "unavailable" };
            output.success(format!("{} is now {}", id, label));
            FetchOutcome::Unchanged
        }
        BrowseCommand::Move(id, point) => {
            let outcome = coordinator.update_location(kind, &id, point).await?;
            output.success(format!("Moved {} to {}", id, point));
            outcome
        }
        BrowseCommand::Delete(id) => {
            let deleted = coordinator.delete(kind, &id).await?;
            output.success(format!("Deleted {} ({})", id, deleted.name));
            FetchOutcome::Unchanged
        }
        BrowseCommand::Refresh => coordinator.refresh(kind).await?,
        BrowseCommand::Help => {
            println!("{}", HELP);
            return Ok(());
        }
        BrowseCommand::Quit => return Ok(()),
    };

    match outcome {
        FetchOutcome::Superseded | FetchOutcome::Debounced => Ok(()),
        outcome => {
            let shown = coordinator.with_state(|s| s.active_kind());
            render_listing(coordinator, shown, &outcome, output)
        }
    }
}

/// Move one page forward or back, staying within the known page count
async fn step(
    coordinator: &FetchCoordinator,
    kind: EntityKind,
    forward: bool,
) -> Result<FetchOutcome> {
    let params = coordinator.with_state(|s| {
        let current = s.current_page(kind);
        let last = u32::try_from(s.total_pages(kind)).unwrap_or(u32::MAX).max(1);
        let page = if forward {
            current.saturating_add(1).min(last)
        } else {
            current.saturating_sub(1).max(1)
        };
        s.next_params(ListingIntent::GoToPage(page))
    });
    Ok(coordinator.request(params).await?)
}
