use super::render_listing;
use crate::cli::ListArgs;
use crate::output::OutputWriter;
use anyhow::Result;
use spotmap_core::config::LayeredConfig;
use spotmap_core::models::{QueryParams, SortDirection};
use spotmap_listing::FetchCoordinator;

pub async fn execute(
    args: ListArgs,
    coordinator: &FetchCoordinator,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let mut params = QueryParams::new(args.kind, config.page_size.value).at_page(args.page);
    if let Some(search) = args.search {
        params = params.with_search(search);
    }
    if let Some(key) = args.sort {
        params = params.sorted_by(key, args.direction.unwrap_or(SortDirection::Ascending));
    } else if let Some(direction) = args.direction {
        let key = params.sort_key;
        params = params.sorted_by(key, direction);
    }

    tracing::debug!(kind = %params.kind, page = params.page, "Listing");
    let outcome = coordinator.request(params).await?;
    render_listing(coordinator, args.kind, &outcome, output)
}
