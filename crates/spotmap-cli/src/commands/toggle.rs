use super::parse_id;
use crate::cli::ToggleArgs;
use crate::output::OutputWriter;
use crate::output_types::MutationOutput;
use anyhow::Result;
use spotmap_listing::FetchCoordinator;

pub async fn execute(
    args: ToggleArgs,
    coordinator: &FetchCoordinator,
    output: &OutputWriter,
) -> Result<()> {
    let id = parse_id(&args.id);
    let available = args.availability.as_bool();
    coordinator.toggle_availability(args.kind, &id, available).await?;

    let label = if available { "available" } else { "unavailable" };
    if output.is_json() {
        output.result(MutationOutput {
            kind: args.kind,
            id: id.to_string(),
            action: "toggle",
            detail: Some(label.to_string()),
        })
    } else {
        output.success(format!("{} {} is now {}", args.kind, id, label));
        Ok(())
    }
}
