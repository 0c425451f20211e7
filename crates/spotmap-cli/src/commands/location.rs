use super::parse_id;
use crate::cli::SetLocationArgs;
use crate::output::OutputWriter;
use crate::output_types::MutationOutput;
use anyhow::Result;
use spotmap_core::models::GeoPoint;
use spotmap_listing::FetchCoordinator;

pub async fn execute(
    args: SetLocationArgs,
    coordinator: &FetchCoordinator,
    output: &OutputWriter,
) -> Result<()> {
    let id = parse_id(&args.id);
    let point = GeoPoint::new(args.latitude, args.longitude);
    coordinator.update_location(args.kind, &id, point).await?;

    if output.is_json() {
        output.result(MutationOutput {
            kind: args.kind,
            id: id.to_string(),
            action: "set-location",
            detail: Some(coordinator.codec().encode(&point)),
        })
    } else {
        output.success(format!("Moved {} {} to {}", args.kind, id, point));
        Ok(())
    }
}
