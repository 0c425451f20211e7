use super::parse_id;
use crate::cli::DeleteArgs;
use crate::output::OutputWriter;
use crate::output_types::MutationOutput;
use anyhow::Result;
use spotmap_listing::FetchCoordinator;

pub async fn execute(
    args: DeleteArgs,
    coordinator: &FetchCoordinator,
    output: &OutputWriter,
) -> Result<()> {
    let id = parse_id(&args.id);
    let deleted = coordinator.delete(args.kind, &id).await?;

    if output.is_json() {
        return output.result(MutationOutput {
            kind: args.kind,
            id: id.to_string(),
            action: "delete",
            detail: Some(deleted.name),
        });
    }

    output.success(format!("Deleted {} {} ({})", args.kind, id, deleted.name));
    if !deleted.images.is_empty() {
        output.info(format!("Removing {} image(s)", deleted.images.len()));
    }
    Ok(())
}
