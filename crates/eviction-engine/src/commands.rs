//! Pool commands: each one is a single [`SeasonService`] call whose result
//! is rendered as JSON.

use std::path::Path;

use eviction_core::{SeasonService, SeasonStore, WeekDraft};
use serde_json::{Value, json};

use crate::cli::PoolCommand;
use crate::error::EngineError;

/// Run one pool command and return its JSON output.
pub async fn run<S: SeasonStore>(
    service: &SeasonService<S>,
    command: PoolCommand,
) -> Result<Value, EngineError> {
    let output = match command {
        PoolCommand::Week(args) => {
            serde_json::to_value(service.get_week_event_record(args.pool, args.week).await?)?
        }
        PoolCommand::SaveDraft(args) => {
            let draft = read_draft(&args.file).await?;
            serde_json::to_value(service.save_draft(draft).await?)?
        }
        PoolCommand::SubmitWeek(args) => {
            let draft = read_draft(&args.file).await?;
            serde_json::to_value(service.submit_week(draft).await?)?
        }
        PoolCommand::ClearWeek(args) => {
            let existed = service.clear_week(args.pool, args.week).await?;
            json!({ "pool_id": args.pool, "week": args.week, "existed": existed })
        }
        PoolCommand::Points(args) => {
            serde_json::to_value(service.compute_points(args.pool).await?)?
        }
        PoolCommand::Standings(args) => serde_json::to_value(service.standings(args.pool).await?)?,
        PoolCommand::Status(args) => serde_json::to_value(
            service
                .status_as_of_week(args.pool, args.contestant, args.week)
                .await?,
        )?,
        PoolCommand::SeasonCheck(args) => {
            serde_json::to_value(service.validate_season_completion(args.pool).await?)?
        }
        PoolCommand::AssignPlacements(args) => {
            let placements = service.assign_final_placements(args.pool).await?;
            json!({ "pool_id": args.pool, "placements": placements })
        }
        PoolCommand::CompleteSeason(args) => {
            serde_json::to_value(service.complete_season(args.pool).await?)?
        }
    };
    Ok(output)
}

/// Read a week draft (`record` plus optional `special_events`) from JSON.
async fn read_draft(path: &Path) -> Result<WeekDraft, EngineError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| EngineError::Input {
            path: path.display().to_string(),
            source,
        })?;
    let draft: WeekDraft = serde_json::from_str(&contents)?;
    tracing::debug!(
        pool_id = %draft.record.pool_id,
        week = draft.record.week_number,
        replaces_events = draft.special_events.is_some(),
        "Week file read"
    );
    Ok(draft)
}
