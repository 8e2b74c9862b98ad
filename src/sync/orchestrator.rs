//! Multi-week orchestration: selector resolution, bounded fan-out, ordering,
//! and the aggregated failure summary.

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::models::TimetableData;
use crate::parse::navigation::parse_available_offsets;
use crate::sync::pipeline::{fetch_week, WeekOutcome};
use crate::upstream::errors::UpstreamError;
use crate::upstream::Extractor;

/// Fan-out cap for concurrent week fetches.
pub const WEEK_FETCH_CONCURRENCY: usize = 20;

/// How a sync request names the weeks it wants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OffsetSelector {
    Explicit(Vec<i32>),
    Symbolic(SymbolicSelector),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SymbolicSelector {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "current_forward")]
    CurrentForward,
}

/// Drop duplicate offsets while keeping first-seen order.
pub fn dedupe_offsets(offsets: Vec<i32>) -> Vec<i32> {
    let mut seen = std::collections::HashSet::new();
    offsets.into_iter().filter(|o| seen.insert(*o)).collect()
}

/// Resolve a selector to concrete offsets.
///
/// Symbolic selectors fetch the current week (offset 0) solely to parse its
/// navigation links; explicit lists are deduplicated as-is.
pub async fn resolve_selector<'a>(
    extractor: &'a Extractor,
    selector: &'a OffsetSelector,
) -> Result<Vec<i32>, UpstreamError> {
    match selector {
        OffsetSelector::Explicit(offsets) => Ok(dedupe_offsets(offsets.clone())),
        OffsetSelector::Symbolic(symbolic) => {
            let html = extractor.fetch_week_html(0).await?;
            let available = parse_available_offsets(&html);
            let resolved = match symbolic {
                SymbolicSelector::All => available,
                SymbolicSelector::CurrentForward => {
                    available.into_iter().filter(|o| *o >= 0).collect()
                }
            };
            info!(?symbolic, count = resolved.len(), "resolved symbolic offsets");
            Ok(resolved)
        }
    }
}

/// Run the week pipeline for every offset with bounded concurrency.
///
/// Tasks never cancel each other; per-offset failures come back as
/// [`WeekOutcome`] variants rather than propagating.
pub async fn fetch_weeks<'a>(
    extractor: &'a Extractor,
    teacher_map: &'a HashMap<String, String>,
    offsets: &'a [i32],
) -> Vec<WeekOutcome> {
    if offsets.is_empty() {
        return Vec::new();
    }
    info!(weeks = offsets.len(), "fetching weeks");
    let outcomes: Vec<WeekOutcome> = stream::iter(offsets.iter().copied())
        .map(|offset| fetch_week(extractor, teacher_map, offset))
        .buffer_unordered(WEEK_FETCH_CONCURRENCY)
        .collect()
        .await;
    log_failure_summary(&outcomes);
    outcomes
}

/// Successful snapshots ordered by week number ascending.
pub fn sorted_data(outcomes: &[WeekOutcome]) -> Vec<TimetableData> {
    let mut data: Vec<TimetableData> = outcomes
        .iter()
        .filter_map(|o| o.result.data().cloned())
        .collect();
    data.sort_by_key(|t| t.week_info.week_number);
    data
}

/// Log one line per distinct (classifier, message) failure group.
pub fn log_failure_summary(outcomes: &[WeekOutcome]) {
    const MESSAGE_CAP: usize = 150;
    let mut groups: HashMap<(&'static str, String), Vec<i32>> = HashMap::new();
    for outcome in outcomes {
        if let Some((classifier, message)) = outcome.result.failure() {
            let truncated: String = message.chars().take(MESSAGE_CAP).collect();
            groups
                .entry((classifier, truncated))
                .or_default()
                .push(outcome.offset);
        }
    }
    if groups.is_empty() {
        return;
    }
    for ((classifier, message), mut offsets) in groups {
        offsets.sort_unstable();
        warn!(classifier, ?offsets, message, "week fetches failed");
    }
}
