//! Per-week diffing by stable lesson id.

use std::collections::HashMap;

use crate::models::{Event, TimetableData, WeekDiff};

/// Compare two snapshots of one week.
///
/// Events are indexed by `lesson_id`; events without one cannot be tracked
/// across syncs and are ignored on both sides. `updated` carries the new
/// version of any event whose record changed structurally. Output lists are
/// sorted by lesson id so diffs are deterministic.
pub fn diff_week(old: Option<&TimetableData>, new: &TimetableData) -> WeekDiff {
    let old_events = index_by_lesson_id(old.map(|t| t.events.as_slice()).unwrap_or_default());
    let new_events = index_by_lesson_id(&new.events);

    let mut added: Vec<Event> = new_events
        .iter()
        .filter(|(id, _)| !old_events.contains_key(*id))
        .map(|(_, e)| (*e).clone())
        .collect();
    let mut removed: Vec<String> = old_events
        .keys()
        .filter(|id| !new_events.contains_key(*id))
        .map(|id| (*id).to_string())
        .collect();
    let mut updated: Vec<Event> = new_events
        .iter()
        .filter_map(|(id, new_event)| {
            let old_event = old_events.get(id)?;
            (old_event != new_event).then(|| (*new_event).clone())
        })
        .collect();

    added.sort_by(|a, b| a.lesson_id.cmp(&b.lesson_id));
    updated.sort_by(|a, b| a.lesson_id.cmp(&b.lesson_id));
    removed.sort();

    WeekDiff {
        added,
        updated,
        removed,
    }
}

fn index_by_lesson_id(events: &[Event]) -> HashMap<&str, &Event> {
    events
        .iter()
        .filter_map(|e| Some((e.lesson_id.as_deref()?, e)))
        .collect()
}
