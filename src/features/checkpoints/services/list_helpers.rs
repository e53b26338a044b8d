use chrono::NaiveDate;

use crate::features::checkpoints::models::Checkpoint;

/// Free-text search used by the list drawer.
///
/// Matches case-insensitively anywhere in city, county, state or location.
/// A blank term matches everything.
pub fn search_checkpoints<'a>(checkpoints: &'a [Checkpoint], term: &str) -> Vec<&'a Checkpoint> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return checkpoints.iter().collect();
    }

    checkpoints
        .iter()
        .filter(|c| {
            [
                Some(c.city.as_str()),
                Some(c.county.as_str()),
                Some(c.state.as_str()),
                c.location.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Split into (upcoming, past), each keeping the input order
pub fn partition_by_status(
    checkpoints: &[Checkpoint],
    today: NaiveDate,
) -> (Vec<&Checkpoint>, Vec<&Checkpoint>) {
    checkpoints.iter().partition(|c| c.is_upcoming_on(today))
}
