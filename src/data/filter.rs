use std::collections::BTreeMap;

use crate::error::AnalysisError;
use crate::mode::{InteractionMode, UNKNOWN_MODE_CODE};

/// Indices of events grouped by interaction mode, in event order.
///
/// Modes without events are absent from the map. Events of the unknown
/// mode (`-1`) are an error, as is any code outside the known range.
pub fn group_by_mode(modes: &[i32]) -> Result<BTreeMap<InteractionMode, Vec<usize>>, AnalysisError> {
    let unknown = modes.iter().filter(|&&m| m == UNKNOWN_MODE_CODE).count();
    if unknown > 0 {
        return Err(AnalysisError::UnknownModeEvents { count: unknown });
    }

    let mut groups: BTreeMap<InteractionMode, Vec<usize>> = BTreeMap::new();
    for (i, &code) in modes.iter().enumerate() {
        let mode =
            InteractionMode::from_code(code).ok_or(AnalysisError::UnrecognisedModeCode { code })?;
        groups.entry(mode).or_default().push(i);
    }
    Ok(groups)
}

/// Gather `values` at `indices`.
pub fn select<T: Copy>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i]).collect()
}
