// ============================================================================
// clipmine-core/src/metadata/update.rs
// ============================================================================
//
// METADATA UPDATER: Binding Extracted Appearances to a Part
//
// Pure functions that turn extractor output into appearance events owned by
// one part. Clip identifiers proposed by the model are discarded; events are
// numbered by their position so clip indices are always contiguous from 1.
//
// AI-ASSISTANT-INFO: Pure normalization of appearance lists for one part

use super::{AppearanceEvent, RawAppearance};

/// Binds raw appearances to part `part_sequence`, numbering them 1..=N in input order.
///
/// Total: the output always has the same length as the input.
pub fn normalize_appearances(raw: Vec<RawAppearance>, part_sequence: u32) -> Vec<AppearanceEvent> {
    let part_id = format!("Part{part_sequence}");
    raw.into_iter()
        .zip(1u32..)
        .map(|(appearance, clip_index)| AppearanceEvent {
            part_id: part_id.clone(),
            clip_index,
            start: appearance.start,
            end: appearance.end,
            description: appearance.description,
        })
        .collect()
}

/// Re-applies part binding and positional numbering to existing events.
///
/// Applying it to the output of [`normalize_appearances`] (or to its own
/// output) leaves the events unchanged.
pub fn renumber(events: Vec<AppearanceEvent>, part_sequence: u32) -> Vec<AppearanceEvent> {
    let part_id = format!("Part{part_sequence}");
    events
        .into_iter()
        .zip(1u32..)
        .map(|(event, clip_index)| AppearanceEvent {
            part_id: part_id.clone(),
            clip_index,
            ..event
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(clip: Option<&str>, start: &str, end: &str) -> RawAppearance {
        RawAppearance {
            clip: clip.map(str::to_string),
            start: start.to_string(),
            end: end.to_string(),
            description: format!("seen {start}-{end}"),
        }
    }

    #[test]
    fn numbers_by_position_ignoring_upstream_ids() {
        let events = normalize_appearances(
            vec![
                raw(Some("clip_7"), "0:19", "0:20"),
                raw(None, "1:02", "1:10"),
                raw(Some("clip_7"), "1:40", "1:41"),
            ],
            4,
        );

        assert_eq!(events.len(), 3);
        let indices: Vec<u32> = events.iter().map(|e| e.clip_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(events.iter().all(|e| e.part_id == "Part4"));
        assert_eq!(events[1].start, "1:02");
        assert_eq!(events[1].description, "seen 1:02-1:10");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(normalize_appearances(Vec::new(), 1).is_empty());
    }

    #[test]
    fn renumber_is_idempotent() {
        let once = normalize_appearances(
            vec![raw(None, "0:01", "0:02"), raw(None, "0:05", "0:09")],
            2,
        );
        let twice = renumber(once.clone(), 2);
        assert_eq!(once, twice);
        assert_eq!(renumber(twice.clone(), 2), twice);
    }

    #[test]
    fn renumber_closes_gaps_and_rebinds_part() {
        let mut events = normalize_appearances(
            vec![
                raw(None, "0:01", "0:02"),
                raw(None, "0:03", "0:04"),
                raw(None, "0:05", "0:06"),
            ],
            1,
        );
        events.remove(1);

        let fixed = renumber(events, 3);
        let indices: Vec<u32> = fixed.iter().map(|e| e.clip_index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(fixed.iter().all(|e| e.part_id == "Part3"));
        assert_eq!(fixed[1].start, "0:05");
    }
}
