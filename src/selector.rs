//! Selector & Injector: pick a winner from scored, above-threshold
//! candidates, detect ambiguity against the runner-up, and format the
//! exact stdout template.

use crate::model::{Index, ScoreRecord};

/// The chosen skill plus an optional ambiguous runner-up.
pub struct Selection<'a> {
    pub winner: &'a ScoreRecord,
    pub runner_up: Option<&'a ScoreRecord>,
}

/// Sort eligible records descending by `weighted_total`, tie-broken by id
/// ascending for determinism, then apply the threshold and pick the top
/// two. Returns `None` if nothing clears the threshold.
pub fn select<'a>(
    records: &'a [ScoreRecord],
    threshold: f64,
    ambiguity_gap: f64,
) -> Option<Selection<'a>> {
    let mut eligible: Vec<&ScoreRecord> = records.iter().filter(|r| r.is_eligible(threshold)).collect();
    eligible.sort_by(|a, b| {
        b.weighted_total
            .partial_cmp(&a.weighted_total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.skill_id.cmp(&b.skill_id))
    });

    let winner = *eligible.first()?;
    let runner_up = eligible
        .get(1)
        .copied()
        .filter(|r| winner.weighted_total - r.weighted_total < ambiguity_gap);

    Some(Selection { winner, runner_up })
}

/// Truncate `body` to at most `max_chars` characters without splitting a
/// UTF-8 code point. Operates on *characters*, not bytes, since the spec's
/// "8000 chars" is a character budget; the byte-boundary-safety constraint
/// still falls out for free because we only ever cut at a `char_indices`
/// boundary.
pub fn truncate_body(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &body[..byte_idx],
        None => body,
    }
}

/// Render the exact injection template (spec §6.2).
pub fn render(
    index: &Index,
    selection: &Selection,
    body: &str,
    max_chars: usize,
) -> Option<String> {
    let descriptor = index.find(&selection.winner.skill_id)?;
    let truncated = truncate_body(body, max_chars);
    let score = selection.winner.weighted_total.trunc() as i64;

    let mut text = format!(
        "[skill-router] Automatically loaded skill: **{}** (category: {}, score: {})\n",
        descriptor.name, descriptor.category, score
    );

    if let Some(runner_up) = selection.runner_up {
        if let Some(alt) = index.find(&runner_up.skill_id) {
            let alt_score = runner_up.weighted_total.trunc() as i64;
            text.push_str(&format!(
                "[skill-router] Note: also considered {} (score: {}).\n               If the loaded skill seems wrong, the user may have meant the other one.\n",
                alt.name, alt_score
            ));
        }
    }

    text.push_str(&format!(
        "\n--- BEGIN SKILL INSTRUCTIONS ---\n{truncated}\n--- END SKILL INSTRUCTIONS ---\n\n[skill-router] Apply these skill instructions to the user's request.\nIf the skill doesn't seem relevant, ignore these instructions and respond normally."
    ));

    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SkillDescriptor;
    use std::collections::HashSet;

    fn record(id: &str, total: f64) -> ScoreRecord {
        ScoreRecord {
            skill_id: id.to_string(),
            level2: 0.0,
            level3: 0.0,
            level4: 0.0,
            level5: 0.0,
            excluded: false,
            weighted_total: total,
        }
    }

    fn index_with(ids: &[&str]) -> Index {
        Index {
            generated_at: "now".to_string(),
            skills: ids
                .iter()
                .map(|id| SkillDescriptor {
                    id: id.to_string(),
                    name: id.to_string(),
                    category: "coding".to_string(),
                    short_description: String::new(),
                    tags: HashSet::new(),
                    trigger_keywords: Default::default(),
                    intent_patterns: Default::default(),
                    negative_keywords: Default::default(),
                    body_path: format!("{id}.md"),
                    body_hash: "hash".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn empty_records_select_nothing() {
        assert!(select(&[], 18.0, 10.0).is_none());
    }

    #[test]
    fn below_threshold_is_excluded_from_selection() {
        let records = vec![record("a", 10.0)];
        assert!(select(&records, 18.0, 10.0).is_none());
    }

    #[test]
    fn ties_break_by_id_ascending() {
        let records = vec![record("b", 50.0), record("a", 50.0)];
        let sel = select(&records, 18.0, 10.0).unwrap();
        assert_eq!(sel.winner.skill_id, "a");
    }

    #[test]
    fn ambiguity_gap_flags_runner_up() {
        let records = vec![record("a", 60.0), record("b", 55.0)];
        let sel = select(&records, 18.0, 10.0).unwrap();
        assert_eq!(sel.winner.skill_id, "a");
        assert_eq!(sel.runner_up.unwrap().skill_id, "b");
    }

    #[test]
    fn large_gap_has_no_runner_up() {
        let records = vec![record("a", 90.0), record("b", 20.0)];
        let sel = select(&records, 18.0, 10.0).unwrap();
        assert!(sel.runner_up.is_none());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "héllo 世界"; // mix of multi-byte chars
        let truncated = truncate_body(body, 3);
        assert_eq!(truncated, "hél");
        assert!(truncated.is_char_boundary(truncated.len()));
    }

    #[test]
    fn render_includes_note_only_when_ambiguous() {
        let index = index_with(&["a", "b"]);
        let records = vec![record("a", 60.0), record("b", 55.0)];
        let sel = select(&records, 18.0, 10.0).unwrap();
        let text = render(&index, &sel, "instructions body", 8000).unwrap();
        assert!(text.contains("Note: also considered"));
        assert!(text.contains("--- BEGIN SKILL INSTRUCTIONS ---"));
    }

    #[test]
    fn render_omits_note_when_unambiguous() {
        let index = index_with(&["a"]);
        let records = vec![record("a", 60.0)];
        let sel = select(&records, 18.0, 10.0).unwrap();
        let text = render(&index, &sel, "instructions body", 8000).unwrap();
        assert!(!text.contains("Note:"));
    }
}
