//! Baseline catch-all codes every finished codeframe carries.

use std::collections::HashSet;

use vcode_core::{Codeframe, CodeframeEntry};

/// Category tag on entries appended by [`ensure_catch_all`].
pub const CATCH_ALL_CATEGORY: &str = "catch_all";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchAllKind {
    Other,
    Nothing,
    DontKnow,
}

impl CatchAllKind {
    pub const ALL: [CatchAllKind; 3] = [
        CatchAllKind::Other,
        CatchAllKind::Nothing,
        CatchAllKind::DontKnow,
    ];

    /// Compact label forms (lowercase, alphanumerics only) that count as this kind.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            CatchAllKind::Other => &["other", "others", "othermentions", "otherresponses"],
            CatchAllKind::Nothing => &[
                "none",
                "nothing",
                "nonenothing",
                "nothingnone",
                "noneofthese",
            ],
            CatchAllKind::DontKnow => &[
                "dontknow",
                "donotknow",
                "idontknow",
                "dk",
                "na",
                "notsure",
                "dontknownotsure",
            ],
        }
    }

    fn preferred_code(self) -> &'static str {
        match self {
            CatchAllKind::Other => "OTHER",
            CatchAllKind::Nothing => "NONE",
            CatchAllKind::DontKnow => "DK",
        }
    }

    fn label(self) -> &'static str {
        match self {
            CatchAllKind::Other => "Other",
            CatchAllKind::Nothing => "None/Nothing",
            CatchAllKind::DontKnow => "Don't Know",
        }
    }

    fn definition(self) -> &'static str {
        match self {
            CatchAllKind::Other => "Responses that do not fit any other code.",
            CatchAllKind::Nothing => "Respondent explicitly says none or nothing.",
            CatchAllKind::DontKnow => "Respondent does not know, is unsure, or gives no answer.",
        }
    }
}

fn compact(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Which catch-all a label denotes, ignoring case and punctuation.
#[must_use]
pub fn classify(label: &str) -> Option<CatchAllKind> {
    let key = compact(label);
    CatchAllKind::ALL
        .into_iter()
        .find(|kind| kind.aliases().contains(&key.as_str()))
}

#[must_use]
pub fn is_catch_all(entry: &CodeframeEntry) -> bool {
    classify(&entry.label).is_some()
}

/// Append one entry per missing catch-all kind.
///
/// Appended entries get numeric ids above every existing one, so they sort
/// last. Applying this twice adds nothing the second time.
#[must_use]
pub fn ensure_catch_all(mut codeframe: Codeframe) -> Codeframe {
    let present: Vec<CatchAllKind> = codeframe
        .entries
        .iter()
        .filter_map(|e| classify(&e.label))
        .collect();

    let mut taken: HashSet<u32> = codeframe.entries.iter().map(|e| e.numeric).collect();
    let mut next_numeric = codeframe.max_numeric().saturating_add(1);
    for kind in CatchAllKind::ALL {
        if present.contains(&kind) {
            continue;
        }
        let numeric = next_free_numeric(&taken, next_numeric);
        taken.insert(numeric);
        next_numeric = numeric.saturating_add(1);

        let code = unused_code(&codeframe, kind.preferred_code());
        let entry = CodeframeEntry::new(code, numeric, kind.label())
            .with_definition(kind.definition())
            .with_category(CATCH_ALL_CATEGORY);
        tracing::debug!(
            group_id = %codeframe.group_id,
            code = %entry.code,
            numeric = entry.numeric,
            "adding catch-all code"
        );
        codeframe.entries.push(entry);
    }

    codeframe
}

/// Move appended catch-all entries back to the end of the codeframe.
///
/// Entries tagged [`CATCH_ALL_CATEGORY`] keep their relative order and are
/// renumbered above every other entry. Brand roll-up allocates numerics in
/// the thousands, so it runs before this in a generation run.
#[must_use]
pub fn move_catch_alls_last(mut codeframe: Codeframe) -> Codeframe {
    let (mut catch_alls, mut entries): (Vec<CodeframeEntry>, Vec<CodeframeEntry>) =
        std::mem::take(&mut codeframe.entries)
            .into_iter()
            .partition(|e| e.category.as_deref() == Some(CATCH_ALL_CATEGORY));

    let mut taken: HashSet<u32> = entries.iter().map(|e| e.numeric).collect();
    let mut next_numeric = entries
        .iter()
        .map(|e| e.numeric)
        .max()
        .unwrap_or(0)
        .saturating_add(1);
    for entry in &mut catch_alls {
        let numeric = next_free_numeric(&taken, next_numeric);
        taken.insert(numeric);
        next_numeric = numeric.saturating_add(1);
        entry.numeric = numeric;
    }

    entries.extend(catch_alls);
    codeframe.entries = entries;
    codeframe
}

/// Lowest numeric at or above `from` that is not taken, wrapping to 1 at `u32::MAX`.
pub(crate) fn next_free_numeric(taken: &HashSet<u32>, from: u32) -> u32 {
    let from = from.max(1);
    (from..=u32::MAX)
        .chain(1..from)
        .find(|n| !taken.contains(n))
        .unwrap_or(from)
}

/// `preferred`, or `preferred_2`, `preferred_3`, ... if already taken.
fn unused_code(codeframe: &Codeframe, preferred: &str) -> String {
    if codeframe.entry(preferred).is_none() {
        return preferred.to_string();
    }
    (2..)
        .map(|n| format!("{preferred}_{n}"))
        .find(|candidate| codeframe.entry(candidate).is_none())
        .unwrap_or_else(|| preferred.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;
    use vcode_core::{CodeframeStatus, QuestionType};

    use super::*;

    fn codeframe(entries: Vec<CodeframeEntry>) -> Codeframe {
        Codeframe {
            run_id: Uuid::new_v4(),
            group_id: "q1".to_string(),
            group_name: "Q1".to_string(),
            question_type: QuestionType::Miscellaneous,
            column_indices: vec![1],
            entries,
            sample_size: 0,
            total_responses: 0,
            generated_at: Utc::now(),
            status: CodeframeStatus::Generated,
            finalized_at: None,
        }
    }

    #[test]
    fn classify_ignores_case_and_punctuation() {
        assert_eq!(classify("OTHER"), Some(CatchAllKind::Other));
        assert_eq!(classify("None / Nothing"), Some(CatchAllKind::Nothing));
        assert_eq!(classify("Don't know"), Some(CatchAllKind::DontKnow));
        assert_eq!(classify("Don\u{2019}t Know"), Some(CatchAllKind::DontKnow));
        assert_eq!(classify("N/A"), Some(CatchAllKind::DontKnow));
        assert_eq!(classify("DK"), Some(CatchAllKind::DontKnow));
        assert_eq!(classify("Pepsi"), None);
        assert_eq!(classify("Other brands"), None);
    }

    #[test]
    fn appends_all_three_with_numerics_above_existing() {
        let cf = ensure_catch_all(codeframe(vec![
            CodeframeEntry::new("C001", 1, "Coca-Cola"),
            CodeframeEntry::new("C002", 7, "Pepsi"),
        ]));
        let tail: Vec<(&str, u32)> = cf.entries[2..]
            .iter()
            .map(|e| (e.label.as_str(), e.numeric))
            .collect();
        assert_eq!(
            tail,
            vec![("Other", 8), ("None/Nothing", 9), ("Don't Know", 10)]
        );
    }

    #[test]
    fn existing_catch_all_is_not_duplicated() {
        let cf = ensure_catch_all(codeframe(vec![
            CodeframeEntry::new("C001", 1, "Coca-Cola"),
            CodeframeEntry::new("C098", 98, "nothing"),
        ]));
        let nothing_count = cf
            .entries
            .iter()
            .filter(|e| classify(&e.label) == Some(CatchAllKind::Nothing))
            .count();
        assert_eq!(nothing_count, 1);
        assert_eq!(cf.entries.len(), 4);
    }

    #[test]
    fn is_idempotent() {
        let once = ensure_catch_all(codeframe(vec![CodeframeEntry::new("C001", 1, "Taste")]));
        let twice = ensure_catch_all(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn is_idempotent_for_many_shapes() {
        let shapes = vec![
            vec![],
            vec![CodeframeEntry::new("NA", 4, "N/A")],
            vec![
                CodeframeEntry::new("OTHER", 1, "Other brands"),
                CodeframeEntry::new("NONE", 2, "Nonetheless"),
            ],
            vec![
                CodeframeEntry::new("C001", 500, "Taste"),
                CodeframeEntry::new("C002", 9000, "Price"),
                CodeframeEntry::new("C003", 3, "Nothing"),
            ],
            vec![CodeframeEntry::new("C001", u32::MAX, "Taste")],
        ];

        for entries in shapes {
            let once = ensure_catch_all(codeframe(entries.clone()));
            let twice = ensure_catch_all(once.clone());
            assert_eq!(once, twice, "second pass changed {entries:?}");

            for kind in CatchAllKind::ALL {
                assert!(
                    once.entries.iter().any(|e| classify(&e.label) == Some(kind)),
                    "{kind:?} missing for {entries:?}"
                );
            }
            let codes: HashSet<&str> = once.entries.iter().map(|e| e.code.as_str()).collect();
            let numerics: HashSet<u32> = once.entries.iter().map(|e| e.numeric).collect();
            assert_eq!(codes.len(), once.entries.len(), "duplicate code for {entries:?}");
            assert_eq!(numerics.len(), once.entries.len(), "duplicate numeric for {entries:?}");
        }
    }

    #[test]
    fn maximum_numeric_does_not_overflow() {
        let cf = ensure_catch_all(codeframe(vec![CodeframeEntry::new("C001", u32::MAX, "Taste")]));
        let numerics: Vec<u32> = cf.entries.iter().map(|e| e.numeric).collect();
        assert_eq!(numerics, vec![u32::MAX, 1, 2, 3]);
    }

    #[test]
    fn next_free_numeric_skips_taken_and_wraps() {
        let taken: HashSet<u32> = [1, 2, 5, u32::MAX].into_iter().collect();
        assert_eq!(next_free_numeric(&taken, 5), 6);
        assert_eq!(next_free_numeric(&taken, 0), 3);
        assert_eq!(next_free_numeric(&taken, u32::MAX), 3);
    }

    #[test]
    fn catch_alls_move_behind_later_entries() {
        let mut cf = ensure_catch_all(codeframe(vec![CodeframeEntry::new("C001", 1, "Taste")]));
        cf.entries
            .push(CodeframeEntry::new("BRAND_PEPSICO", 1000, "PepsiCo").with_category("brand"));

        let moved = move_catch_alls_last(cf);
        let order: Vec<(&str, u32)> = moved
            .entries
            .iter()
            .map(|e| (e.code.as_str(), e.numeric))
            .collect();
        assert_eq!(
            order,
            vec![
                ("C001", 1),
                ("BRAND_PEPSICO", 1000),
                ("OTHER", 1001),
                ("NONE", 1002),
                ("DK", 1003),
            ]
        );
        assert_eq!(move_catch_alls_last(moved.clone()), moved);
    }

    #[test]
    fn empty_codeframe_gets_all_three() {
        let cf = ensure_catch_all(codeframe(vec![]));
        let numerics: Vec<u32> = cf.entries.iter().map(|e| e.numeric).collect();
        assert_eq!(numerics, vec![1, 2, 3]);
        assert!(cf.entries.iter().all(is_catch_all));
    }

    #[test]
    fn colliding_code_gets_suffix() {
        let cf = ensure_catch_all(codeframe(vec![CodeframeEntry::new("OTHER", 1, "Other brands")]));
        assert!(cf.entry("OTHER_2").is_some());
        assert_eq!(cf.entry("OTHER_2").map(|e| e.label.as_str()), Some("Other"));
    }
}
