use serde::Serialize;

use crate::model::fragment::{CapsuleTag, Fragment};
use crate::parse::canonical::normalize_label;
use crate::parse::shorthand::NoMatch;

/// Result of resolving a fragment sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentCapture {
    /// Normalized label from the first `bed` capsule; `None` means unassigned
    pub bed_label: Option<String>,
    pub task_text: String,
}

/// Resolve an ordered fragment sequence into a bed label and task text.
///
/// The first non-blank `bed` capsule names the bed. Every non-blank fragment,
/// including that capsule, contributes to the text in order, capsules as
/// `[value]`. Blank input yields `NoMatch`.
pub fn parse_fragments(fragments: &[Fragment]) -> Result<FragmentCapture, NoMatch> {
    let bed_label = fragments.iter().find_map(|f| match f {
        Fragment::Capsule {
            tag: CapsuleTag::Bed,
            value,
        } if !value.trim().is_empty() => Some(normalize_label(value)),
        _ => None,
    });

    let task_text = fragments
        .iter()
        .filter(|f| !f.value().trim().is_empty())
        .map(Fragment::rendered)
        .collect::<Vec<_>>()
        .join(" ");

    if task_text.is_empty() {
        return Err(NoMatch);
    }

    Ok(FragmentCapture {
        bed_label,
        task_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bed_capsule_sets_label_and_renders_inline() {
        let capture = parse_fragments(&[
            Fragment::text("give"),
            Fragment::capsule(CapsuleTag::Bed, "3A04C"),
            Fragment::text("furosemide"),
        ])
        .unwrap();
        assert_eq!(capture.bed_label.as_deref(), Some("03A-04C"));
        assert_eq!(capture.task_text, "give [3A04C] furosemide");
    }

    #[test]
    fn no_bed_capsule_is_unassigned() {
        let capture = parse_fragments(&[
            Fragment::text("give"),
            Fragment::capsule(CapsuleTag::Drug, "furosemide"),
            Fragment::text("40mg IV"),
        ])
        .unwrap();
        assert_eq!(capture.bed_label, None);
        assert_eq!(capture.task_text, "give [furosemide] 40mg IV");
    }

    #[test]
    fn first_bed_capsule_wins() {
        let capture = parse_fragments(&[
            Fragment::capsule(CapsuleTag::Bed, "5a01"),
            Fragment::capsule(CapsuleTag::Bed, "6b02"),
            Fragment::capsule(CapsuleTag::Test, "CBC"),
        ])
        .unwrap();
        assert_eq!(capture.bed_label.as_deref(), Some("05A-01"));
        assert_eq!(capture.task_text, "[5a01] [6b02] [CBC]");
    }

    #[test]
    fn blank_fragments_are_skipped() {
        let capture = parse_fragments(&[
            Fragment::text("  "),
            Fragment::capsule(CapsuleTag::Bed, " "),
            Fragment::text(" recheck lactate "),
        ])
        .unwrap();
        assert_eq!(capture.bed_label, None);
        assert_eq!(capture.task_text, "recheck lactate");
    }

    #[test]
    fn empty_sequence_is_no_match() {
        assert_eq!(parse_fragments(&[]), Err(NoMatch));
        assert_eq!(parse_fragments(&[Fragment::text("   ")]), Err(NoMatch));
    }

    #[test]
    fn free_form_bed_values_are_upper_cased() {
        let capture =
            parse_fragments(&[Fragment::capsule(CapsuleTag::Bed, "icu-3"), Fragment::text("x")])
                .unwrap();
        assert_eq!(capture.bed_label.as_deref(), Some("ICU-3"));
    }
}
