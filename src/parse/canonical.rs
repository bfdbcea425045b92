use std::sync::LazyLock;

use regex::Regex;

/// Width ward and bed numbers are zero-padded to.
const PAD_WIDTH: usize = 2;

/// A whole label typed directly: `5a01`, `05A-01B`, `3a04c`
static FULL_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2}[a-d])-?(\d{1,2}[a-z]?)$").expect("valid label regex")
});

/// A ward-only label: `9c`, `09C`
static WARD_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{1,2})([a-z])$").expect("valid ward regex"));

/// Build the canonical label from a segmented ward token (`5a`) and bed
/// token (`01`, `1b`).
///
/// `canonicalize("5a", "01") == "05A-01"`, `canonicalize("3A", "4c") == "03A-04C"`.
/// Callers pass tokens already matched by a grammar; anything else is still
/// padded and upper-cased, never rejected.
pub fn canonicalize(ward_token: &str, bed_token: &str) -> String {
    format!("{}-{}", canonical_part(ward_token), canonical_part(bed_token))
}

/// Normalize a label that did not come through the shorthand parser
/// (store lookups, `bed` capsules, snapshot rehydration).
///
/// Full ward+bed tokens are canonicalized, ward-only tokens are padded,
/// anything else is trimmed and upper-cased. Idempotent.
pub fn normalize_label(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(caps) = FULL_LABEL.captures(trimmed) {
        return canonicalize(&caps[1], &caps[2]);
    }
    if let Some(caps) = WARD_LABEL.captures(trimmed) {
        return format!("{}{}", pad(&caps[1]), caps[2].to_ascii_uppercase());
    }
    trimmed.to_uppercase()
}

/// `5a` → `05A`, `01` → `01`, `1b` → `01B`
fn canonical_part(token: &str) -> String {
    let split = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    let (digits, letters) = token.split_at(split);
    format!("{}{}", pad(digits), letters.to_ascii_uppercase())
}

fn pad(digits: &str) -> String {
    format!("{:0>width$}", digits, width = PAD_WIDTH)
}
