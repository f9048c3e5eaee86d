//! FILENAME: core/report-export/src/sheet_name.rs
//! Worksheet naming for one export.
//!
//! Excel caps sheet names at 31 characters, forbids `: \ / ? * [ ]`,
//! rejects blank names and leading/trailing apostrophes, reserves
//! `History`, and compares names case-insensitively. Group labels are
//! free text, so every label is coerced into a legal, unused name.

use std::collections::HashSet;

/// Maximum sheet name length, in characters.
pub const MAX_SHEET_NAME_CHARS: usize = 31;

const FORBIDDEN: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];
const RESERVED: [&str; 1] = ["history"];
const FALLBACK_NAME: &str = "Sheet";

/// Truncates to 31 characters and replaces forbidden characters with `_`.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .take(MAX_SHEET_NAME_CHARS)
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();

    if name.trim().is_empty() {
        return FALLBACK_NAME.to_string();
    }
    if name.starts_with('\'') {
        name.replace_range(..1, "_");
    }
    if name.ends_with('\'') {
        let last = name.len() - 1;
        name.replace_range(last.., "_");
    }
    name
}

/// Hands out unique sheet names. Lives for a single export call.
#[derive(Debug, Default)]
pub struct SheetNamer {
    /// Lowercased names already handed out.
    used: HashSet<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_taken(&self, candidate: &str) -> bool {
        let folded = candidate.to_lowercase();
        self.used.contains(&folded) || RESERVED.contains(&folded.as_str())
    }

    /// Returns a legal name for `label` not yet used in this export.
    ///
    /// On collision `_1`, `_2`, ... is appended, shrinking the base so the
    /// result never exceeds 31 characters.
    pub fn assign(&mut self, label: &str) -> String {
        let base = sanitize_sheet_name(label);
        if !self.is_taken(&base) {
            self.used.insert(base.to_lowercase());
            return base;
        }

        let mut n: usize = 1;
        loop {
            let suffix = format!("_{}", n);
            let keep = MAX_SHEET_NAME_CHARS.saturating_sub(suffix.chars().count());
            let trimmed: String = base.chars().take(keep).collect();
            let candidate = format!("{}{}", trimmed, suffix);

            if !self.is_taken(&candidate) {
                log::debug!(target: "EXPORT", "sheet name {:?} taken, using {:?}", base, candidate);
                self.used.insert(candidate.to_lowercase());
                return candidate;
            }
            n += 1;
        }
    }
}
