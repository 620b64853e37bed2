//! Case-insensitive substring filter for list views.
//!
//! # Invariants
//! - Blank queries (after trimming) mean "no filter".
//! - `%`, `_` and `\` in user text are matched literally.
//! - Case folding follows SQLite `LIKE` (ASCII only).

/// Escape character used in generated `LIKE` clauses.
pub const LIKE_ESCAPE: char = '\\';

/// Normalized substring query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFilter {
    text: String,
}

impl TextFilter {
    /// Returns `None` for absent or blank input.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let trimmed = raw?.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            text: trimmed.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// `%text%` with `LIKE` wildcards escaped.
    pub fn like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.text.len() + 2);
        pattern.push('%');
        for ch in self.text.chars() {
            if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
                pattern.push(LIKE_ESCAPE);
            }
            pattern.push(ch);
        }
        pattern.push('%');
        pattern
    }

    /// SQL predicate matching `column` against [`Self::like_pattern`].
    pub fn sql_predicate(column: &str) -> String {
        format!("{column} LIKE ? ESCAPE '{LIKE_ESCAPE}'")
    }
}
