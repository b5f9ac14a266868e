/// Normalize a name for use as a join key: trimmed, then uppercased.
///
/// Deliberately nothing more: no accent folding, no inner whitespace
/// collapsing, no fuzzy matching.
pub fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}
