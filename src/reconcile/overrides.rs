use std::collections::BTreeMap;

use hashbrown::HashMap;

use super::normalize;

/// Static state → capital table used to fill capitals the join left empty.
#[derive(Debug, Clone, Default)]
pub struct CapitalOverrides {
    entries: HashMap<String, String>,
}

impl CapitalOverrides {
    pub fn new(table: &BTreeMap<String, String>) -> Self {
        let entries = table
            .iter()
            .map(|(state, capital)| (normalize(state), capital.clone()))
            .collect();
        Self { entries }
    }

    /// Forced capital for a state, matched after normalization
    pub fn get(&self, state: &str) -> Option<&str> {
        self.entries.get(&normalize(state)).map(String::as_str)
    }

    /// Fill `capital` from the table when it is null.
    ///
    /// A capital that was already resolved is never replaced. Returns
    /// whether the override was applied.
    pub fn apply(&self, state: Option<&str>, capital: &mut Option<String>) -> bool {
        if capital.is_some() {
            return false;
        }
        match state.and_then(|s| self.get(s)) {
            Some(forced) => {
                *capital = Some(forced.to_string());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> CapitalOverrides {
        let mut table = BTreeMap::new();
        table.insert("HARYANA".to_string(), "CHANDIGARH".to_string());
        table.insert("PUNJAB".to_string(), "CHANDIGARH".to_string());
        CapitalOverrides::new(&table)
    }

    #[test]
    fn test_fills_null_capital() {
        let mut capital = None;
        assert!(reference().apply(Some("HARYANA"), &mut capital));
        assert_eq!(capital.as_deref(), Some("CHANDIGARH"));
    }

    #[test]
    fn test_never_replaces_resolved_capital() {
        let mut capital = Some("MOHALI".to_string());
        assert!(!reference().apply(Some("PUNJAB"), &mut capital));
        assert_eq!(capital.as_deref(), Some("MOHALI"));
    }

    #[test]
    fn test_trailing_space_matches() {
        let mut capital = None;
        assert!(reference().apply(Some("HARYANA "), &mut capital));
        assert_eq!(capital.as_deref(), Some("CHANDIGARH"));
        assert_eq!(reference().get("haryana"), Some("CHANDIGARH"));
    }

    #[test]
    fn test_unknown_or_missing_state() {
        let mut capital = None;
        assert!(!reference().apply(Some("KERALA"), &mut capital));
        assert!(!reference().apply(None, &mut capital));
        assert!(capital.is_none());
    }
}
