//! Per-article reference table built from `[label]: location` lines.

use std::collections::HashMap;

use crate::links;

/// Label to location mapping for one article. Labels match case-insensitively
/// and with whitespace runs collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    /// Normalized label to raw location.
    entries: HashMap<String, String>,
}

impl ReferenceTable {
    /// Collect every definition in the given lines. The whole article must be
    /// passed before any reference usage is resolved against the table.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut table = Self::default();
        for definition in lines.into_iter().filter_map(links::find_definition) {
            table.insert(&definition.alt_text, &definition.raw_location);
        }
        return table;
    }

    /// Look up the location declared for a label.
    pub fn get(&self, label: &str) -> Option<&str> {
        return self.entries.get(&normalize_label(label)).map(String::as_str);
    }

    /// Declare a label. The first declaration of a label wins; returns whether
    /// this one was recorded.
    pub fn insert(&mut self, label: &str, location: &str) -> bool {
        let key = normalize_label(label);
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, location.to_string());
        return true;
    }
}

/// Lowercase and collapse whitespace so `[Foo  Bar]` matches `[foo bar]`.
fn normalize_label(label: &str) -> String {
    return label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
}
