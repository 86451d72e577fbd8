/// A tracked symbol: its display label and its column group in each log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSlot {
    pub label: String,
    pub group: usize,
}

impl SymbolSlot {
    pub fn new(label: impl Into<String>, group: usize) -> Self {
        Self {
            label: label.into(),
            group,
        }
    }
}

/// Slots in log column order; slot 0 is the primary symbol.
pub fn slots_from_labels<S: AsRef<str>>(labels: &[S]) -> Vec<SymbolSlot> {
    labels
        .iter()
        .enumerate()
        .map(|(group, label)| SymbolSlot::new(label.as_ref(), group))
        .collect()
}
