//! Request-scoped counter values

/// The three counter values reported back to the embedding page.
///
/// Each slot holds the decimal rendering of the store's answer, or `"0"` when
/// that store operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub site_uv: String,
    pub site_pv: String,
    pub page_pv: String,
}

impl CounterSnapshot {
    /// Build from per-operation outcomes, `None` meaning the operation failed
    pub fn from_outcomes(site_uv: Option<i64>, site_pv: Option<i64>, page_pv: Option<i64>) -> Self {
        let render = |value: Option<i64>| value.map_or_else(|| "0".to_string(), |n| n.to_string());
        Self {
            site_uv: render(site_uv),
            site_pv: render(site_pv),
            page_pv: render(page_pv),
        }
    }
}

impl Default for CounterSnapshot {
    fn default() -> Self {
        Self::from_outcomes(None, None, None)
    }
}

/// What a single page load is counted against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    /// Hostname of the embedding page
    pub site: String,
    /// Path of the embedding page
    pub path: String,
    /// Identity used for unique-visitor tracking
    pub visitor_id: String,
}
