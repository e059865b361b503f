use serde::{Deserialize, Serialize};

/// A rendered page. Identical `rendered_at_nanos` across responses means
/// they were served from one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub path: String,
    pub render: u64,
    pub rendered_at_nanos: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStats {
    pub renders: u64,
    pub in_flight: usize,
}
