use serde::{Deserialize, Serialize};

/// A geocoded place: the caller's query plus the provider's resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub query: String,
    pub lat: f64,
    pub lng: f64,
    pub display_name: Option<String>,
    pub source: String,
}
