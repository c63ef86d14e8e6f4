use serde::Deserialize;

/// Runtime settings of an [`EntityService`](crate::service::EntityService).
///
/// Deserializable so it can live in the application's own configuration file; every
/// field is optional.
///
/// ```rust,ignore
/// let config: CrudConfig = serde_json::from_str(r#"{"elements_per_page": 50}"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CrudConfig {
    /// Page size of paginated listings
    pub elements_per_page: u64,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            elements_per_page: 20,
        }
    }
}

impl CrudConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero is ignored and keeps the current value.
    #[must_use]
    pub fn elements_per_page(mut self, elements_per_page: u64) -> Self {
        if elements_per_page > 0 {
            self.elements_per_page = elements_per_page;
        }
        self
    }
}
