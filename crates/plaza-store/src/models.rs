use serde_json::Value;

use crate::StoreError;

/// A stored document as it sits in SQLite. The body is the JSON text of the
/// whole subtree rooted at `path`; rows never nest.
pub struct DocumentRow {
    pub path: String,
    pub body: String,
}

impl DocumentRow {
    pub fn parse(&self) -> Result<Value, StoreError> {
        serde_json::from_str(&self.body).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Segments of this row's path below `ancestor`.
    pub fn segments_below(&self, ancestor: &str) -> Vec<&str> {
        self.path[ancestor.len()..]
            .split('/')
            .filter(|s| !s.is_empty())
            .collect()
    }
}
