use serde::de::DeserializeOwned;
use serde_json::Value;

/// The value at a store path at one instant.
///
/// A subscribed path delivers a whole new `Snapshot` on every change under
/// it, never a per-record diff.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Absent,
    Present(Value),
}

impl Snapshot {
    pub fn from_value(value: Value) -> Self {
        if value.is_null() {
            Self::Absent
        } else {
            Self::Present(value)
        }
    }

    pub fn exists(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// Decode a point read into a record. `Ok(None)` when nothing is stored.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        match self {
            Self::Present(value) => serde_json::from_value(value.clone()).map(Some),
            Self::Absent => Ok(None),
        }
    }

    /// Flatten a collection snapshot into `(key, record)` pairs in key order.
    /// Scalars and absent paths have no children.
    pub fn into_children(self) -> Vec<(String, Value)> {
        match self {
            Self::Present(Value::Object(map)) => {
                let mut children: Vec<(String, Value)> = map.into_iter().collect();
                children.sort_by(|a, b| a.0.cmp(&b.0));
                children
            }
            _ => Vec::new(),
        }
    }
}

impl From<Option<Value>> for Snapshot {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Absent, Self::from_value)
    }
}
