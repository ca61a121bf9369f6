use crate::filters::ordered;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// Sort directives, field name to direction, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Order {
    #[serde(with = "ordered")]
    entries: Vec<(String, OrderDirection)>,
}

impl Order {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        ordered::upsert(&mut self.entries, field.into(), direction);
        self
    }

    pub fn asc(self, field: impl Into<String>) -> Self {
        self.by(field, OrderDirection::Asc)
    }

    pub fn desc(self, field: impl Into<String>) -> Self {
        self.by(field, OrderDirection::Desc)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, OrderDirection)> {
        self.entries.iter().map(|(field, dir)| (field.as_str(), *dir))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
