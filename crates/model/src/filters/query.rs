use crate::filters::{order::Order, select::Select, where_clause::Where};
use serde::{Deserialize, Serialize};

/// The envelope handed to every compiler: `{ where?, order?, select? }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilters {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Where>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Select>,
}

impl QueryFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_where(mut self, where_clause: Where) -> Self {
        self.where_clause = Some(where_clause);
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_select(mut self, select: Select) -> Self {
        self.select = Some(select);
        self
    }
}

impl From<Where> for QueryFilters {
    fn from(where_clause: Where) -> Self {
        QueryFilters::new().with_where(where_clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_envelope() {
        let filters: QueryFilters = serde_json::from_value(json!({
            "where": {"name": {"Contains": "john"}},
            "order": {"name": "asc"}
        }))
        .unwrap();

        assert!(filters.where_clause.is_some());
        assert!(filters.order.is_some());
        assert!(filters.select.is_none());
    }

    #[test]
    fn test_empty_envelope() {
        let filters: QueryFilters = serde_json::from_str("{}").unwrap();
        assert_eq!(filters, QueryFilters::default());
        assert_eq!(serde_json::to_string(&filters).unwrap(), "{}");
    }
}
