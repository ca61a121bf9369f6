use crate::filters::{ordered, where_clause::Where};
use serde::{Deserialize, Serialize};

/// Sub-field include/exclude lists of a related entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSubset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub without: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectField {
    pub include: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldSubset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Select>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Where>,
}

impl SelectField {
    pub fn included() -> Self {
        SelectField {
            include: true,
            ..Default::default()
        }
    }

    pub fn excluded() -> Self {
        SelectField::default()
    }
}

/// Projection directives, field name to [`SelectField`], in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Select {
    #[serde(with = "ordered")]
    entries: Vec<(String, SelectField)>,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, field: SelectField) -> Self {
        ordered::upsert(&mut self.entries, name.into(), field);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SelectField)> {
        self.entries.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_select_json() {
        let source = json!({
            "name": {"include": true},
            "posts": {
                "include": true,
                "fields": {"without": ["body"]},
                "where": {"published": {"Is": true}}
            }
        });
        let select: Select = serde_json::from_value(source.clone()).unwrap();

        let posts = select.iter().nth(1).unwrap().1;
        assert!(posts.include);
        assert_eq!(
            posts.fields.as_ref().unwrap().without,
            Some(vec!["body".to_string()])
        );
        assert!(posts.where_clause.is_some());
        assert_eq!(serde_json::to_value(&select).unwrap(), source);
    }
}
