use crate::filters::predicate::Predicate;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use std::fmt;

/// Key of the disjunction group in the JSON form of a [`Where`].
pub const ONE_OF_KEY: &str = "OneOf";

/// One entry of a [`Where`] tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// A field predicate. `None` stands for an absent/null predicate and
    /// contributes nothing.
    Field {
        name: String,
        predicate: Option<Predicate>,
    },
    /// Nested trees combined with OR.
    OneOf(Vec<Where>),
}

/// A predicate tree: field predicates combined with AND plus an optional
/// group of nested trees combined with OR.
///
/// Clauses keep insertion order. Re-adding a field, or setting the group
/// again, replaces the existing clause in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    clauses: Vec<Clause>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(self, name: impl Into<String>, predicate: Predicate) -> Self {
        self.maybe_field(name, Some(predicate))
    }

    pub fn maybe_field(mut self, name: impl Into<String>, predicate: Option<Predicate>) -> Self {
        let name = name.into();
        let existing = self.clauses.iter_mut().find(
            |clause| matches!(clause, Clause::Field { name: existing, .. } if *existing == name),
        );
        match existing {
            Some(Clause::Field { predicate: slot, .. }) => *slot = predicate,
            _ => self.clauses.push(Clause::Field { name, predicate }),
        }
        self
    }

    pub fn one_of(mut self, groups: Vec<Where>) -> Self {
        match self
            .clauses
            .iter_mut()
            .find(|clause| matches!(clause, Clause::OneOf(_)))
        {
            Some(slot) => *slot = Clause::OneOf(groups),
            None => self.clauses.push(Clause::OneOf(groups)),
        }
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Field clauses with a present predicate, in order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Predicate)> {
        self.clauses.iter().filter_map(|clause| match clause {
            Clause::Field {
                name,
                predicate: Some(predicate),
            } => Some((name.as_str(), predicate)),
            _ => None,
        })
    }

    pub fn groups(&self) -> Option<&[Where]> {
        self.clauses.iter().find_map(|clause| match clause {
            Clause::OneOf(groups) => Some(groups.as_slice()),
            _ => None,
        })
    }
}

impl Serialize for Where {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.clauses.len()))?;
        for clause in &self.clauses {
            match clause {
                Clause::Field { name, predicate } => map.serialize_entry(name, predicate)?,
                Clause::OneOf(groups) => map.serialize_entry(ONE_OF_KEY, groups)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Where {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(WhereVisitor)
    }
}

struct WhereVisitor;

impl<'de> Visitor<'de> for WhereVisitor {
    type Value = Where;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of field predicates with an optional OneOf group")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Where, A::Error> {
        let mut tree = Where::new();
        while let Some(key) = access.next_key::<String>()? {
            if key == ONE_OF_KEY {
                // A null group is treated as absent.
                if let Some(groups) = access.next_value::<Option<Vec<Where>>>()? {
                    tree = tree.one_of(groups);
                }
            } else {
                let predicate = access.next_value::<Option<Predicate>>()?;
                tree = tree.maybe_field(key, predicate);
            }
        }
        Ok(tree)
    }
}
