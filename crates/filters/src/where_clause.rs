//! The canonical traversal of a [`Where`] tree, shared by every backend.
//!
//! Fields are AND-combined in insertion order, the members of a `OneOf`
//! group are OR-combined, and each populated operator of a field's
//! predicate becomes one leaf. Backends only supply the constructors.

use crate::error::FilterError;
use model::{
    core::value::Value,
    filters::{Clause, Operator, Where},
};
use tracing::trace;

/// Backend constructors used by [`lower_where`].
pub trait WhereLowering {
    /// The backend's condition type.
    type Condition;
    /// A resolved field reference.
    type Field;

    /// The condition that matches every row.
    fn always_true(&self) -> Self::Condition;

    fn resolve(&self, field: &str) -> Result<Self::Field, FilterError>;

    /// One condition for `operator` applied to `field`. `None` drops the
    /// operator.
    fn leaf(&self, field: &Self::Field, operator: Operator, value: &Value)
    -> Option<Self::Condition>;

    /// Conjunction of two or more conditions.
    fn and(&self, conditions: Vec<Self::Condition>) -> Self::Condition;

    /// Disjunction of one or more conditions.
    fn or(&self, conditions: Vec<Self::Condition>) -> Self::Condition;
}

/// Lowers an optional tree into a single condition. An absent or empty tree
/// yields [`WhereLowering::always_true`].
pub fn lower_where<L: WhereLowering>(
    lowering: &L,
    where_clause: Option<&Where>,
) -> Result<L::Condition, FilterError> {
    let conditions = match where_clause {
        Some(where_clause) => lower_clauses(lowering, where_clause)?,
        None => Vec::new(),
    };
    trace!(conditions = conditions.len(), "Lowered where clause");
    Ok(collapse(lowering, conditions))
}

/// Lowers each clause of `where_clause` on its own, in insertion order,
/// without combining them. Clauses that contribute nothing are omitted.
pub fn lower_clauses<L: WhereLowering>(
    lowering: &L,
    where_clause: &Where,
) -> Result<Vec<L::Condition>, FilterError> {
    let mut conditions = Vec::new();

    for clause in where_clause.clauses() {
        match clause {
            Clause::OneOf(groups) => {
                if groups.is_empty() {
                    continue;
                }
                let members = groups
                    .iter()
                    .map(|group| lower_where(lowering, Some(group)))
                    .collect::<Result<Vec<_>, _>>()?;
                conditions.push(lowering.or(members));
            }
            Clause::Field {
                predicate: None, ..
            } => {}
            Clause::Field {
                name,
                predicate: Some(predicate),
            } => {
                let field = lowering.resolve(name)?;
                let leaves = predicate
                    .effective()
                    .filter_map(|(op, value)| lowering.leaf(&field, op, value))
                    .collect::<Vec<_>>();
                if !leaves.is_empty() {
                    conditions.push(collapse(lowering, leaves));
                }
            }
        }
    }

    Ok(conditions)
}

/// 0 conditions: always true; 1: itself; more: their conjunction.
pub fn collapse<L: WhereLowering>(lowering: &L, mut conditions: Vec<L::Condition>) -> L::Condition {
    match conditions.len() {
        0 => lowering.always_true(),
        1 => conditions.remove(0),
        _ => lowering.and(conditions),
    }
}
