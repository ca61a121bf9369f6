use crate::error::FilterError;
use model::filters::{Order, QueryFilters, Select, Where};

/// One target representation of [`QueryFilters`].
///
/// Order and select compilation are seams: the defaults compile to the
/// backend's empty form, which leaves the natural order and the full
/// projection in place.
pub trait FilterBackend {
    type Where;
    type Order: Default;
    type Select: Default;

    fn compile_where(&self, where_clause: Option<&Where>) -> Result<Self::Where, FilterError>;

    fn compile_order(&self, _order: &Order) -> Result<Self::Order, FilterError> {
        Ok(Self::Order::default())
    }

    fn compile_select(&self, _select: &Select) -> Result<Self::Select, FilterError> {
        Ok(Self::Select::default())
    }

    /// Compiles all three parts of an envelope; absent parts compile to
    /// their empty form.
    fn compile(
        &self,
        filters: &QueryFilters,
    ) -> Result<(Self::Where, Self::Order, Self::Select), FilterError> {
        let where_clause = self.compile_where(filters.where_clause.as_ref())?;
        let order = match &filters.order {
            Some(order) => self.compile_order(order)?,
            None => Self::Order::default(),
        };
        let select = match &filters.select {
            Some(select) => self.compile_select(select)?,
            None => Self::Select::default(),
        };
        Ok((where_clause, order, select))
    }
}
