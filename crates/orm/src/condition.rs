use chrono::{DateTime, NaiveDate, Utc};
use sea_query::{ColumnRef, Expr, SimpleExpr, Value};

use crate::error::{Error, Result};

/// Comparison operators a predicate can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    NotNull,
    IsNull,
    In,
    Like,
}

/// The right-hand side of a predicate: a single value or a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    List(Vec<Value>),
}

macro_rules! scalar_operand {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Self::Value(value.into())
                }
            }
        )*
    };
}

scalar_operand!(
    bool,
    i32,
    i64,
    u32,
    u64,
    f32,
    f64,
    String,
    &str,
    NaiveDate,
    DateTime<Utc>,
    serde_json::Value,
    Value,
);

impl<T> From<Option<T>> for Operand
where
    Option<T>: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        Self::Value(value.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Operand {
    fn from(values: [T; N]) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// One `(column, operator, value)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
    /// `None` for the null tests.
    pub operand: Option<Operand>,
}

impl Predicate {
    /// Render the predicate against a resolved column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Type`] if the operand does not suit the operator.
    pub(crate) fn to_expr(&self, column: ColumnRef) -> Result<SimpleExpr> {
        let expr = Expr::col(column);
        match (self.operator, &self.operand) {
            (Operator::NotNull, _) => Ok(expr.is_not_null()),
            (Operator::IsNull, _) => Ok(expr.is_null()),
            (Operator::In, Some(Operand::List(values))) => Ok(expr.is_in(values.iter().cloned())),
            // a lone scalar means a one-element set
            (Operator::In, Some(Operand::Value(value))) if is_primitive(value) => {
                Ok(expr.is_in([value.clone()]))
            }
            (Operator::In, Some(Operand::Value(value))) => Err(Error::Type(format!(
                "IN on `{}` needs a collection or primitive value, got {value:?}",
                self.column
            ))),
            (operator, Some(Operand::List(_))) => Err(Error::Type(format!(
                "{operator:?} on `{}` does not accept a collection",
                self.column
            ))),
            (operator, None) => {
                Err(Error::Type(format!("{operator:?} on `{}` needs a value", self.column)))
            }
            (Operator::Equal, Some(Operand::Value(value))) => Ok(expr.eq(value.clone())),
            (Operator::NotEqual, Some(Operand::Value(value))) => Ok(expr.ne(value.clone())),
            (Operator::GreaterThan, Some(Operand::Value(value))) => Ok(expr.gt(value.clone())),
            (Operator::LessThan, Some(Operand::Value(value))) => Ok(expr.lt(value.clone())),
            (Operator::Like, Some(Operand::Value(Value::String(Some(pattern))))) => {
                Ok(expr.like(pattern.as_str()))
            }
            (Operator::Like, Some(Operand::Value(other))) => Err(Error::Type(format!(
                "LIKE on `{}` needs a string, got {other:?}",
                self.column
            ))),
        }
    }
}

const fn is_primitive(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(_)
            | Value::TinyInt(_)
            | Value::SmallInt(_)
            | Value::Int(_)
            | Value::BigInt(_)
            | Value::TinyUnsigned(_)
            | Value::SmallUnsigned(_)
            | Value::Unsigned(_)
            | Value::BigUnsigned(_)
            | Value::Float(_)
            | Value::Double(_)
            | Value::Char(_)
            | Value::String(_)
    )
}

/// Predicates on the columns of a single table, combined with `AND`.
///
/// Conditions are scoped to one table; predicates across several tables need
/// one condition per table.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    table: String,
    predicates: Vec<Predicate>,
}

impl Condition {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicates: Vec::new(),
        }
    }

    fn push(
        mut self, column: impl Into<String>, operator: Operator, operand: Option<Operand>,
    ) -> Self {
        self.predicates.push(Predicate {
            column: column.into(),
            operator,
            operand,
        });
        self
    }

    #[must_use]
    pub fn eq(self, column: impl Into<String>, value: impl Into<Operand>) -> Self {
        self.push(column, Operator::Equal, Some(value.into()))
    }

    /// Adds `column = value` only when `condition` holds.
    #[must_use]
    pub fn eq_if(
        self, condition: bool, column: impl Into<String>, value: impl Into<Operand>,
    ) -> Self {
        if condition { self.eq(column, value) } else { self }
    }

    #[must_use]
    pub fn ne(self, column: impl Into<String>, value: impl Into<Operand>) -> Self {
        self.push(column, Operator::NotEqual, Some(value.into()))
    }

    #[must_use]
    pub fn gt(self, column: impl Into<String>, value: impl Into<Operand>) -> Self {
        self.push(column, Operator::GreaterThan, Some(value.into()))
    }

    #[must_use]
    pub fn lt(self, column: impl Into<String>, value: impl Into<Operand>) -> Self {
        self.push(column, Operator::LessThan, Some(value.into()))
    }

    #[must_use]
    pub fn not_null(self, column: impl Into<String>) -> Self {
        self.push(column, Operator::NotNull, None)
    }

    #[must_use]
    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.push(column, Operator::IsNull, None)
    }

    /// `column IN (values)`. A single scalar is treated as a one-element set.
    #[must_use]
    pub fn r#in(self, column: impl Into<String>, values: impl Into<Operand>) -> Self {
        self.push(column, Operator::In, Some(values.into()))
    }

    /// `column LIKE '%value%'`.
    #[must_use]
    pub fn like(self, column: impl Into<String>, value: &str) -> Self {
        self.push(column, Operator::Like, Some(Operand::Value(format!("%{value}%").into())))
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use sea_query::{Alias, IntoIden};

    use super::*;

    fn column(name: &str) -> ColumnRef {
        ColumnRef::Column(Alias::new(name).into_iden())
    }

    #[test]
    fn scalar_in_matches_single_element_list() {
        let condition = Condition::new("users").r#in("id", 5).r#in("id", vec![5]);
        let [scalar, list] = condition.predicates() else {
            panic!("expected two predicates");
        };

        assert_eq!(scalar.to_expr(column("id")).unwrap(), list.to_expr(column("id")).unwrap());
    }

    #[test]
    fn in_rejects_non_primitive_scalar() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let condition = Condition::new("users").r#in("born", date);
        let err = condition.predicates()[0].to_expr(column("born")).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn list_rejected_outside_in() {
        let condition = Condition::new("users").eq("id", [1, 2]);
        let err = condition.predicates()[0].to_expr(column("id")).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn like_wraps_value() {
        let condition = Condition::new("users").like("name", "ann");
        assert_eq!(
            condition.predicates()[0].operand,
            Some(Operand::Value(Value::from("%ann%")))
        );
    }

    #[test]
    fn eq_if_skips_when_false() {
        let condition = Condition::new("users").eq_if(false, "name", "x").eq_if(true, "id", 1);
        assert_eq!(condition.predicates().len(), 1);
        assert_eq!(condition.predicates()[0].column, "id");
        assert!(!condition.is_empty());
    }
}
