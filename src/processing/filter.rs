//! Predicate-based row filtering for [`crate::types::DataSet`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, DataType, Value};

/// Comparison operators supported by [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `in`: membership in a list of values.
    In,
    /// `notin`: non-membership in a list of values.
    NotIn,
    /// `contains`: substring for text columns, element membership for list columns.
    Contains,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::Eq,
        Operation::Ne,
        Operation::Gt,
        Operation::Ge,
        Operation::Lt,
        Operation::Le,
        Operation::In,
        Operation::NotIn,
        Operation::Contains,
    ];

    /// Operator spelling used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Eq => "==",
            Operation::Ne => "!=",
            Operation::Gt => ">",
            Operation::Ge => ">=",
            Operation::Lt => "<",
            Operation::Le => "<=",
            Operation::In => "in",
            Operation::NotIn => "notin",
            Operation::Contains => "contains",
        }
    }

    fn takes_list(self) -> bool {
        matches!(self, Operation::In | Operation::NotIn)
    }

    fn is_ordering(self) -> bool {
        matches!(self, Operation::Gt | Operation::Ge | Operation::Lt | Operation::Le)
    }

    /// Row test for this operator: `(cell, values) -> keep`.
    fn handler(self) -> fn(&Value, &Value) -> bool {
        match self {
            Operation::Eq => values_equal,
            Operation::Ne => |cell, v| !values_equal(cell, v),
            Operation::Gt => |cell, v| compare(cell, v) == Some(Ordering::Greater),
            Operation::Ge => |cell, v| matches!(compare(cell, v), Some(Ordering::Greater | Ordering::Equal)),
            Operation::Lt => |cell, v| compare(cell, v) == Some(Ordering::Less),
            Operation::Le => |cell, v| matches!(compare(cell, v), Some(Ordering::Less | Ordering::Equal)),
            Operation::In => is_member,
            Operation::NotIn => |cell, v| !is_member(cell, v),
            Operation::Contains => contains,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "not_in" {
            return Ok(Operation::NotIn);
        }
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| IngestionError::FilterConfiguration {
                message: format!(
                    "'{s}' is not allowed, the only allowed operations are '{}'",
                    Operation::ALL.map(Operation::as_str).join("', '")
                ),
            })
    }
}

/// A single `column <operation> values` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operation: Operation,
    /// A scalar, or a [`Value::List`] for `in`/`notin`.
    pub values: Value,
}

impl Predicate {
    pub fn new(column: impl Into<String>, operation: Operation, values: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operation,
            values: values.into(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.operation, self.values)
    }
}

/// Returns a new [`DataSet`] with only the rows satisfying every predicate.
///
/// All predicates are validated before any row is evaluated; the first invalid one (unknown
/// column, wrong value shape, type-incompatible comparison) is reported as
/// [`IngestionError::FilterConfiguration`]. Row order is preserved.
///
/// ```rust
/// use tabular_harvest::processing::{filter, Operation, Predicate};
/// use tabular_harvest::types::{DataSet, DataType, Field, Schema, Value};
///
/// let ds = DataSet::new(
///     Schema::new(vec![Field::new("amount", DataType::Int64)]),
///     vec![vec![Value::Int64(50)], vec![Value::Int64(150)]],
/// );
/// let out = filter(&ds, &[Predicate::new("amount", Operation::Gt, 100)]).unwrap();
/// assert_eq!(out.rows, vec![vec![Value::Int64(150)]]);
/// ```
pub fn filter(dataset: &DataSet, predicates: &[Predicate]) -> IngestionResult<DataSet> {
    let compiled = predicates
        .iter()
        .enumerate()
        .map(|(i, p)| compile(dataset, i, p))
        .collect::<IngestionResult<Vec<_>>>()?;

    Ok(dataset.filter_rows(|row| {
        compiled
            .iter()
            .all(|(idx, test, values)| test(&row[*idx], values))
    }))
}

type CompiledPredicate<'a> = (usize, fn(&Value, &Value) -> bool, &'a Value);

fn compile<'a>(dataset: &DataSet, position: usize, p: &'a Predicate) -> IngestionResult<CompiledPredicate<'a>> {
    let fail = |reason: String| IngestionError::FilterConfiguration {
        message: format!("predicate #{} ({p}): {reason}", position + 1),
    };

    let idx = dataset.schema.index_of(&p.column).ok_or_else(|| {
        fail(format!(
            "column '{}' does not exist. columns={:?}",
            p.column,
            dataset.schema.field_names().collect::<Vec<_>>()
        ))
    })?;
    let column_type = dataset.schema.fields[idx].data_type;
    validate(p.operation, column_type, &p.values).map_err(fail)?;

    Ok((idx, p.operation.handler(), &p.values))
}

fn validate(op: Operation, column_type: DataType, values: &Value) -> Result<(), String> {
    let is_list = matches!(values, Value::List(_));
    if op.takes_list() {
        if !is_list {
            return Err(format!("'{op}' requires a list of values"));
        }
        return Ok(());
    }
    if is_list {
        return Err("for list values, use 'in' or 'notin' operation".to_string());
    }

    if op.is_ordering() {
        if values.is_null() {
            return Err(format!("'{op}' cannot compare against null"));
        }
        let value_type = values.data_type();
        let comparable = column_type == DataType::Null
            || (column_type.is_numeric() && value_type.is_numeric())
            || (column_type == value_type && matches!(column_type, DataType::Utf8 | DataType::Bool));
        if !comparable {
            return Err(format!("cannot order {column_type} column against {value_type} value"));
        }
    }

    if op == Operation::Contains {
        match column_type {
            DataType::Utf8 if !matches!(values, Value::Utf8(_)) => {
                return Err(format!("'contains' on a utf8 column needs a text value, got {}", values.data_type()));
            }
            DataType::Utf8 | DataType::List | DataType::Null => {}
            other => return Err(format!("'contains' is not supported on {other} columns")),
        }
    }

    Ok(())
}

/// Null-safe equality; `Int64` and `Float64` compare numerically.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int64(x), Value::Int64(y)) => x == y,
        (Value::Int64(_) | Value::Float64(_), Value::Int64(_) | Value::Float64(_)) => a.as_f64() == b.as_f64(),
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int64(x), Value::Int64(y)) => Some(x.cmp(y)),
        (Value::Int64(_) | Value::Float64(_), Value::Int64(_) | Value::Float64(_)) => {
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::Utf8(x), Value::Utf8(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn is_member(cell: &Value, values: &Value) -> bool {
    match values {
        Value::List(items) => items.iter().any(|v| values_equal(cell, v)),
        _ => false,
    }
}

fn contains(cell: &Value, needle: &Value) -> bool {
    match (cell, needle) {
        (Value::Utf8(s), Value::Utf8(n)) => s.contains(n.as_str()),
        (Value::List(items), v) => items.iter().any(|item| values_equal(item, v)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{filter, Operation, Predicate};
    use crate::types::{DataSet, DataType, Field, Schema, Value};
    use crate::IngestionError;

    fn sample_dataset() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("amount", DataType::Float64),
            Field::new("name", DataType::Utf8),
            Field::new("tags", DataType::List),
        ]);

        let rows = vec![
            vec![
                Value::Int64(1),
                Value::Float64(50.0),
                Value::Utf8("alpha".to_string()),
                Value::from(vec!["x", "y"]),
            ],
            vec![Value::Int64(2), Value::Float64(150.0), Value::Null, Value::from(vec!["y"])],
            vec![
                Value::Int64(3),
                Value::Null,
                Value::Utf8("gamma".to_string()),
                Value::Null,
            ],
        ];

        DataSet::new(schema, rows)
    }

    fn ids(ds: &DataSet) -> Vec<i64> {
        ds.rows
            .iter()
            .map(|r| match r[0] {
                Value::Int64(v) => v,
                _ => -1,
            })
            .collect()
    }

    fn run(predicates: &[Predicate]) -> DataSet {
        filter(&sample_dataset(), predicates).unwrap()
    }

    fn config_error(predicates: &[Predicate]) -> String {
        match filter(&sample_dataset(), predicates).unwrap_err() {
            IngestionError::FilterConfiguration { message } => message,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn operation_parses_configuration_spellings() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert_eq!("not_in".parse::<Operation>().unwrap(), Operation::NotIn);
        let err = "~=".parse::<Operation>().unwrap_err();
        assert!(err.to_string().contains("'~=' is not allowed"));
    }

    #[test]
    fn ordering_compares_int_values_against_float_column() {
        assert_eq!(ids(&run(&[Predicate::new("amount", Operation::Gt, 100)])), vec![2]);
        assert_eq!(ids(&run(&[Predicate::new("amount", Operation::Le, 50.0)])), vec![1]);
        assert_eq!(ids(&run(&[Predicate::new("id", Operation::Ge, 2)])), vec![2, 3]);
        assert_eq!(ids(&run(&[Predicate::new("name", Operation::Lt, "beta")])), vec![1]);
    }

    #[test]
    fn equality_is_null_safe() {
        assert_eq!(ids(&run(&[Predicate::new("name", Operation::Eq, Value::Null)])), vec![2]);
        assert_eq!(ids(&run(&[Predicate::new("name", Operation::Ne, "alpha")])), vec![2, 3]);
        assert_eq!(ids(&run(&[Predicate::new("amount", Operation::Eq, 150)])), vec![2]);
    }

    #[test]
    fn membership_and_contains() {
        assert_eq!(ids(&run(&[Predicate::new("id", Operation::In, vec![1, 3])])), vec![1, 3]);
        assert_eq!(ids(&run(&[Predicate::new("id", Operation::NotIn, vec![1, 3])])), vec![2]);
        assert_eq!(ids(&run(&[Predicate::new("name", Operation::Contains, "amm")])), vec![3]);
        assert_eq!(ids(&run(&[Predicate::new("tags", Operation::Contains, "y")])), vec![1, 2]);
    }

    #[test]
    fn predicates_compose_with_and() {
        let out = run(&[
            Predicate::new("tags", Operation::Contains, "y"),
            Predicate::new("amount", Operation::Lt, 100),
        ]);
        assert_eq!(ids(&out), vec![1]);
        assert_eq!(out.schema, sample_dataset().schema);
    }

    #[test]
    fn no_predicates_keeps_everything() {
        assert_eq!(ids(&run(&[])), vec![1, 2, 3]);
    }

    #[test]
    fn invalid_predicates_are_configuration_errors() {
        let msg = config_error(&[Predicate::new("missing", Operation::Eq, 1)]);
        assert!(msg.contains("predicate #1 (missing == 1)"));
        assert!(msg.contains("column 'missing' does not exist"));

        let msg = config_error(&[Predicate::new("id", Operation::Eq, 1), Predicate::new("name", Operation::Gt, 5)]);
        assert!(msg.contains("predicate #2"));
        assert!(msg.contains("cannot order utf8 column against int64 value"));

        assert!(config_error(&[Predicate::new("id", Operation::In, 1)]).contains("requires a list"));
        assert!(config_error(&[Predicate::new("id", Operation::Eq, vec![1])]).contains("use 'in' or 'notin'"));
        assert!(config_error(&[Predicate::new("id", Operation::Contains, 1)]).contains("not supported on int64"));
        assert!(config_error(&[Predicate::new("name", Operation::Contains, 1)]).contains("needs a text value"));
    }
}
