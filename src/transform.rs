//! Numeric coercion of selected columns.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::source::{Dataset, Record, Value};

/// How many values per column were replaced with `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionReport {
    pub zeroed: BTreeMap<String, usize>,
}

impl CoercionReport {
    pub fn total_zeroed(&self) -> usize {
        self.zeroed.values().sum()
    }
}

/// Coerce a single value to a number. `None` means it could not be parsed.
pub fn to_numeric(value: &Value) -> Option<Value> {
    match value {
        Value::Int(i) => Some(Value::Int(*i)),
        Value::Float(f) if f.is_nan() => None,
        Value::Float(f) => Some(Value::Float(*f)),
        Value::Bool(b) => Some(Value::Int(i64::from(*b))),
        Value::Str(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Some(Value::Int(i))
            } else {
                match s.parse::<f64>() {
                    Ok(f) if !f.is_nan() => Some(Value::Float(f)),
                    _ => None,
                }
            }
        }
        Value::Null => None,
    }
}

/// Force `columns` of one record to numbers; nulls and unparseable values become `0`.
/// Returns the names of the columns that were zeroed.
pub fn coerce_record<'a>(record: &mut Record, columns: &'a [String]) -> Vec<&'a str> {
    let mut zeroed = Vec::new();
    for col in columns {
        let coerced = record.get(col).and_then(to_numeric);
        let value = coerced.unwrap_or_else(|| {
            zeroed.push(col.as_str());
            Value::Int(0)
        });
        record.set(col, value);
    }
    zeroed
}

/// Apply [`coerce_record`] to every record in place. Never fails.
pub fn coerce_numeric(dataset: &mut Dataset, columns: &[String]) -> CoercionReport {
    let mut report = CoercionReport::default();
    for col in columns {
        report.zeroed.insert(col.clone(), 0);
    }

    for record in dataset.iter_mut() {
        for col in coerce_record(record, columns) {
            if let Some(n) = report.zeroed.get_mut(col) {
                *n += 1;
            }
        }
    }

    for (col, n) in &report.zeroed {
        if *n > 0 {
            warn!(column = %col, count = n, "non-numeric values replaced with 0");
        } else {
            debug!(column = %col, "all values numeric");
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        vec!["visit_days".into(), "total_payment_may".into()]
    }

    fn record(visit: Value, payment: Value) -> Record {
        vec![
            ("uid", Value::from("u1")),
            ("visit_days", visit),
            ("total_payment_may", payment),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_string_digits_and_garbage() {
        let mut rec = record(Value::from("5"), Value::from("abc"));
        let cols = columns();
        let zeroed = coerce_record(&mut rec, &cols);
        assert_eq!(rec.get("visit_days"), Some(&Value::Int(5)));
        assert_eq!(rec.get("total_payment_may"), Some(&Value::Int(0)));
        assert_eq!(rec.get("uid"), Some(&Value::from("u1")));
        assert_eq!(zeroed, vec!["total_payment_may"]);
    }

    #[test]
    fn test_value_mapping() {
        assert_eq!(to_numeric(&Value::from(" 12 ")), Some(Value::Int(12)));
        assert_eq!(to_numeric(&Value::from("8500.5")), Some(Value::Float(8500.5)));
        assert_eq!(to_numeric(&Value::from("1e3")), Some(Value::Float(1000.0)));
        assert_eq!(to_numeric(&Value::Float(2.5)), Some(Value::Float(2.5)));
        assert_eq!(to_numeric(&Value::Float(f64::NAN)), None);
        assert_eq!(to_numeric(&Value::Bool(true)), Some(Value::Int(1)));
        assert_eq!(to_numeric(&Value::from("NaN")), None);
        assert_eq!(to_numeric(&Value::from("")), None);
        assert_eq!(to_numeric(&Value::Null), None);
    }

    #[test]
    fn test_absent_column_is_added_as_zero() {
        let mut rec: Record = vec![("uid", Value::from("u1"))].into_iter().collect();
        coerce_record(&mut rec, &columns());
        assert_eq!(rec.get("visit_days"), Some(&Value::Int(0)));
        assert_eq!(rec.get("total_payment_may"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_dataset_all_numeric_after_coercion() {
        let mut ds = Dataset {
            columns: vec!["uid".into(), "visit_days".into(), "total_payment_may".into()],
            records: vec![
                record(Value::from("5"), Value::from("abc")),
                record(Value::Null, Value::Float(10.5)),
                record(Value::Int(7), Value::from("  ")),
            ],
        };

        let report = coerce_numeric(&mut ds, &columns());

        for rec in ds.iter() {
            for col in columns() {
                let v = rec.get(&col).expect("column present");
                assert!(matches!(v, Value::Int(_) | Value::Float(_)), "{col} = {v:?}");
            }
        }
        assert_eq!(report.zeroed["visit_days"], 1);
        assert_eq!(report.zeroed["total_payment_may"], 2);
        assert_eq!(report.total_zeroed(), 3);
    }
}
