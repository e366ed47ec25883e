//! Post-fetch in-memory sorting.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::value::{Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn is_ascending(self) -> bool {
        self == SortOrder::Asc
    }
}

/// Locale-style string ordering: case-insensitive first, lowercase before uppercase on ties.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    if folded != Ordering::Equal {
        return folded;
    }

    for (x, y) in a.chars().zip(b.chars()) {
        match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) if y.is_uppercase() => return Ordering::Less,
            (false, true) if x.is_uppercase() => return Ordering::Greater,
            _ => {}
        }
    }
    a.cmp(b)
}

/// Compares two attribute values. Absent and null values sort last in either direction.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>, order: SortOrder) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    let ordering = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(x), Some(y)) => compare_present(x, y),
    };

    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Rank of a value kind when kinds differ: booleans, numbers, strings, sets, lists, maps.
fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::StringSet(_) => 4,
        Value::List(_) => 5,
        Value::Map(_) => 6,
    }
}

/// Total order over non-null values.
fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::String(x), Value::String(y)) => locale_compare(x, y),
        (Value::StringSet(x), Value::StringSet(y)) => x.cmp(y),
        (Value::List(x), Value::List(y)) => x
            .iter()
            .zip(y)
            .map(|(p, q)| compare_present_or_null(p, q))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Map(x), Value::Map(y)) => x
            .iter()
            .zip(y)
            .map(|((pk, pv), (qk, qv))| pk.cmp(qk).then_with(|| compare_present_or_null(pv, qv)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn compare_present_or_null(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_present(a, b),
    }
}

/// Stable sort of `items` by one attribute of their record.
pub fn sort_by_attribute<T, F>(items: &mut [T], attribute: &str, order: SortOrder, record_of: F)
where
    F: Fn(&T) -> &Record,
{
    items.sort_by(|a, b| {
        compare_values(
            record_of(a).get(attribute),
            record_of(b).get(attribute),
            order,
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::record_from_json;
    use serde_json::json;

    fn records() -> Vec<Record> {
        vec![
            record_from_json(json!({"id": 1, "url": "b.com", "rank": 2})),
            record_from_json(json!({"id": 2, "rank": 1})),
            record_from_json(json!({"id": 3, "url": "A.com", "rank": 2})),
            record_from_json(json!({"id": 4, "url": "c.com"})),
        ]
    }

    fn ids(records: &[Record]) -> Vec<f64> {
        records
            .iter()
            .map(|r| r.get("id").and_then(Value::as_f64).unwrap())
            .collect()
    }

    #[test]
    fn test_sort_order_serde() {
        assert_eq!(serde_json::to_string(&SortOrder::Desc).unwrap(), "\"desc\"");
        let parsed: SortOrder = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(parsed, SortOrder::Asc);
    }

    #[test]
    fn test_locale_compare_is_case_insensitive_first() {
        assert_eq!(locale_compare("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_compare("a", "A"), Ordering::Less);
        assert_eq!(locale_compare("B", "a"), Ordering::Greater);
        assert_eq!(locale_compare("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_strings_ascending_nulls_last() {
        let mut items = records();
        sort_by_attribute(&mut items, "url", SortOrder::Asc, |r| r);
        assert_eq!(ids(&items), vec![3.0, 1.0, 4.0, 2.0]);
    }

    #[test]
    fn test_strings_descending_nulls_still_last() {
        let mut items = records();
        sort_by_attribute(&mut items, "url", SortOrder::Desc, |r| r);
        assert_eq!(ids(&items), vec![4.0, 1.0, 3.0, 2.0]);
    }

    #[test]
    fn test_mixed_kinds_sort_by_kind_then_value() {
        let mut items: Vec<Record> = [
            json!(9),
            json!("s53"),
            json!(true),
            json!(6),
            json!("S2"),
            json!(false),
            json!(null),
            json!(57),
            json!(["x"]),
            json!({"k": 1}),
        ]
        .into_iter()
        .map(|value| record_from_json(json!({"item": value})))
        .collect();

        sort_by_attribute(&mut items, "item", SortOrder::Asc, |r| r);

        let sorted: Vec<serde_json::Value> = items
            .iter()
            .map(|r| r.get("item").map(Value::to_json).unwrap_or_default())
            .collect();
        assert_eq!(
            sorted,
            vec![
                json!(false),
                json!(true),
                json!(6),
                json!(9),
                json!(57),
                json!("S2"),
                json!("s53"),
                json!(["x"]),
                json!({"k": 1}),
                json!(null),
            ]
        );
    }

    #[test]
    fn test_mixed_kinds_descending_reverses_kinds_but_keeps_nulls_last() {
        let mut items: Vec<Record> = [json!(1), json!(null), json!("a"), json!(true)]
            .into_iter()
            .map(|value| record_from_json(json!({"item": value})))
            .collect();

        sort_by_attribute(&mut items, "item", SortOrder::Desc, |r| r);

        let sorted: Vec<serde_json::Value> = items
            .iter()
            .map(|r| r.get("item").map(Value::to_json).unwrap_or_default())
            .collect();
        assert_eq!(sorted, vec![json!("a"), json!(1), json!(true), json!(null)]);
    }

    #[test]
    fn test_numbers_sort_naturally_and_stably() {
        let mut items = records();
        sort_by_attribute(&mut items, "rank", SortOrder::Asc, |r| r);
        // Equal ranks keep their input order.
        assert_eq!(ids(&items), vec![2.0, 1.0, 3.0, 4.0]);
    }
}
