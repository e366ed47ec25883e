//! Key composition for the single-table layout.
//!
//! Every key keeps one named slot per attribute. The physical form labels each slot with its
//! attribute name and escapes separator characters inside values:
//!
//! - Partition: `$<entity>#<attr>_<value>[#<attr>_<value>...]`
//! - Sort: `$<entity>[#<attr>_<value>...]`
//! - `all` index partition: `ALL_<ENTITY>`

use crate::error::{DataError, Result};
use crate::schema::{IndexDef, IndexKind, Schema};
use crate::storage::{PrimaryKey, SortCondition};
use crate::value::{Record, Value};

pub const ENTITY_PREFIX: char = '$';
pub const SLOT_SEPARATOR: char = '#';

/// A composed key with named slots and their physical string form.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedKey {
    pub index: String,
    pub partition: Vec<(String, Value)>,
    pub sort: Vec<(String, Value)>,
    pub pk_field: String,
    pub sk_field: String,
    pub pk_value: String,
    pub sk_value: String,
}

impl ComposedKey {
    pub fn to_primary_key(&self) -> PrimaryKey {
        PrimaryKey::new(self.pk_value.clone(), self.sk_value.clone())
    }
}

/// Range over the first sort attribute not fixed by the query keys.
#[derive(Debug, Clone, PartialEq)]
pub struct SortRange {
    pub attribute: String,
    pub start: Value,
    pub end: Value,
}

/// Partition value and sort condition for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryKey {
    pub pk_value: String,
    pub sort: Option<SortCondition>,
}

/// Renders a value for a key slot. `%` and `#` are percent-escaped.
pub fn encode_slot_value(value: &Value) -> String {
    let raw = match value {
        Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        other => other.to_string(),
    };
    raw.replace('%', "%25").replace(SLOT_SEPARATOR, "%23")
}

fn entity_prefix(schema: &Schema) -> String {
    format!("{ENTITY_PREFIX}{}", schema.model_name())
}

fn render_slots(prefix: String, slots: &[(String, Value)]) -> String {
    slots.iter().fold(prefix, |mut out, (name, value)| {
        out.push(SLOT_SEPARATOR);
        out.push_str(name);
        out.push('_');
        out.push_str(&encode_slot_value(value));
        out
    })
}

fn partition_value(schema: &Schema, index: &IndexDef, slots: &[(String, Value)]) -> String {
    match &index.partition_template {
        Some(template) => template.clone(),
        None => render_slots(entity_prefix(schema), slots),
    }
}

fn sort_value(schema: &Schema, slots: &[(String, Value)]) -> String {
    render_slots(entity_prefix(schema), slots)
}

fn collect_slots(
    schema: &Schema,
    index: &IndexDef,
    names: &[String],
    attributes: &Record,
) -> Result<Vec<(String, Value)>> {
    names
        .iter()
        .map(|name| match attributes.get(name) {
            Some(value) if !value.is_null() => Ok((name.clone(), value.clone())),
            _ => Err(DataError::MissingKeyAttribute {
                entity: schema.entity_name().to_string(),
                index: index.id.clone(),
                attribute: name.clone(),
            }),
        })
        .collect()
}

fn resolve_index<'a>(schema: &'a Schema, index_id: Option<&str>) -> Result<&'a IndexDef> {
    match index_id {
        None => Ok(schema.primary_index()),
        Some(id) => schema.index(id).ok_or_else(|| {
            DataError::invalid_input(schema.entity_name(), format!("unknown index {id}"))
        }),
    }
}

/// Composes the full key of an index (primary when `index_id` is `None`).
pub fn compose_key(
    schema: &Schema,
    attributes: &Record,
    index_id: Option<&str>,
) -> Result<ComposedKey> {
    let index = resolve_index(schema, index_id)?;
    let partition = collect_slots(schema, index, &index.partition, attributes)?;
    let sort = collect_slots(schema, index, &index.sort, attributes)?;

    Ok(ComposedKey {
        index: index.id.clone(),
        pk_field: index.pk_field.clone(),
        sk_field: index.sk_field.clone(),
        pk_value: partition_value(schema, index, &partition),
        sk_value: sort_value(schema, &sort),
        partition,
        sort,
    })
}

/// Physical key fields for every index the record participates in.
///
/// Sparse indexes are skipped when the record lacks one of their attributes.
pub fn index_fields(schema: &Schema, record: &Record) -> Result<Vec<(String, String)>> {
    let primary = compose_key(schema, record, None)?;
    let mut fields = vec![
        (primary.pk_field, primary.pk_value),
        (primary.sk_field, primary.sk_value),
    ];

    for index in schema.secondary_indexes() {
        match compose_key(schema, record, Some(&index.id)) {
            Ok(key) => {
                fields.push((key.pk_field, key.pk_value));
                fields.push((key.sk_field, key.sk_value));
            }
            Err(DataError::MissingKeyAttribute { .. }) if index.sparse => {}
            Err(err) => return Err(err),
        }
    }

    Ok(fields)
}

/// Composes a query against `index` from the provided key attributes.
///
/// Partition attributes must all be present. Leading sort attributes narrow the query: all of
/// them give an exact match, some of them a prefix match. `range` applies to the next sort
/// attribute after the provided prefix.
pub fn compose_query(
    schema: &Schema,
    index: &IndexDef,
    keys: &Record,
    range: Option<&SortRange>,
) -> Result<QueryKey> {
    let partition = collect_slots(schema, index, &index.partition, keys)?;
    let pk_value = partition_value(schema, index, &partition);

    let prefix: Vec<(String, Value)> = index
        .sort
        .iter()
        .map_while(|name| {
            keys.get(name)
                .filter(|v| !v.is_null())
                .map(|v| (name.clone(), v.clone()))
        })
        .collect();

    if let Some(range) = range {
        let expected = index.sort.get(prefix.len());
        if expected != Some(&range.attribute) {
            return Err(DataError::invalid_input(
                schema.entity_name(),
                format!(
                    "range attribute {} is not the next sort key of index {}",
                    range.attribute, index.id
                ),
            ));
        }
        let bound = |value: &Value| {
            let mut slots = prefix.clone();
            slots.push((range.attribute.clone(), value.clone()));
            sort_value(schema, &slots)
        };
        return Ok(QueryKey {
            pk_value,
            sort: Some(SortCondition::Between(bound(&range.start), bound(&range.end))),
        });
    }

    let sort = if prefix.is_empty() {
        None
    } else if prefix.len() == index.sort.len() {
        Some(SortCondition::Eq(sort_value(schema, &prefix)))
    } else {
        let mut value = sort_value(schema, &prefix);
        value.push(SLOT_SEPARATOR);
        Some(SortCondition::BeginsWith(value))
    };

    Ok(QueryKey { pk_value, sort })
}

/// Chooses the index that serves a lookup by `keys`.
///
/// Primary first, then the secondary index whose partition attributes are all present with the
/// longest matching sort prefix, then the `all` index.
pub fn find_index_for_keys<'a>(schema: &'a Schema, keys: &Record) -> Result<&'a IndexDef> {
    let present = |name: &String| keys.get(name).is_some_and(|v| !v.is_null());
    let all_index = || {
        schema
            .secondary_indexes()
            .iter()
            .find(|index| index.kind == IndexKind::All)
    };

    if keys.is_empty() {
        return all_index().ok_or_else(|| {
            DataError::invalid_input(schema.entity_name(), "keys are required")
        });
    }

    let primary = schema.primary_index();
    if primary.partition.iter().all(present) {
        return Ok(primary);
    }

    let mut best: Option<(&IndexDef, usize)> = None;
    for index in schema.secondary_indexes() {
        if index.kind == IndexKind::All || !index.partition.iter().all(present) {
            continue;
        }
        let depth = index.sort.iter().take_while(|&name| present(name)).count();
        if best.is_none_or(|(_, best_depth)| depth > best_depth) {
            best = Some((index, depth));
        }
    }

    best.map(|(index, _)| index)
        .or_else(all_index)
        .ok_or_else(|| {
            let names: Vec<&str> = keys.keys().map(String::as_str).collect();
            DataError::invalid_input(
                schema.entity_name(),
                format!("no index serves keys [{}]", names.join(", ")),
            )
        })
}
