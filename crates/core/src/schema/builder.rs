//! Fluent schema declaration.

use std::collections::{HashMap, HashSet};

use super::naming;
use super::{
    Accessor, IndexDef, IndexKind, Reference, ReferenceKind, Schema, SchemaError, ALL_INDEX,
    CREATED_AT, PRIMARY_INDEX, TABLE_PK, TABLE_SK, UPDATED_AT,
};
use crate::attribute::{is_iso_date, is_uuid, new_uuid, now_timestamp, AttributeSpec};
use crate::value::Value;

#[derive(Debug, Clone)]
struct PendingIndex {
    id: String,
    kind: IndexKind,
    partition: Vec<String>,
    sort: Vec<String>,
    sparse: bool,
}

/// Builds a [`Schema`]. Misconfiguration is collected and reported by [`SchemaBuilder::build`].
///
/// Every schema starts with three generated attributes: `<entity>Id` (UUID, defaulted),
/// `createdAt` and `updatedAt`.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    entity_name: String,
    id_name: String,
    attributes: Vec<(String, AttributeSpec)>,
    primary_partition: Option<Vec<String>>,
    primary_sort: Vec<String>,
    indexes: Vec<PendingIndex>,
    references: Vec<Reference>,
    errors: Vec<SchemaError>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn timestamp_spec() -> AttributeSpec {
    AttributeSpec::string()
        .required()
        .read_only()
        .default_with(|| Value::String(now_timestamp()))
        .validate(is_iso_date)
}

impl SchemaBuilder {
    pub fn new(entity_name: &str) -> Self {
        let id_name = naming::foreign_key_for(entity_name);
        let builder = Self {
            entity_name: entity_name.to_string(),
            id_name: id_name.clone(),
            attributes: Vec::new(),
            primary_partition: None,
            primary_sort: Vec::new(),
            indexes: Vec::new(),
            references: Vec::new(),
            errors: Vec::new(),
        };

        builder
            .add_attribute(
                &id_name,
                AttributeSpec::string()
                    .required()
                    .read_only()
                    .default_with(new_uuid)
                    .validate(is_uuid),
            )
            .add_attribute(CREATED_AT, timestamp_spec())
            .add_attribute(UPDATED_AT, timestamp_spec())
    }

    pub fn with_primary_partition_keys(mut self, names: &[&str]) -> Self {
        self.primary_partition = Some(owned(names));
        self
    }

    pub fn with_primary_sort_keys(mut self, names: &[&str]) -> Self {
        self.primary_sort = owned(names);
        self
    }

    pub fn add_attribute(mut self, name: &str, spec: AttributeSpec) -> Self {
        if self.attributes.iter().any(|(existing, _)| existing == name) {
            self.errors.push(SchemaError::DuplicateAttribute {
                entity: self.entity_name.clone(),
                attribute: name.to_string(),
            });
        } else {
            self.attributes.push((name.to_string(), spec));
        }
        self
    }

    /// Required reference sorted by `updatedAt`.
    pub fn add_reference(self, kind: ReferenceKind, target: &str) -> Self {
        self.add_reference_with(kind, target, &[UPDATED_AT], true)
    }

    /// `belongs_to` adds the `<target>Id` attribute and a `by<Target>Id` index.
    pub fn add_reference_with(
        mut self,
        kind: ReferenceKind,
        target: &str,
        sort_keys: &[&str],
        required: bool,
    ) -> Self {
        if target.is_empty() || !target.chars().all(|c| c.is_ascii_alphanumeric()) {
            self.errors.push(SchemaError::InvalidReference {
                entity: self.entity_name.clone(),
                target: target.to_string(),
            });
            return self;
        }

        self.references.push(Reference {
            kind,
            target: target.to_string(),
            sort_keys: owned(sort_keys),
            required,
        });

        if kind != ReferenceKind::BelongsTo {
            return self;
        }

        let foreign_key = naming::foreign_key_for(target);
        let mut spec = AttributeSpec::string().validate(is_uuid);
        if required {
            spec = spec.required();
        }
        self.indexes.push(PendingIndex {
            id: naming::index_id_for(std::slice::from_ref(&foreign_key)),
            kind: IndexKind::BelongsTo,
            partition: vec![foreign_key.clone()],
            sort: owned(sort_keys),
            sparse: !required,
        });
        self.add_attribute(&foreign_key, spec)
    }

    /// Listing index over every item of the entity, sorted by `sort_names`.
    pub fn add_all_index(mut self, sort_names: &[&str]) -> Self {
        self.indexes.push(PendingIndex {
            id: ALL_INDEX.to_string(),
            kind: IndexKind::All,
            partition: Vec::new(),
            sort: owned(sort_names),
            sparse: false,
        });
        self
    }

    /// Secondary index named after its partition attributes.
    pub fn add_index(self, partition: &[&str], sort: &[&str]) -> Self {
        let id = naming::index_id_for(&owned(partition));
        self.add_named_index(&id, partition, sort)
    }

    pub fn add_named_index(mut self, id: &str, partition: &[&str], sort: &[&str]) -> Self {
        if id == PRIMARY_INDEX || id == ALL_INDEX {
            self.errors.push(SchemaError::ReservedIndexName {
                entity: self.entity_name.clone(),
                index: id.to_string(),
            });
            return self;
        }
        self.indexes.push(PendingIndex {
            id: id.to_string(),
            kind: IndexKind::Other,
            partition: owned(partition),
            sort: owned(sort),
            sparse: false,
        });
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let entity = self.entity_name;
        let valid_name = entity
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && entity.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid_name {
            return Err(SchemaError::InvalidEntityName(entity));
        }
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }

        let mut attributes = self.attributes;
        let positions: HashMap<String, usize> = attributes
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();

        let partition = self
            .primary_partition
            .unwrap_or_else(|| vec![self.id_name.clone()]);
        if partition.is_empty() {
            return Err(SchemaError::EmptyPrimaryKey { entity });
        }
        let checker = KeyChecker {
            entity: &entity,
            attributes: &attributes,
            positions: &positions,
        };
        checker.check(PRIMARY_INDEX, partition.iter().chain(&self.primary_sort), false)?;

        let mut seen: HashSet<String> = HashSet::from([PRIMARY_INDEX.to_string()]);
        for index in &self.indexes {
            if !seen.insert(index.id.clone()) {
                return Err(SchemaError::DuplicateIndex {
                    entity: entity.clone(),
                    index: index.id.clone(),
                });
            }
            if index.kind != IndexKind::All && index.partition.is_empty() {
                return Err(SchemaError::EmptyIndexPartition {
                    entity: entity.clone(),
                    index: index.id.clone(),
                });
            }
            checker.check(
                &index.id,
                index.partition.iter().chain(&index.sort),
                index.sparse,
            )?;
        }

        for name in partition.iter().chain(&self.primary_sort) {
            attributes[positions[name]].1.read_only = true;
        }

        let mut pending = self.indexes;
        pending.sort_by(|a, b| {
            slot_rank(a.kind)
                .cmp(&slot_rank(b.kind))
                .then_with(|| a.id.cmp(&b.id))
        });
        let all_template = format!("ALL_{}", naming::upper_snake(&entity));
        let indexes = pending
            .into_iter()
            .enumerate()
            .map(|(i, index)| {
                let slot = i + 1;
                IndexDef {
                    partition_template: (index.kind == IndexKind::All)
                        .then(|| all_template.clone()),
                    id: index.id,
                    kind: index.kind,
                    partition: index.partition,
                    sort: index.sort,
                    physical_name: Some(format!("gsi{slot}")),
                    pk_field: format!("gsi{slot}pk"),
                    sk_field: format!("gsi{slot}sk"),
                    sparse: index.sparse,
                }
            })
            .collect();

        let primary = IndexDef {
            id: PRIMARY_INDEX.to_string(),
            kind: IndexKind::Primary,
            partition,
            partition_template: None,
            sort: self.primary_sort,
            physical_name: None,
            pk_field: TABLE_PK.to_string(),
            sk_field: TABLE_SK.to_string(),
            sparse: false,
        };

        let accessors = attributes
            .iter()
            .map(|(name, spec)| {
                let suffix = naming::capitalize(name);
                Accessor {
                    attribute: name.clone(),
                    getter: format!("get{suffix}"),
                    setter: (!spec.read_only).then(|| format!("set{suffix}")),
                }
            })
            .collect();

        Ok(Schema {
            entity_name: entity,
            id_name: self.id_name,
            attributes,
            positions,
            primary,
            indexes,
            references: self.references,
            accessors,
        })
    }
}

fn slot_rank(kind: IndexKind) -> u8 {
    match kind {
        IndexKind::Primary => 0,
        IndexKind::All => 1,
        IndexKind::BelongsTo => 2,
        IndexKind::Other => 3,
    }
}

struct KeyChecker<'a> {
    entity: &'a str,
    attributes: &'a [(String, AttributeSpec)],
    positions: &'a HashMap<String, usize>,
}

impl KeyChecker<'_> {
    fn check<'n>(
        &self,
        index: &str,
        names: impl Iterator<Item = &'n String>,
        sparse: bool,
    ) -> Result<(), SchemaError> {
        for name in names {
            let Some(&position) = self.positions.get(name) else {
                return Err(SchemaError::UnknownKeyAttribute {
                    entity: self.entity.to_string(),
                    index: index.to_string(),
                    attribute: name.clone(),
                });
            };
            if !sparse && !self.attributes[position].1.required {
                return Err(SchemaError::KeyAttributeNotRequired {
                    entity: self.entity.to_string(),
                    index: index.to_string(),
                    attribute: name.clone(),
                });
            }
        }
        Ok(())
    }
}
