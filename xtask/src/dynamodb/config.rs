//! Table configuration types (Functional Core - pure data).

use tablekit_core::schema::{TABLE_PK, TABLE_SK};
use tablekit_core::Schema;

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: String,
    pub sort_key: String,
    pub gsis: Vec<GsiConfig>,
}

/// Global Secondary Index configuration. Keys are string attributes and every attribute is
/// projected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsiConfig {
    pub name: String,
    pub partition_key: String,
    pub sort_key: String,
}

impl GsiConfig {
    /// The `slot`-th generic index: `gsi<slot>` keyed by `gsi<slot>pk` / `gsi<slot>sk`.
    pub fn slot(slot: usize) -> Self {
        Self {
            name: format!("gsi{slot}"),
            partition_key: format!("gsi{slot}pk"),
            sort_key: format!("gsi{slot}sk"),
        }
    }
}

/// Table layout serving `schemas`: the shared `pk`/`sk` key plus as many generic GSIs as the
/// most indexed entity needs.
pub fn table_config(table_name: &str, schemas: &[Schema]) -> TableConfig {
    let slots = schemas.iter().map(Schema::gsi_count).max().unwrap_or(0);
    TableConfig {
        table_name: table_name.to_string(),
        partition_key: TABLE_PK.to_string(),
        sort_key: TABLE_SK.to_string(),
        gsis: (1..=slots).map(GsiConfig::slot).collect(),
    }
}
