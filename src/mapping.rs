use anyhow::Result;

/// One declarative instruction: load this worksheet of this staged file into
/// that destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord {
    /// Stage-qualified path, e.g. `@INTEGRATIONS.RAW_STAGE/intro/location.xlsx`.
    /// Treated as an opaque string apart from basename derivation.
    pub source_path: String,
    pub worksheet_name: String,
    pub target_table: String,
}

impl MappingRecord {
    pub fn new(source_path: &str, worksheet_name: &str, target_table: &str) -> Self {
        Self {
            source_path: source_path.to_string(),
            worksheet_name: worksheet_name.to_string(),
            target_table: target_table.to_string(),
        }
    }
}

/// Resolves the full mapping sequence for one run. Ordering is whatever the
/// underlying source returns; callers must not assume stability across calls.
pub trait MappingResolver {
    fn resolve(&mut self) -> Result<Vec<MappingRecord>>;
}

/// The built-in mapping set, kept as a literal table rather than external
/// configuration.
static MAPPINGS: &[(&str, &str, &str)] = &[
    (
        "@INTEGRATIONS.FROSTBYTE_RAW_STAGE/intro/order_detail.xlsx",
        "order_detail",
        "ORDER_DETAIL",
    ),
    (
        "@INTEGRATIONS.FROSTBYTE_RAW_STAGE/intro/location.xlsx",
        "location",
        "LOCATION",
    ),
];

/// Resolver over the built-in mapping table.
pub struct StaticMappings;

impl MappingResolver for StaticMappings {
    fn resolve(&mut self) -> Result<Vec<MappingRecord>> {
        Ok(MAPPINGS
            .iter()
            .map(|(path, sheet, table)| MappingRecord::new(path, sheet, table))
            .collect())
    }
}
