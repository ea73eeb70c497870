use std::collections::BTreeMap;

use hl_core::{DialectSpec, HerlangError};

use crate::Dialect;

pub const BUILTIN_DIALECT_IDS: [&str; 4] = ["chinese", "english", "python", "rust"];

const BUILTIN_DIALECT_SOURCES: [(&str, &str); 4] = [
    ("chinese.json", include_str!("../dialects/chinese.json")),
    ("english.json", include_str!("../dialects/english.json")),
    ("python.json", include_str!("../dialects/python.json")),
    ("rust.json", include_str!("../dialects/rust.json")),
];

pub fn parse_dialect_json(source_name: &str, json: &str) -> Result<DialectSpec, HerlangError> {
    serde_json::from_str(json).map_err(|error| {
        HerlangError::new(
            "DIALECT_PARSE",
            format!("Failed to parse dialect {}: {}", source_name, error),
        )
    })
}

/// Immutable registry of dialects, resolved by id or alias.
#[derive(Debug, Clone)]
pub struct DialectStore {
    dialects: Vec<Dialect>,
    index_by_name: BTreeMap<String, usize>,
}

impl DialectStore {
    pub fn from_specs(specs: Vec<DialectSpec>) -> Result<Self, HerlangError> {
        let mut dialects = Vec::with_capacity(specs.len());
        let mut index_by_name = BTreeMap::new();

        for spec in specs {
            let dialect = Dialect::from_spec(spec)?;
            let index = dialects.len();
            let names = std::iter::once(dialect.id()).chain(dialect.aliases().iter().map(String::as_str));
            for name in names {
                if index_by_name.insert(name.to_string(), index).is_some() {
                    return Err(HerlangError::new(
                        "DIALECT_DUPLICATE",
                        format!("Dialect name \"{}\" is registered more than once.", name),
                    ));
                }
            }
            tracing::debug!(
                dialect = dialect.id(),
                rules = dialect.rules().len(),
                "registered dialect"
            );
            dialects.push(dialect);
        }

        Ok(Self {
            dialects,
            index_by_name,
        })
    }

    pub fn builtin() -> Result<Self, HerlangError> {
        Self::builtin_with(Vec::new())
    }

    /// Built-in dialects followed by `extra` definitions.
    pub fn builtin_with(extra: Vec<DialectSpec>) -> Result<Self, HerlangError> {
        let mut specs = BUILTIN_DIALECT_SOURCES
            .iter()
            .map(|(name, json)| parse_dialect_json(name, json))
            .collect::<Result<Vec<_>, _>>()?;
        specs.extend(extra);
        Self::from_specs(specs)
    }

    pub fn get(&self, name: &str) -> Result<&Dialect, HerlangError> {
        self.index_by_name
            .get(name)
            .map(|index| &self.dialects[*index])
            .ok_or_else(|| HerlangError::unknown_dialect(name))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.dialects.iter().map(Dialect::id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dialect> {
        self.dialects.iter()
    }
}
