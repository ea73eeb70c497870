mod dialect;
mod store;

pub use dialect::{Dialect, SubstitutionRule};
pub use store::{parse_dialect_json, DialectStore, BUILTIN_DIALECT_IDS};
