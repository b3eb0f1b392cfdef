//! SQLite type rules.
//!
//! SQLite derives a column's affinity from its declared type name:
//! 1. Contains "INT" -> INTEGER affinity
//! 2. Contains "CHAR", "CLOB", or "TEXT" -> TEXT affinity
//! 3. Contains "BLOB" -> BLOB affinity
//! 4. Contains "REAL", "FLOA", or "DOUB" -> REAL affinity
//! 5. Otherwise -> NUMERIC affinity
//!
//! Rules 1-4 are registered ahead of the generic rules, so `VARCHAR(255)`
//! and `UNSIGNED BIG INT` resolve the way SQLite stores them. Names that
//! fall through to rule 5 (`DATETIME`, `BOOLEAN`, `NUMERIC`) keep their
//! generic meaning. Untyped columns are deliberately unknown.

use crate::models::CanonicalType;
use crate::type_mapping::{TypeMapperBuilder, TypePattern};
use crate::Result;

const AFFINITY_RULES: &[(&str, CanonicalType)] = &[
    (".*int.*", CanonicalType::Number),
    (".*(char|clob|text).*", CanonicalType::String),
    (".*blob.*", CanonicalType::Bytes),
    (".*(real|floa|doub).*", CanonicalType::Number),
];

/// Registers SQLite affinity rules on `builder`.
///
/// # Example
/// ```rust
/// use lakescout_core::adapters::sqlite::register_sqlite_types;
/// use lakescout_core::models::CanonicalType;
/// use lakescout_core::type_mapping::TypeMapperBuilder;
///
/// let mapper = register_sqlite_types(TypeMapperBuilder::new()).unwrap().build();
/// assert_eq!(mapper.map_type("VARCHAR(255)"), CanonicalType::String);
/// ```
pub fn register_sqlite_types(builder: TypeMapperBuilder) -> Result<TypeMapperBuilder> {
    let mut builder = builder;
    for (pattern, canonical) in AFFINITY_RULES {
        builder = builder.register(TypePattern::regex(pattern)?, *canonical);
    }
    Ok(builder.register_known_unknown(TypePattern::exact("")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_mapping::{TypeMapper, TypeResolution};

    fn mapper() -> TypeMapper {
        register_sqlite_types(TypeMapperBuilder::new())
            .unwrap()
            .build()
    }

    #[test]
    fn test_affinity_rules() {
        let mapper = mapper();
        assert_eq!(mapper.map_type("INTEGER"), CanonicalType::Number);
        assert_eq!(mapper.map_type("UNSIGNED BIG INT"), CanonicalType::Number);
        assert_eq!(mapper.map_type("NVARCHAR(100)"), CanonicalType::String);
        assert_eq!(mapper.map_type("CLOB"), CanonicalType::String);
        assert_eq!(mapper.map_type("BLOB"), CanonicalType::Bytes);
        assert_eq!(mapper.map_type("DOUBLE PRECISION"), CanonicalType::Number);
        assert_eq!(mapper.map_type("FLOAT"), CanonicalType::Number);
    }

    #[test]
    fn test_numeric_affinity_names_keep_generic_meaning() {
        let mapper = mapper();
        assert_eq!(mapper.map_type("DATETIME"), CanonicalType::Time);
        assert_eq!(mapper.map_type("DATE"), CanonicalType::Date);
        assert_eq!(mapper.map_type("BOOLEAN"), CanonicalType::Boolean);
        assert_eq!(mapper.map_type("DECIMAL(10,5)"), CanonicalType::Number);
    }

    #[test]
    fn test_untyped_column_is_known_unknown() {
        let mapper = mapper();
        assert_eq!(mapper.resolve(""), TypeResolution::KnownUnknown);
        assert_eq!(mapper.resolve("GEOMETRY"), TypeResolution::Unmapped);
    }
}
