//! Native column type to canonical type mapping.
//!
//! A [`TypeMapper`] holds an ordered rule list built once per run. Dialect
//! rules are registered first and are therefore checked before the generic
//! base rules; for the same pattern the first registration wins, so a
//! dialect can shadow a base mapping but never be shadowed by it.
//!
//! # Matching
//! - [`TypePattern::Exact`] compares against the base token: the leading
//!   word of the native type, lowercased (`DECIMAL(10,2)` -> `decimal`,
//!   `array<string>` -> `array`).
//! - [`TypePattern::Regex`] matches the whole native type, lowercased and
//!   trimmed.

use crate::error::CrawlError;
use crate::models::CanonicalType;
use regex::Regex;
use std::collections::HashSet;

/// Rule pattern over a native type.
#[derive(Debug, Clone)]
pub enum TypePattern {
    /// Compared against the lowercased base token
    Exact(String),
    /// Matched against the whole lowercased type
    Regex(Regex),
}

impl TypePattern {
    /// Exact pattern over the base token.
    pub fn exact(name: &str) -> Self {
        Self::Exact(name.trim().to_lowercase())
    }

    /// Compiles a regex anchored at both ends.
    pub fn regex(pattern: &str) -> crate::Result<Self> {
        Regex::new(&format!("^(?:{pattern})$"))
            .map(Self::Regex)
            .map_err(|e| {
                CrawlError::configuration(format!("Invalid type pattern '{}': {}", pattern, e))
            })
    }

    fn key(&self) -> String {
        match self {
            Self::Exact(name) => format!("exact:{name}"),
            Self::Regex(regex) => format!("regex:{}", regex.as_str()),
        }
    }

    fn matches(&self, base: &str, full: &str) -> bool {
        match self {
            Self::Exact(name) => name == base,
            Self::Regex(regex) => regex.is_match(full),
        }
    }
}

/// Outcome of resolving a native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeResolution {
    /// Matched a mapping rule
    Mapped(CanonicalType),
    /// Registered as deliberately unmapped; no warning
    KnownUnknown,
    /// No rule matched; callers record a warning
    Unmapped,
}

impl TypeResolution {
    /// Canonical type for the resolution; unknown unless mapped.
    pub fn canonical(self) -> CanonicalType {
        match self {
            Self::Mapped(canonical) => canonical,
            Self::KnownUnknown | Self::Unmapped => CanonicalType::Unknown,
        }
    }
}

/// Leading word of a native type, lowercased.
pub fn base_token(native: &str) -> String {
    native
        .trim()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase()
}

const BASE_RULES: &[(CanonicalType, &[&str])] = &[
    (
        CanonicalType::Number,
        &[
            "tinyint",
            "smallint",
            "mediumint",
            "int",
            "integer",
            "bigint",
            "int2",
            "int4",
            "int8",
            "serial",
            "bigserial",
            "smallserial",
            "decimal",
            "numeric",
            "number",
            "float",
            "float4",
            "float8",
            "real",
            "double",
            "money",
        ],
    ),
    (CanonicalType::Boolean, &["boolean", "bool"]),
    (CanonicalType::Enum, &["enum"]),
    (
        CanonicalType::Bytes,
        &[
            "binary",
            "varbinary",
            "blob",
            "tinyblob",
            "mediumblob",
            "longblob",
            "bytea",
            "bit",
            "varbit",
            "tsvector",
            "regclass",
            "image",
        ],
    ),
    (CanonicalType::Array, &["array"]),
    (
        CanonicalType::String,
        &[
            "char",
            "character",
            "varchar",
            "nchar",
            "nvarchar",
            "varchar2",
            "nvarchar2",
            "text",
            "tinytext",
            "mediumtext",
            "longtext",
            "ntext",
            "string",
            "clob",
            "nclob",
            "uuid",
            "inet",
            "cidr",
            "macaddr",
            "oid",
            "xml",
            "citext",
        ],
    ),
    (CanonicalType::Date, &["date"]),
    (
        CanonicalType::Time,
        &[
            "time",
            "timetz",
            "datetime",
            "datetime2",
            "timestamp",
            "timestamptz",
            "interval",
            "smalldatetime",
        ],
    ),
    (CanonicalType::Record, &["json", "jsonb", "struct", "map"]),
];

const BASE_KNOWN_UNKNOWN: &[&str] = &["null", "uniontype"];

/// Ordered rule list resolving native types. Mapped and known-unknown
/// rules share one list, so registration order alone decides priority.
#[derive(Debug, Clone)]
pub struct TypeMapper {
    rules: Vec<(TypePattern, TypeResolution)>,
}

/// Collects dialect rules ahead of the base rules.
#[derive(Debug, Default)]
pub struct TypeMapperBuilder {
    rules: Vec<(TypePattern, TypeResolution)>,
    registered: HashSet<String>,
}

impl TypeMapperBuilder {
    /// Builder with no dialect rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mapping. Ignored if the pattern is already registered.
    pub fn register(self, pattern: TypePattern, canonical: CanonicalType) -> Self {
        self.push(pattern, TypeResolution::Mapped(canonical))
    }

    /// Registers a type that maps to unknown without a warning.
    pub fn register_known_unknown(self, pattern: TypePattern) -> Self {
        self.push(pattern, TypeResolution::KnownUnknown)
    }

    fn push(mut self, pattern: TypePattern, resolution: TypeResolution) -> Self {
        if self.registered.insert(pattern.key()) {
            self.rules.push((pattern, resolution));
        } else {
            tracing::trace!("Type pattern {} already registered", pattern.key());
        }
        self
    }

    /// Appends the base rules and freezes the rule list.
    pub fn build(self) -> TypeMapper {
        let mut builder = self;
        for (canonical, names) in BASE_RULES {
            for name in *names {
                builder = builder.register(TypePattern::exact(name), *canonical);
            }
        }
        for name in BASE_KNOWN_UNKNOWN {
            builder = builder.register_known_unknown(TypePattern::exact(name));
        }
        TypeMapper {
            rules: builder.rules,
        }
    }
}

impl Default for TypeMapper {
    fn default() -> Self {
        TypeMapperBuilder::new().build()
    }
}

impl TypeMapper {
    /// Starts a rule list; see [`TypeMapperBuilder`].
    pub fn builder() -> TypeMapperBuilder {
        TypeMapperBuilder::new()
    }

    /// Resolves a native type against the first matching rule.
    pub fn resolve(&self, native: &str) -> TypeResolution {
        let base = base_token(native);
        let full = native.trim().to_lowercase();

        self.rules
            .iter()
            .find(|(p, _)| p.matches(&base, &full))
            .map_or(TypeResolution::Unmapped, |(_, resolution)| *resolution)
    }

    /// Canonical type of `native`, unknown when unmapped.
    pub fn map_type(&self, native: &str) -> CanonicalType {
        self.resolve(native).canonical()
    }
}
