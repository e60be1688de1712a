//! Schema contract for the biodiversity store.
//!
//! The three tables the server reads from are declared here rather than discovered at runtime.
//! [check] compares a declaration against the columns SQLite reports for the live table so that
//! a mismatched database is rejected at startup instead of failing on the first request.

use crate::error::BiodiversityError;

use strum_macros::Display;

/// SQLite column type affinity
///
/// Derived from a declared column type using the rules in section 3.1 of
/// <https://www.sqlite.org/datatype3.html>.
#[derive(Clone, Copy, Debug, Display, PartialEq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl Affinity {
    /// Returns the affinity SQLite assigns to a column with the given declared type.
    pub fn of(declared_type: &str) -> Self {
        let declared_type = declared_type.to_ascii_uppercase();
        if declared_type.contains("INT") {
            Self::Integer
        } else if ["CHAR", "CLOB", "TEXT"]
            .iter()
            .any(|s| declared_type.contains(s))
        {
            Self::Text
        } else if declared_type.contains("BLOB") || declared_type.is_empty() {
            Self::Blob
        } else if ["REAL", "FLOA", "DOUB"]
            .iter()
            .any(|s| declared_type.contains(s))
        {
            Self::Real
        } else {
            Self::Numeric
        }
    }
}

const INTEGER: &[Affinity] = &[Affinity::Integer];
const TEXT: &[Affinity] = &[Affinity::Text];
const NUMBER: &[Affinity] = &[Affinity::Integer, Affinity::Real, Affinity::Numeric];

/// A column the server relies on
#[derive(Debug)]
pub struct ColumnContract {
    /// Column name
    pub name: &'static str,
    /// Affinities the declared column type may have
    pub accepts: &'static [Affinity],
}

/// A table the server relies on
#[derive(Debug)]
pub struct TableContract {
    /// Table name
    pub name: &'static str,
    /// Columns which must be present
    pub columns: &'static [ColumnContract],
    /// Affinities allowed for any column not named in `columns`.
    ///
    /// `None` means undeclared columns are ignored.
    pub other_columns: Option<&'static [Affinity]>,
}

/// Column as reported by SQLite's `table_info` pragma
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Declared type, possibly empty
    #[sqlx(rename = "type")]
    pub declared_type: String,
}

impl ColumnInfo {
    pub fn new(name: &str, declared_type: &str) -> Self {
        ColumnInfo {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
        }
    }
}

/// Key column of the count matrix, shared with the taxonomic unit catalog
pub const OTU_ID: &str = "otu_id";

/// Taxonomic unit catalog
pub const OTU: TableContract = TableContract {
    name: "otu",
    columns: &[
        ColumnContract {
            name: OTU_ID,
            accepts: INTEGER,
        },
        ColumnContract {
            name: "lowest_taxonomic_unit_found",
            accepts: TEXT,
        },
    ],
    other_columns: None,
};

/// Wide count matrix: one row per taxonomic unit, one column per sample
pub const SAMPLES: TableContract = TableContract {
    name: "samples",
    columns: &[ColumnContract {
        name: OTU_ID,
        accepts: INTEGER,
    }],
    other_columns: Some(INTEGER),
};

/// Per-sample metadata keyed by the numeric sample ID
pub const SAMPLES_METADATA: TableContract = TableContract {
    name: "samples_metadata",
    columns: &[
        ColumnContract {
            name: "SAMPLEID",
            accepts: INTEGER,
        },
        ColumnContract {
            name: "ETHNICITY",
            accepts: TEXT,
        },
        ColumnContract {
            name: "GENDER",
            accepts: TEXT,
        },
        ColumnContract {
            name: "AGE",
            accepts: NUMBER,
        },
        ColumnContract {
            name: "LOCATION",
            accepts: TEXT,
        },
        ColumnContract {
            name: "BBTYPE",
            accepts: TEXT,
        },
        ColumnContract {
            name: "WFREQ",
            accepts: NUMBER,
        },
    ],
    other_columns: None,
};

/// All tables read by the server.
pub const TABLES: [&TableContract; 3] = [&OTU, &SAMPLES, &SAMPLES_METADATA];

fn mismatch(table: &TableContract, reason: String) -> BiodiversityError {
    BiodiversityError::SchemaMismatch {
        table: table.name,
        reason,
    }
}

/// Check the columns of a live table against its contract.
///
/// Column names are compared case-sensitively. An empty `columns` slice means the table does not
/// exist.
///
/// # Arguments
///
/// * `table`: Declared table contract
/// * `columns`: Columns reported by the store, in declaration order
pub fn check(table: &TableContract, columns: &[ColumnInfo]) -> Result<(), BiodiversityError> {
    if columns.is_empty() {
        return Err(mismatch(table, "table is missing".to_string()));
    }
    for expected in table.columns {
        let actual = columns
            .iter()
            .find(|column| column.name == expected.name)
            .ok_or_else(|| mismatch(table, format!("column {} is missing", expected.name)))?;
        let affinity = Affinity::of(&actual.declared_type);
        if !expected.accepts.contains(&affinity) {
            return Err(mismatch(
                table,
                format!(
                    "column {} has {} affinity (declared {:?})",
                    expected.name, affinity, actual.declared_type
                ),
            ));
        }
    }
    if let Some(accepts) = table.other_columns {
        for column in columns
            .iter()
            .filter(|column| !table.columns.iter().any(|c| c.name == column.name))
        {
            let affinity = Affinity::of(&column.declared_type);
            if !accepts.contains(&affinity) {
                return Err(mismatch(
                    table,
                    format!(
                        "column {} has {} affinity (declared {:?})",
                        column.name, affinity, column.declared_type
                    ),
                ));
            }
        }
    }
    Ok(())
}
