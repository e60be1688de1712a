//! Request and response data types

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use validator::{Validate, ValidationError, ValidationErrors};

/// Number of leading characters stripped from a sample name to obtain its metadata key, e.g.
/// `BB_` in `BB_940`.
pub const SAMPLE_PREFIX_LEN: usize = 3;

/// Path parameters for routes addressing a sample column of the count matrix
///
/// Any non-empty segment is accepted; whether it names a column is decided by the store.
#[derive(Debug, Deserialize, Validate)]
pub struct SamplePath {
    /// Full sample name, e.g. `BB_940`
    pub sample: String,
}

/// Path parameters for routes addressing a row of the sample metadata
#[derive(Debug, Deserialize, Validate)]
pub struct MetadataPath {
    /// Sample name whose suffix is the numeric `SAMPLEID`, e.g. `BB_940`
    pub sample: String,
}

impl MetadataPath {
    /// Returns the `SAMPLEID` this sample name refers to.
    ///
    /// Fails with errors keyed on `sample` if the name is not a prefix followed by digits.
    pub fn sample_id(&self) -> Result<i64, ValidationErrors> {
        parse_sample_identifier(&self.sample).map_err(|error| {
            let mut errors = ValidationErrors::new();
            errors.add("sample", error);
            errors
        })
    }
}

/// Strip the sample prefix and parse the remainder as a `SAMPLEID`.
///
/// The prefix is not required to be `BB_`; any three characters are accepted. The remainder must
/// be a non-empty run of ASCII digits that fits an `i64`.
pub fn parse_sample_identifier(sample: &str) -> Result<i64, ValidationError> {
    let digits = sample
        .char_indices()
        .nth(SAMPLE_PREFIX_LEN)
        .map(|(index, _)| &sample[index..])
        .ok_or_else(|| {
            let mut error = ValidationError::new("sample identifier is too short");
            error.add_param("sample".into(), &sample);
            error
        })?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        let mut error = ValidationError::new("sample identifier must end in digits");
        error.add_param("sample".into(), &sample);
        return Err(error);
    }
    digits.parse::<i64>().map_err(|_| {
        let mut error = ValidationError::new("sample identifier is out of range");
        error.add_param("sample".into(), &sample);
        error
    })
}

/// Count vector of a single sample
///
/// `otu_ids` and `sample_values` are parallel: index `i` of each describes the same taxonomic
/// unit.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SampleVector {
    /// Taxonomic unit IDs
    pub otu_ids: Vec<i64>,
    /// Counts of each unit in the sample
    pub sample_values: Vec<Number>,
}

/// A numeric value, kept in the storage class it was read with
///
/// SQLite only enforces column affinity loosely, so an INTEGER column may still hold reals.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Real(f64),
}

impl Number {
    /// Compare two numbers by value, exactly when both are integers.
    ///
    /// SQLite never stores NaN, so reals always have a total order here; NaN compares equal.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (a, b) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
        }
    }

    /// Returns the value as a float.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(value) => *value as f64,
            Self::Real(value) => *value,
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

/// Demographic metadata of a sample
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct SampleMetadata {
    #[serde(rename = "SAMPLEID")]
    pub sample_id: i64,
    pub ethnicity: Option<String>,
    pub gender: Option<String>,
    pub age: Option<Number>,
    pub location: Option<String>,
    #[serde(rename = "BBTYPE")]
    pub bb_type: Option<String>,
}
