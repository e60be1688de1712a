//! Reshape operations.
//!
//! Each function turns rows read from the store into the value a route responds with. None of
//! them touch the database, so they are tested and benchmarked on plain vectors.

use crate::error::BiodiversityError;
use crate::models::{Number, SampleMetadata, SampleVector};

use std::cmp::Ordering;
use crate::schema::{ColumnInfo, OTU_ID};

/// Counts at or below this value are treated as noise and dropped from sample vectors.
pub const NOISE_THRESHOLD: i64 = 1;

/// Returns the sample names of the count matrix in column order.
///
/// # Arguments
///
/// * `columns`: Columns of the count matrix, in declaration order
pub fn sample_names(columns: &[ColumnInfo]) -> Vec<String> {
    columns
        .iter()
        .filter(|column| column.name != OTU_ID)
        .map(|column| column.name.clone())
        .collect()
}

/// Build the count vector of one sample.
///
/// Rows with a count of [NOISE_THRESHOLD] or less (including NULL) are dropped and the remainder
/// sorted by count, largest first. Counts are compared by value whatever their storage class. The
/// sort is stable so units with equal counts keep their storage order.
///
/// # Arguments
///
/// * `rows`: `(otu_id, count)` pairs in storage order
pub fn sample_vector<I>(rows: I) -> SampleVector
where
    I: IntoIterator<Item = (i64, Option<Number>)>,
{
    let threshold = Number::Integer(NOISE_THRESHOLD);
    let mut rows: Vec<(i64, Number)> = rows
        .into_iter()
        .filter_map(|(otu_id, count)| count.map(|count| (otu_id, count)))
        .filter(|(_, count)| count.cmp_value(&threshold) == Ordering::Greater)
        .collect();
    rows.sort_by(|(_, a), (_, b)| b.cmp_value(a));
    let (otu_ids, sample_values) = rows.into_iter().unzip();
    SampleVector {
        otu_ids,
        sample_values,
    }
}

/// Collapse the metadata rows matching a sample into a single record.
///
/// When `SAMPLEID` is not unique the last row wins.
///
/// # Arguments
///
/// * `sample`: Sample name from the request, used in errors and logs
/// * `rows`: Matching metadata rows in storage order
pub fn sample_metadata(
    sample: &str,
    rows: Vec<SampleMetadata>,
) -> Result<SampleMetadata, BiodiversityError> {
    let matches = rows.len();
    if matches > 1 {
        tracing::warn!(sample, matches, "duplicate SAMPLEID in samples_metadata, using last row");
    }
    rows.into_iter()
        .last()
        .ok_or_else(|| BiodiversityError::LookupNotFound {
            sample: sample.to_string(),
        })
}

/// Pick the weekly washing frequency from the `WFREQ` values matching a sample.
///
/// The first row wins.
///
/// # Arguments
///
/// * `sample`: Sample name from the request, used in errors
/// * `values`: `WFREQ` of each matching row in storage order, already truncated to integers
pub fn wash_frequency(sample: &str, values: Vec<Option<i64>>) -> Result<i64, BiodiversityError> {
    match values.into_iter().next() {
        None => Err(BiodiversityError::LookupNotFound {
            sample: sample.to_string(),
        }),
        Some(None) => Err(BiodiversityError::MissingValue {
            sample: sample.to_string(),
            column: "WFREQ",
        }),
        Some(Some(wfreq)) => Ok(wfreq),
    }
}
