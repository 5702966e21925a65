use std::cmp::Ordering;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::config::{Prefetcher, ReplacementPolicy};
use crate::dispatcher::TaskOutcome;
use crate::enumerator::Configuration;
use crate::error::SweepError;

/// Column names of the result table, in order
pub const RESULT_COLUMNS: [&str; 10] = ["trace", "B", "C1", "S1", "L2_en", "C2", "S2", "Rep", "Pref", "L1_AAT"];

/// One successful simulator run: the trace, the full configuration, and the measured time
///
/// Field names match the CSV columns. Unset L2 fields are written as empty cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub trace: String,
    #[serde(rename = "B")]
    pub block_size: u32,
    #[serde(rename = "C1")]
    pub l1_size: u32,
    #[serde(rename = "S1")]
    pub l1_assoc: u32,
    #[serde(rename = "L2_en", with = "fields::flag")]
    pub l2_enabled: bool,
    #[serde(rename = "C2", default, deserialize_with = "fields::exponent")]
    pub l2_size: Option<u32>,
    #[serde(rename = "S2", default, deserialize_with = "fields::exponent")]
    pub l2_assoc: Option<u32>,
    #[serde(rename = "Rep")]
    pub replacement: Option<ReplacementPolicy>,
    #[serde(rename = "Pref")]
    pub prefetcher: Option<Prefetcher>,
    #[serde(rename = "L1_AAT")]
    pub l1_aat: f64,
}

impl ResultRow {
    pub fn new(trace: &str, config: &Configuration, l1_aat: f64) -> Self {
        ResultRow {
            trace: trace.to_string(),
            block_size: config.block_size,
            l1_size: config.l1_size,
            l1_assoc: config.l1_assoc,
            l2_enabled: config.l2_enabled(),
            l2_size: config.l2_size(),
            l2_assoc: config.l2_assoc(),
            replacement: config.replacement(),
            prefetcher: config.prefetcher(),
            l1_aat,
        }
    }

    /// Compares by (trace, B, C1, S1, L2_en, C2, S2, Rep, Pref), unset values sorting last
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.trace.cmp(&other.trace)
            .then(self.block_size.cmp(&other.block_size))
            .then(self.l1_size.cmp(&other.l1_size))
            .then(self.l1_assoc.cmp(&other.l1_assoc))
            .then(self.l2_enabled.cmp(&other.l2_enabled))
            .then(cmp_none_last(&self.l2_size, &other.l2_size))
            .then(cmp_none_last(&self.l2_assoc, &other.l2_assoc))
            .then(cmp_none_last(&self.replacement.map(|r| r.as_str()), &other.replacement.map(|r| r.as_str())))
            .then(cmp_none_last(&self.prefetcher.map(|p| p.as_str()), &other.prefetcher.map(|p| p.as_str())))
    }
}

fn cmp_none_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The sorted set of results, the only thing passed from the sweep to the report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Builds a table from rows in any order
    pub fn from_rows(mut rows: Vec<ResultRow>) -> Self {
        rows.sort_by(ResultRow::cmp_key);
        ResultTable { rows }
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the table as CSV, replacing anything already at `path`
    pub fn write_csv(&self, path: &Path) -> Result<(), SweepError> {
        self.to_writer(File::create(path)?)
    }

    /// Writes the header and every row. The header is written even for an empty table
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), SweepError> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        writer.write_record(RESULT_COLUMNS)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Loads a table written by [`ResultTable::write_csv`]
    pub fn read_csv(path: &Path) -> Result<Self, SweepError> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SweepError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let rows = reader.deserialize().collect::<Result<Vec<ResultRow>, _>>()?;
        Ok(Self::from_rows(rows))
    }
}

/// Collects task outcomes as they arrive, keeping only the successes
#[derive(Debug, Default)]
pub struct Aggregator {
    rows: Vec<ResultRow>,
    failures: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            Ok(row) => self.rows.push(row),
            Err(_) => self.failures += 1,
        }
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn finish(self) -> ResultTable {
        ResultTable::from_rows(self.rows)
    }
}

/// Serde helpers for the CSV columns shared by the result table and the report
pub(crate) mod fields {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    /// `L2_en` is stored as 0 or 1. Reading also accepts true/false.
    pub mod flag {
        use super::*;

        pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_u8(*value as u8)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
            let raw = String::deserialize(deserializer)?;
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "1.0" | "true" => Ok(true),
                "0" | "0.0" | "false" => Ok(false),
                other => Err(D::Error::custom(format!("invalid L2_en value \"{other}\""))),
            }
        }
    }

    /// Reads an optional exponent, accepting integral floats such as `16.0`
    pub fn exponent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else { return Ok(None) };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if let Ok(value) = raw.parse::<u32>() {
            return Ok(Some(value));
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_nan() => Ok(None),
            Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 => Ok(Some(value as u32)),
            _ => Err(D::Error::custom(format!("invalid exponent \"{raw}\""))),
        }
    }
}
