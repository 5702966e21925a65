use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::aggregate::RESULT_COLUMNS;
use crate::error::SweepError;

/// The label given to every row without an L2 cache
pub const L2_DISABLED: &str = "l2-disabled";

/// Known L2 policy labels, in the order groups are reported
pub const POLICY_ORDER: [&str; 5] = [L2_DISABLED, "mip-none", "mip-plus1", "lip-none", "lip-plus1"];

/// Column holding the derived policy label, after the result table columns
pub const POLICY_COLUMN: &str = "L2_policy";

/// A result table row as found on disk, before normalisation
#[derive(Debug, Clone, Deserialize)]
struct RawRow {
    trace: String,
    #[serde(rename = "B")]
    block_size: u32,
    #[serde(rename = "C1")]
    l1_size: u32,
    #[serde(rename = "S1")]
    l1_assoc: u32,
    #[serde(rename = "L2_en", deserialize_with = "crate::aggregate::fields::flag::deserialize")]
    l2_enabled: bool,
    #[serde(rename = "C2", default, deserialize_with = "crate::aggregate::fields::exponent")]
    l2_size: Option<u32>,
    #[serde(rename = "S2", default, deserialize_with = "crate::aggregate::fields::exponent")]
    l2_assoc: Option<u32>,
    #[serde(rename = "Rep", default)]
    replacement: Option<String>,
    #[serde(rename = "Pref", default)]
    prefetcher: Option<String>,
    #[serde(rename = "L1_AAT")]
    l1_aat: f64,
}

/// A normalised row: no missing values, and the derived L2 policy label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub trace: String,
    #[serde(rename = "B")]
    pub block_size: u32,
    #[serde(rename = "C1")]
    pub l1_size: u32,
    #[serde(rename = "S1")]
    pub l1_assoc: u32,
    #[serde(rename = "L2_en", serialize_with = "crate::aggregate::fields::flag::serialize")]
    pub l2_enabled: bool,
    #[serde(rename = "C2")]
    pub l2_size: u32,
    #[serde(rename = "S2")]
    pub l2_assoc: u32,
    #[serde(rename = "Rep")]
    pub replacement: String,
    #[serde(rename = "Pref")]
    pub prefetcher: String,
    #[serde(rename = "L1_AAT")]
    pub l1_aat: f64,
    #[serde(rename = "L2_policy")]
    pub policy: String,
}

impl From<RawRow> for ReportRow {
    fn from(raw: RawRow) -> Self {
        let replacement = normalise_name(raw.replacement);
        let prefetcher = normalise_name(raw.prefetcher);
        let l2_size = raw.l2_size.unwrap_or(0);
        let policy = policy_label(raw.l2_enabled, l2_size, &replacement, &prefetcher);
        ReportRow {
            trace: raw.trace,
            block_size: raw.block_size,
            l1_size: raw.l1_size,
            l1_assoc: raw.l1_assoc,
            l2_enabled: raw.l2_enabled,
            l2_size,
            l2_assoc: raw.l2_assoc.unwrap_or(0),
            replacement,
            prefetcher,
            l1_aat: raw.l1_aat,
            policy,
        }
    }
}

fn normalise_name(name: Option<String>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.trim().to_lowercase(),
        _ => "none".to_string(),
    }
}

/// Derives the L2 policy label of a row
///
/// # Examples
///
/// ```
/// use sweeplib::report::policy_label;
/// assert_eq!(policy_label(true, 16, "mip", "plus1"), "mip-plus1");
/// assert_eq!(policy_label(true, 0, "mip", "plus1"), "l2-disabled");
/// assert_eq!(policy_label(false, 16, "mip", "plus1"), "l2-disabled");
/// ```
pub fn policy_label(l2_enabled: bool, l2_size: u32, replacement: &str, prefetcher: &str) -> String {
    if !l2_enabled || l2_size == 0 {
        L2_DISABLED.to_string()
    } else {
        format!("{replacement}-{prefetcher}")
    }
}

/// The position of a label in [`POLICY_ORDER`], or `None` for an unknown label
pub fn policy_rank(label: &str) -> Option<usize> {
    POLICY_ORDER.iter().position(|known| *known == label)
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    trace: String,
    l1_size: u32,
    l2_size: u32,
    l1_assoc: u32,
    l2_assoc: u32,
    policy_rank: usize,
}

/// Keeps the fastest row of each (trace, C1, C2, S1, S2, L2 policy) group
///
/// In other words, picks the best block size for every cache geometry and policy. On a tie the
/// row seen first wins. Groups come out ordered by their key, with policies in [`POLICY_ORDER`].
/// Rows with a policy label outside [`POLICY_ORDER`] don't belong to any group and are dropped.
///
/// # Arguments
///
/// * `rows`: Normalised rows, in table order
///
/// returns: Vec<ReportRow>
pub fn best_block_sizes(rows: &[ReportRow]) -> Vec<ReportRow> {
    let mut best: BTreeMap<GroupKey, usize> = BTreeMap::new();
    let mut unknown = 0;
    for (i, row) in rows.iter().enumerate() {
        let Some(policy_rank) = policy_rank(&row.policy) else {
            unknown += 1;
            continue;
        };
        let key = GroupKey {
            trace: row.trace.clone(),
            l1_size: row.l1_size,
            l2_size: row.l2_size,
            l1_assoc: row.l1_assoc,
            l2_assoc: row.l2_assoc,
            policy_rank,
        };
        match best.entry(key) {
            Entry::Vacant(e) => {
                e.insert(i);
            }
            Entry::Occupied(mut e) => {
                let current = rows[*e.get()].l1_aat;
                if row.l1_aat < current || (current.is_nan() && !row.l1_aat.is_nan()) {
                    e.insert(i);
                }
            }
        }
    }
    if unknown > 0 {
        warn!(rows = unknown, "dropped rows with an unknown L2 policy");
    }
    best.into_values().map(|i| rows[i].clone()).collect()
}

/// Reads and normalises a result table
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<ReportRow>, SweepError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for raw in reader.deserialize::<RawRow>() {
        rows.push(ReportRow::from(raw?));
    }
    Ok(rows)
}

/// Writes the reduced table, header included even when there are no rows
pub fn write_rows<W: Write>(writer: W, rows: &[ReportRow]) -> Result<(), SweepError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    writer.write_record(RESULT_COLUMNS.iter().chain(std::iter::once(&POLICY_COLUMN)))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reduces the result table at `input` to the best block size per group, writing it to `output`
///
/// returns: the number of rows written
pub fn filter_report(input: &Path, output: &Path) -> Result<usize, SweepError> {
    let rows = read_rows(File::open(input)?)?;
    let best = best_block_sizes(&rows);
    write_rows(File::create(output)?, &best)?;
    info!(read = rows.len(), kept = best.len(), output = %output.display(), "report written");
    Ok(best.len())
}
