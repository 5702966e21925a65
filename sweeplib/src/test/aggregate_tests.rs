use std::cmp::Ordering;
use std::fs;
use tempfile::tempdir;
use crate::aggregate::{Aggregator, ResultRow, ResultTable};
use crate::config::{Prefetcher, ReplacementPolicy};
use crate::enumerator::{enumerate, Configuration, L2Config};
use super::{small_config, FakeRunner};

const HEADER: &str = "trace,B,C1,S1,L2_en,C2,S2,Rep,Pref,L1_AAT";

fn disabled(trace: &str, l1_assoc: u32, l1_aat: f64) -> ResultRow {
    ResultRow::new(trace, &Configuration { block_size: 5, l1_size: 14, l1_assoc, l2: None }, l1_aat)
}

fn enabled(trace: &str, l1_assoc: u32, replacement: ReplacementPolicy, prefetcher: Prefetcher, l1_aat: f64) -> ResultRow {
    let l2 = L2Config { size: 16, assoc: l1_assoc + 1, replacement, prefetcher };
    ResultRow::new(trace, &Configuration { block_size: 5, l1_size: 14, l1_assoc, l2: Some(l2) }, l1_aat)
}

#[test]
fn sorts_by_key_with_disabled_l2_first() {
    let rows = vec![
        enabled("mcf.trace", 0, ReplacementPolicy::Mip, Prefetcher::PlusOne, 4.0),
        enabled("gcc.trace", 1, ReplacementPolicy::Mip, Prefetcher::NoPrefetch, 3.0),
        disabled("gcc.trace", 1, 2.0),
        enabled("gcc.trace", 1, ReplacementPolicy::Lip, Prefetcher::PlusOne, 1.0),
        disabled("gcc.trace", 0, 5.0),
        enabled("gcc.trace", 1, ReplacementPolicy::Lip, Prefetcher::NoPrefetch, 6.0),
    ];
    let table = ResultTable::from_rows(rows);
    let times: Vec<f64> = table.rows().iter().map(|r| r.l1_aat).collect();
    // gcc S1=0, then gcc S1=1 disabled, lip-none, lip-plus1, mip-none, then mcf
    assert_eq!(times, [5.0, 2.0, 6.0, 1.0, 3.0, 4.0]);
}

#[test]
fn unset_values_sort_last() {
    let mut unset = enabled("gcc.trace", 1, ReplacementPolicy::Lip, Prefetcher::NoPrefetch, 1.0);
    let set = unset.clone();
    unset.l2_size = None;
    assert_eq!(set.cmp_key(&unset), Ordering::Less);
    assert_eq!(unset.cmp_key(&set), Ordering::Greater);
    unset.l2_size = set.l2_size;
    unset.replacement = None;
    assert_eq!(set.cmp_key(&unset), Ordering::Less);
}

#[test]
fn csv_layout() {
    let table = ResultTable::from_rows(vec![
        disabled("gcc.trace", 0, 1.5),
        enabled("gcc.trace", 2, ReplacementPolicy::Mip, Prefetcher::PlusOne, 2.25),
    ]);
    let mut buf = Vec::new();
    table.to_writer(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, [HEADER, "gcc.trace,5,14,0,0,,,,,1.5", "gcc.trace,5,14,2,1,16,3,mip,plus1,2.25"]);
}

#[test]
fn round_trip_through_a_file() {
    let config = small_config();
    let configs = enumerate(&config);
    let rows = config.traces.iter()
        .flat_map(|trace| configs.iter().map(move |c| ResultRow::new(trace, c, FakeRunner::aat(c))))
        .collect();
    let table = ResultTable::from_rows(rows);

    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");
    table.write_csv(&path).unwrap();
    let read = ResultTable::read_csv(&path).unwrap();
    assert_eq!(read, table);
    assert_eq!(read.len(), 28);
}

#[test]
fn overwrites_an_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");
    fs::write(&path, "stale\n".repeat(100)).unwrap();
    ResultTable::from_rows(vec![disabled("gcc.trace", 0, 1.5)]).write_csv(&path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, format!("{HEADER}\ngcc.trace,5,14,0,0,,,,,1.5\n"));
}

#[test]
fn reads_float_exponents() {
    let text = format!("{HEADER}\nleela.trace,6,15,1,1,16.0,2.0,MIP,none,3.5\nleela.trace,6,15,1,0,,,,,2.5\n");
    let table = ResultTable::from_reader(text.as_bytes()).unwrap();
    assert_eq!(table.rows()[0].l2_enabled, false);
    assert_eq!(table.rows()[1].l2_size, Some(16));
    assert_eq!(table.rows()[1].l2_assoc, Some(2));
    assert_eq!(table.rows()[1].replacement, Some(ReplacementPolicy::Mip));
    assert_eq!(table.rows()[1].prefetcher, Some(Prefetcher::NoPrefetch));
}

#[test]
fn rejects_a_fractional_exponent() {
    let text = format!("{HEADER}\nleela.trace,6,15,1,1,16.5,2,mip,none,3.5\n");
    assert!(ResultTable::from_reader(text.as_bytes()).is_err());
}

#[test]
fn aggregator_keeps_only_successes() {
    let config = small_config();
    let configs = enumerate(&config);
    let mut aggregator = Aggregator::new();
    aggregator.record(Ok(disabled("b.trace", 0, 1.0)));
    aggregator.record(Err(crate::dispatcher::TaskFailure {
        trace: "a.trace".to_string(),
        config: configs[0],
        index: 1,
        total: configs.len(),
        error: crate::error::RunError::Parse("missing".to_string()),
    }));
    aggregator.record(Ok(disabled("a.trace", 0, 2.0)));
    assert_eq!(aggregator.failures(), 1);
    let table = aggregator.finish();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[0].trace, "a.trace");
}

#[test]
fn empty_table_still_has_a_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");
    ResultTable::from_rows(Vec::new()).write_csv(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), format!("{HEADER}\n"));
    assert!(ResultTable::read_csv(&path).unwrap().is_empty());
}
