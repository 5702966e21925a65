use std::fs;
use tempfile::tempdir;
use crate::aggregate::{ResultRow, ResultTable};
use crate::enumerator::enumerate;
use crate::report::{best_block_sizes, filter_report, policy_rank, read_rows, write_rows, ReportRow, POLICY_ORDER};
use super::{small_config, FakeRunner};

const HEADER: &str = "trace,B,C1,S1,L2_en,C2,S2,Rep,Pref,L1_AAT";

fn rows(body: &str) -> Vec<ReportRow> {
    read_rows(format!("{HEADER}\n{body}").as_bytes()).unwrap()
}

#[test]
fn keeps_the_lower_time() {
    let input = rows("gcc.trace,5,14,0,1,16,1,mip,none,4.0\ngcc.trace,6,14,0,1,16,1,mip,none,3.0\n");
    let best = best_block_sizes(&input);
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].block_size, 6);
    assert_eq!(best[0].l1_aat, 3.0);
}

#[test]
fn ties_keep_the_first_row() {
    let input = rows(
        "gcc.trace,7,14,0,0,,,,,2.0\ngcc.trace,5,14,0,0,,,,,2.0\ngcc.trace,6,14,0,0,,,,,2.0\n",
    );
    let best = best_block_sizes(&input);
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].block_size, 7);
}

#[test]
fn fills_missing_values() {
    let input = rows("gcc.trace,5,14,0,0,,,,,2.0\ngcc.trace,5,14,0,1,16.0,1.0, MIP ,PLUS1,2.0\n");
    assert_eq!((input[0].l2_size, input[0].l2_assoc), (0, 0));
    assert_eq!(input[0].replacement, "none");
    assert_eq!(input[0].prefetcher, "none");
    assert_eq!(input[0].policy, "l2-disabled");
    assert_eq!(input[1].replacement, "mip");
    assert_eq!(input[1].prefetcher, "plus1");
    assert_eq!(input[1].policy, "mip-plus1");
}

#[test]
fn zero_l2_size_counts_as_disabled() {
    let input = rows("gcc.trace,5,14,0,1,0,0,lip,none,2.0\n");
    assert_eq!(input[0].policy, "l2-disabled");
}

#[test]
fn groups_come_out_in_policy_order() {
    let input = rows(
        "gcc.trace,5,14,0,1,16,1,lip,plus1,1.0\n\
         gcc.trace,5,14,0,1,16,1,lip,none,1.0\n\
         gcc.trace,5,14,0,1,16,1,mip,plus1,1.0\n\
         gcc.trace,5,14,0,1,16,1,mip,none,1.0\n\
         gcc.trace,5,14,0,0,,,,,1.0\n",
    );
    let labels: Vec<String> = best_block_sizes(&input).into_iter().map(|r| r.policy).collect();
    assert_eq!(labels, POLICY_ORDER);
}

#[test]
fn groups_are_separate_per_geometry() {
    let input = rows(
        "mcf.trace,5,14,0,0,,,,,1.0\n\
         gcc.trace,5,15,0,0,,,,,1.0\n\
         gcc.trace,5,14,1,0,,,,,1.0\n\
         gcc.trace,5,14,0,0,,,,,1.0\n\
         gcc.trace,6,14,0,0,,,,,0.5\n",
    );
    let best = best_block_sizes(&input);
    let keys: Vec<(&str, u32, u32, u32)> = best.iter()
        .map(|r| (r.trace.as_str(), r.l1_size, r.l1_assoc, r.block_size))
        .collect();
    assert_eq!(keys, [("gcc.trace", 14, 0, 6), ("gcc.trace", 14, 1, 5), ("gcc.trace", 15, 0, 5), ("mcf.trace", 14, 0, 5)]);
}

#[test]
fn unknown_policies_are_dropped() {
    let input = rows("gcc.trace,5,14,0,1,16,1,lru,none,1.0\ngcc.trace,5,14,0,0,,,,,1.0\n");
    assert_eq!(policy_rank(&input[0].policy), None);
    let best = best_block_sizes(&input);
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].policy, "l2-disabled");
}

#[test]
fn filters_a_result_table_file() {
    let config = small_config();
    let configs = enumerate(&config);
    let table = ResultTable::from_rows(
        configs.iter().map(|c| ResultRow::new("a.trace", c, FakeRunner::aat(c))).collect(),
    );
    let dir = tempdir().unwrap();
    let input = dir.path().join("cache_results.csv");
    let output = dir.path().join("best.csv");
    table.write_csv(&input).unwrap();

    // Only one block size in the sweep, so every row is its own group
    let kept = filter_report(&input, &output).unwrap();
    assert_eq!(kept, configs.len());
    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(text.lines().next().unwrap(), format!("{HEADER},L2_policy"));
    assert_eq!(text.lines().count(), configs.len() + 1);
    assert_eq!(text.lines().nth(1).unwrap(), "a.trace,5,6,0,0,0,0,none,none,5.0,l2-disabled");
}

#[test]
fn empty_report_still_has_a_header() {
    let mut buf = Vec::new();
    write_rows(&mut buf, &[]).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), format!("{HEADER},L2_policy\n"));
}

#[test]
fn filtering_an_empty_table_keeps_the_header() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("cache_results.csv");
    let output = dir.path().join("best.csv");
    ResultTable::default().write_csv(&input).unwrap();
    assert_eq!(filter_report(&input, &output).unwrap(), 0);
    assert_eq!(fs::read_to_string(&output).unwrap(), format!("{HEADER},L2_policy\n"));
}
