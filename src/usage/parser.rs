// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Queue and accounting output parsing into per-node usage totals.
//!
//! Both views end in the same fold: one row per job, fanned out across
//! the job's nodes, summed into a per-node accumulator map.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::gres;

use super::types::UsageMap;

const QUERY_LIVE: &str = "squeue";
const QUERY_ACCOUNTING: &str = "sacct";

/// Parse `squeue --noheader --states=running --noconvert -o '%N|%b|%m|%c'`
/// output: nodelist, GRES, memory, CPUs per running job.
///
/// Memory is a suffixed megabyte figure (`"4000M"`); a job reporting
/// exactly zero memory is floored to `min_memory_gib`, the smallest node
/// capacity of the run.
pub fn parse_live(raw: &str, min_memory_gib: f64) -> Result<UsageMap> {
    let mut usage = UsageMap::new();
    for (index, line) in raw.lines().enumerate() {
        let lineno = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() != 4 {
            return Err(Error::format(
                QUERY_LIVE,
                lineno,
                line,
                format!("expected 4 fields, got {}", fields.len()),
            ));
        }
        let nodes = expand_nodelist(fields[0].trim())
            .ok_or_else(|| Error::format(QUERY_LIVE, lineno, line, "malformed nodelist"))?;
        let gpus = gres::gpu_count(fields[1].trim())
            .ok_or_else(|| Error::format(QUERY_LIVE, lineno, line, "malformed GRES spec"))?;
        let memory_mb = parse_memory_mb(fields[2].trim())
            .ok_or_else(|| Error::format(QUERY_LIVE, lineno, line, "malformed memory figure"))?;
        let cpus = fields[3]
            .trim()
            .parse::<u32>()
            .map_err(|_| Error::format(QUERY_LIVE, lineno, line, "CPU count is not an integer"))?;

        let memory_gib = floor_memory(memory_mb as f64 / 1024.0, min_memory_gib);
        for node in nodes {
            usage.entry(node).or_default().add(cpus, memory_gib, gpus);
        }
    }
    Ok(usage)
}

/// Parse `sacct --noheader --parsable2` rows with columns
/// JobID|NodeList|AllocCPUS|AllocGRES|ReqMem.
///
/// Job steps (a `.` inside the id) duplicate their parent's totals and
/// are skipped, as are jobs named in the runaway-job set. ReqMem is a
/// suffixed megabyte figure (`"64000Mn"`).
pub fn parse_accounting(
    raw: &str,
    runaway: &HashSet<String>,
    min_memory_gib: f64,
) -> Result<UsageMap> {
    let mut usage = UsageMap::new();
    for (index, line) in raw.lines().enumerate() {
        let lineno = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() != 5 {
            return Err(Error::format(
                QUERY_ACCOUNTING,
                lineno,
                line,
                format!("expected 5 fields, got {}", fields.len()),
            ));
        }
        let job_id = fields[0].trim();
        if job_id.contains('.') {
            continue;
        }
        if runaway.contains(job_id) {
            continue;
        }
        let nodes = expand_nodelist(fields[1].trim())
            .ok_or_else(|| Error::format(QUERY_ACCOUNTING, lineno, line, "malformed nodelist"))?;
        let cpus = fields[2].trim().parse::<u32>().map_err(|_| {
            Error::format(QUERY_ACCOUNTING, lineno, line, "CPU count is not an integer")
        })?;
        let gpus = gres::gpu_count(fields[3].trim())
            .ok_or_else(|| Error::format(QUERY_ACCOUNTING, lineno, line, "malformed GRES spec"))?;
        let memory_mb = parse_memory_mb(fields[4].trim()).ok_or_else(|| {
            Error::format(QUERY_ACCOUNTING, lineno, line, "malformed memory figure")
        })?;

        let memory_gib = floor_memory(memory_mb as f64 / 1024.0, min_memory_gib);
        for node in nodes {
            usage.entry(node).or_default().add(cpus, memory_gib, gpus);
        }
    }
    Ok(usage)
}

/// Parse the runaway-job query output into the set of job ids to exclude.
pub fn parse_runaway(raw: &str) -> HashSet<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Strip the unit suffix off a scheduler memory figure (`"4000M"`,
/// `"64000Mn"`) and parse the leading integer megabyte count.
fn parse_memory_mb(field: &str) -> Option<u64> {
    field
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .ok()
}

/// The scheduler reserves at least one node's share for jobs that did not
/// request memory explicitly, so a reported zero is floored rather than
/// trusted.
fn floor_memory(memory_gib: f64, min_memory_gib: f64) -> f64 {
    if memory_gib == 0.0 {
        min_memory_gib
    } else {
        memory_gib
    }
}

/// Expand a compact Slurm nodelist into individual node names.
///
/// Handles plain comma-separated names and one bracketed group per name,
/// preserving zero padding: `"gpu[01-03,07],cpu05"` expands to gpu01,
/// gpu02, gpu03, gpu07, cpu05. Returns `None` for unbalanced brackets or
/// a non-numeric range.
pub fn expand_nodelist(nodelist: &str) -> Option<Vec<String>> {
    if nodelist.is_empty() || nodelist == "(null)" {
        return Some(Vec::new());
    }
    let mut nodes = Vec::new();
    for part in split_outside_brackets(nodelist) {
        let Some(open) = part.find('[') else {
            if part.contains(']') {
                return None;
            }
            if !part.is_empty() {
                nodes.push(part.to_string());
            }
            continue;
        };
        let close = part.find(']')?;
        if close < open || !part[close + 1..].is_empty() {
            return None;
        }
        let prefix = &part[..open];
        for item in part[open + 1..close].split(',') {
            match item.split_once('-') {
                None => {
                    item.parse::<u64>().ok()?;
                    nodes.push(format!("{prefix}{item}"));
                }
                Some((lo, hi)) => {
                    let width = lo.len();
                    let lo: u64 = lo.parse().ok()?;
                    let hi: u64 = hi.parse().ok()?;
                    if hi < lo {
                        return None;
                    }
                    for n in lo..=hi {
                        nodes.push(format!("{prefix}{n:0width$}"));
                    }
                }
            }
        }
    }
    Some(nodes)
}

fn split_outside_brackets(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_plain_names() {
        assert_eq!(
            expand_nodelist("gpu01,cpu05").unwrap(),
            vec!["gpu01", "cpu05"]
        );
    }

    #[test]
    fn test_expand_bracket_range_preserves_padding() {
        assert_eq!(
            expand_nodelist("node[001-003]").unwrap(),
            vec!["node001", "node002", "node003"]
        );
    }

    #[test]
    fn test_expand_mixed_groups() {
        assert_eq!(
            expand_nodelist("gpu[01-02,07],cpu05").unwrap(),
            vec!["gpu01", "gpu02", "gpu07", "cpu05"]
        );
    }

    #[test]
    fn test_expand_null_is_empty() {
        assert_eq!(expand_nodelist("(null)").unwrap(), Vec::<String>::new());
        assert_eq!(expand_nodelist("").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_expand_malformed() {
        assert!(expand_nodelist("node[001-").is_none());
        assert!(expand_nodelist("node[b-c]").is_none());
        assert!(expand_nodelist("node[003-001]").is_none());
    }

    #[test]
    fn test_live_single_job() {
        let raw = "gpu01|gpu:a100:1|65536M|8\n";
        let usage = parse_live(raw, 64.0).unwrap();
        let gpu01 = usage.get("gpu01").unwrap();
        assert_eq!(gpu01.cpus, 8);
        assert_eq!(gpu01.memory_gib, 64.0);
        assert_eq!(gpu01.gpus, 1);
    }

    #[test]
    fn test_live_jobs_aggregate_per_node() {
        let raw = "gpu01|gpu:a100:1|65536M|8\n\
                   gpu01|gpu:a100:2|32768M|4\n\
                   gpu02|(null)|1024M|2\n";
        let usage = parse_live(raw, 64.0).unwrap();
        let gpu01 = usage.get("gpu01").unwrap();
        assert_eq!(gpu01.cpus, 12);
        assert_eq!(gpu01.memory_gib, 96.0);
        assert_eq!(gpu01.gpus, 3);
        assert_eq!(usage.get("gpu02").unwrap().gpus, 0);
    }

    #[test]
    fn test_live_multi_node_job_fans_out() {
        let raw = "node[01-02]|gpu:a100:4|131072M|16\n";
        let usage = parse_live(raw, 64.0).unwrap();
        assert_eq!(usage.len(), 2);
        for name in ["node01", "node02"] {
            let node = usage.get(name).unwrap();
            assert_eq!(node.cpus, 16);
            assert_eq!(node.gpus, 4);
        }
    }

    #[test]
    fn test_live_zero_memory_gets_cluster_minimum_floor() {
        let raw = "n1|(null)|0M|1\n";
        let usage = parse_live(raw, 64.0).unwrap();
        assert_eq!(usage.get("n1").unwrap().memory_gib, 64.0);
    }

    #[test]
    fn test_live_malformed_line_fails() {
        let raw = "gpu01|gpu:a100:1|65536M\n";
        let err = parse_live(raw, 64.0).unwrap_err();
        match err {
            Error::Format { query, lineno, .. } => {
                assert_eq!(query, "squeue");
                assert_eq!(lineno, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_accounting_skips_job_steps() {
        let raw = "1234|gpu01|8|gpu:a100:1|65536Mn\n\
                   1234.batch|gpu01|8|gpu:a100:1|65536Mn\n\
                   1234.0|gpu01|8|gpu:a100:1|65536Mn\n";
        let usage = parse_accounting(raw, &HashSet::new(), 64.0).unwrap();
        let gpu01 = usage.get("gpu01").unwrap();
        assert_eq!(gpu01.cpus, 8);
        assert_eq!(gpu01.gpus, 1);
        assert_eq!(gpu01.memory_gib, 64.0);
    }

    #[test]
    fn test_accounting_skips_runaway_jobs() {
        let raw = "1234|gpu01|8|gpu:a100:1|65536Mn\n\
                   5678|gpu01|4|(null)|1024Mn\n";
        let runaway = parse_runaway("5678\n");
        let usage = parse_accounting(raw, &runaway, 64.0).unwrap();
        let gpu01 = usage.get("gpu01").unwrap();
        assert_eq!(gpu01.cpus, 8);
    }

    #[test]
    fn test_accounting_zero_memory_floor() {
        let raw = "99|n1|1|(null)|0n\n";
        let usage = parse_accounting(raw, &HashSet::new(), 64.0).unwrap();
        assert_eq!(usage.get("n1").unwrap().memory_gib, 64.0);
    }

    #[test]
    fn test_parse_runaway_ignores_blank_lines() {
        let runaway = parse_runaway("123\n\n456\n");
        assert_eq!(runaway.len(), 2);
        assert!(runaway.contains("123"));
        assert!(runaway.contains("456"));
    }

    #[test]
    fn test_parse_memory_mb_suffixes() {
        assert_eq!(parse_memory_mb("4000M"), Some(4000));
        assert_eq!(parse_memory_mb("64000Mn"), Some(64000));
        assert_eq!(parse_memory_mb("0"), Some(0));
        assert_eq!(parse_memory_mb("lots"), None);
    }
}
