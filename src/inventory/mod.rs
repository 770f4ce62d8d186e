// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Node inventory: query sinfo, parse, enrich, and priority-sort.

pub mod config;
pub mod parser;
pub mod types;

use std::path::Path;

use crate::error::Result;
use crate::exec;

pub use types::{NodeRecord, UnavailableNode};

/// Query sinfo and return priority-sorted available nodes plus the
/// unavailable-node diagnostic list.
pub fn collect(gres_conf: &Path, weights_conf: &Path) -> Result<(Vec<NodeRecord>, Vec<UnavailableNode>)> {
    let output = exec::run("sinfo", &["-N", "--noheader", "-o", "%N|%c|%m|%G|%t|%P"])?;
    let (mut nodes, unavailable) = parser::parse_inventory(&output.stdout)?;
    config::apply_gpu_types(&mut nodes, gres_conf);
    config::apply_weights(&mut nodes, weights_conf);
    sort_by_weight(&mut nodes);
    Ok((nodes, unavailable))
}

/// Ascending weight, unconfigured weights last, node name as tie-break.
pub fn sort_by_weight(nodes: &mut [NodeRecord]) {
    nodes.sort_by(|a, b| {
        let wa = a.weight.unwrap_or(i64::MAX);
        let wb = b.weight.unwrap_or(i64::MAX);
        wa.cmp(&wb).then_with(|| a.name.cmp(&b.name))
    });
}

/// Smallest node memory capacity of the run, the floor for jobs that
/// report zero memory.
pub fn min_memory_gib(nodes: &[NodeRecord]) -> f64 {
    nodes
        .iter()
        .map(|n| n.memory_gib)
        .reduce(f64::min)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn node(name: &str, memory_gib: f64, weight: Option<i64>) -> NodeRecord {
        NodeRecord {
            name: name.to_string(),
            cpus: 32,
            memory_gib,
            gpus: 0,
            gpu_types: Vec::new(),
            partitions: BTreeSet::new(),
            weight,
        }
    }

    #[test]
    fn test_sort_unconfigured_weights_last() {
        let mut nodes = vec![
            node("c", 64.0, None),
            node("b", 64.0, Some(20)),
            node("a", 64.0, Some(10)),
        ];
        sort_by_weight(&mut nodes);
        let names: Vec<_> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_ties_break_by_name() {
        let mut nodes = vec![
            node("b", 64.0, Some(10)),
            node("a", 64.0, Some(10)),
        ];
        sort_by_weight(&mut nodes);
        assert_eq!(nodes[0].name, "a");
    }

    #[test]
    fn test_min_memory() {
        let nodes = vec![node("a", 256.0, None), node("b", 64.0, None)];
        assert_eq!(min_memory_gib(&nodes), 64.0);
        assert_eq!(min_memory_gib(&[]), 0.0);
    }
}
