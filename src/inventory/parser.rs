// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! sinfo output parsing: per-(node, partition) lines into deduplicated
//! per-node records.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::gres;

use super::types::{NodeRecord, UnavailableNode};

const QUERY: &str = "sinfo";

/// State prefixes that exclude a node from the report.
const UNAVAILABLE_PREFIXES: [&str; 3] = ["down", "drain", "fail"];

/// One parsed line of `sinfo -N -o '%N|%c|%m|%G|%t|%P'` output.
#[derive(Debug, Clone)]
struct InventoryRow {
    lineno: usize,
    node: String,
    cpus: u32,
    memory_mb: u64,
    gres: String,
    state: String,
    partition: String,
}

/// Parse raw node-inventory output.
///
/// Returns available nodes (deduplicated, partitions unioned, not yet
/// enriched or sorted) plus the nodes dropped for their state. Any
/// malformed line fails the whole parse: a partially-parsed inventory
/// would understate capacity.
pub fn parse_inventory(raw: &str) -> Result<(Vec<NodeRecord>, Vec<UnavailableNode>)> {
    let mut rows = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        rows.push(parse_row(index + 1, line)?);
    }
    rows.sort_by(|a, b| a.node.cmp(&b.node));

    let mut nodes: Vec<NodeRecord> = Vec::new();
    let mut unavailable: Vec<UnavailableNode> = Vec::new();
    for row in rows {
        if let Some(existing) = nodes.iter_mut().find(|n| n.name == row.node) {
            existing.partitions.insert(row.partition);
            continue;
        }
        if unavailable.iter().any(|u| u.name == row.node) {
            continue;
        }
        if is_unavailable(&row.state) {
            unavailable.push(UnavailableNode {
                name: row.node,
                gres: row.gres,
                state: row.state,
            });
            continue;
        }
        let gpus = gres::gpu_count(&row.gres)
            .ok_or_else(|| Error::format(QUERY, row.lineno, &row.gres, "malformed GRES spec"))?;
        let mut partitions = BTreeSet::new();
        partitions.insert(row.partition);
        nodes.push(NodeRecord {
            name: row.node,
            cpus: row.cpus,
            memory_gib: row.memory_mb as f64 / 1024.0,
            gpus,
            gpu_types: Vec::new(),
            partitions,
            weight: None,
        });
    }

    Ok((nodes, unavailable))
}

fn parse_row(lineno: usize, line: &str) -> Result<InventoryRow> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != 6 {
        return Err(Error::format(
            QUERY,
            lineno,
            line,
            format!("expected 6 fields, got {}", fields.len()),
        ));
    }
    let cpus = fields[1]
        .trim()
        .parse::<u32>()
        .map_err(|_| Error::format(QUERY, lineno, line, "CPU count is not an integer"))?;
    let memory_mb = fields[2]
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::format(QUERY, lineno, line, "memory is not an integer"))?;
    Ok(InventoryRow {
        lineno,
        node: fields[0].trim().to_string(),
        cpus,
        memory_mb,
        gres: fields[3].trim().to_string(),
        state: fields[4].trim().to_string(),
        partition: fields[5].trim().to_string(),
    })
}

fn is_unavailable(state: &str) -> bool {
    UNAVAILABLE_PREFIXES
        .iter()
        .any(|prefix| state.starts_with(prefix))
}
