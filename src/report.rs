// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Reconcile inventory with usage and render the fixed-width report.

use crate::inventory::{NodeRecord, UnavailableNode};
use crate::usage::UsageMap;

/// Free resources on one node, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeRow {
    pub node: String,
    pub gpus: u64,
    pub cpus: u64,
    pub memory_gib: u64,
    pub gpu_types: String,
    pub partitions: String,
}

/// Compute one free-resource row per available node, in inventory order.
///
/// Every NodeRecord appears, whether or not any job runs on it; a node
/// absent from the usage map consumes nothing. Each dimension clamps to
/// zero after rounding, so an over-committed node reports 0, never a
/// negative figure.
pub fn reconcile(nodes: &[NodeRecord], usage: &UsageMap) -> Vec<FreeRow> {
    nodes
        .iter()
        .map(|node| {
            let used = usage.get(&node.name).copied().unwrap_or_default();
            FreeRow {
                node: node.name.clone(),
                gpus: free(node.gpus as f64, used.gpus as f64),
                cpus: free(node.cpus as f64, used.cpus as f64),
                memory_gib: free(node.memory_gib, used.memory_gib),
                gpu_types: node.gpu_types.join(","),
                partitions: node
                    .partitions
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        })
        .collect()
}

fn free(inventory: f64, used: f64) -> u64 {
    let rounded = (inventory - used).round();
    if rounded < 0.0 {
        0
    } else {
        rounded as u64
    }
}

/// Render the report table, header row first.
pub fn render_table(rows: &[FreeRow]) -> String {
    let mut out = String::new();
    out.push_str(&format_row(
        "node",
        "GPUs",
        "CPUs",
        "Memory",
        "GPU Type",
        "Partitions",
    ));
    for row in rows {
        out.push_str(&format_row(
            &row.node,
            &row.gpus.to_string(),
            &row.cpus.to_string(),
            &row.memory_gib.to_string(),
            &row.gpu_types,
            &row.partitions,
        ));
    }
    out
}

fn format_row(
    node: &str,
    gpus: &str,
    cpus: &str,
    memory: &str,
    gpu_types: &str,
    partitions: &str,
) -> String {
    format!("{node:<12}{gpus:>8}{cpus:>8}{memory:>8}{gpu_types:>15}{partitions:>22}\n")
}

/// Render the diagnostic block for nodes excluded by their state.
pub fn render_unavailable(nodes: &[UnavailableNode]) -> String {
    let mut out = String::from("down/drain/fail:\n");
    for node in nodes {
        out.push_str(&format!(
            "{:<12}{:>15}{:>10}\n",
            node.name, node.gres, node.state
        ));
    }
    out
}
