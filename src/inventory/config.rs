// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Enrichment from node-attribute config files: GPU model labels and
//! scheduling weights.
//!
//! Both attributes are cosmetic, so an unreadable file degrades to the
//! defaults (empty label list, unset weight) instead of aborting the run.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::{Error, Result};

use super::types::NodeRecord;

/// Apply GPU model labels from a gres.conf-style file.
pub fn apply_gpu_types(nodes: &mut [NodeRecord], path: &Path) {
    match read(path) {
        Ok(content) => apply_gpu_type_lines(nodes, &content),
        Err(err) => warn!("GPU type labels unavailable: {err}"),
    }
}

/// Apply scheduling weights from a node-name config file.
pub fn apply_weights(nodes: &mut [NodeRecord], path: &Path) {
    match read(path) {
        Ok(content) => apply_weight_lines(nodes, &content),
        Err(err) => warn!("node weights unavailable: {err}"),
    }
}

/// Lines carrying `NodeName=`, `Name=gpu` and `Type=` tokens append one
/// label per line to the named node. Comment and non-matching lines are
/// ignored.
pub(crate) fn apply_gpu_type_lines(nodes: &mut [NodeRecord], content: &str) {
    for line in content.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        if token(line, "Name") != Some("gpu") {
            continue;
        }
        let (Some(name), Some(gpu_type)) = (token(line, "NodeName"), token(line, "Type")) else {
            continue;
        };
        if let Some(node) = nodes.iter_mut().find(|n| n.name == name) {
            node.gpu_types.push(gpu_type.to_string());
        }
    }
}

/// Lines carrying `NodeName=` and an integer `Weight=` token set the
/// named node's weight. Comment and non-matching lines are ignored.
pub(crate) fn apply_weight_lines(nodes: &mut [NodeRecord], content: &str) {
    for line in content.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        let (Some(name), Some(weight)) = (token(line, "NodeName"), token(line, "Weight")) else {
            continue;
        };
        let Ok(weight) = weight.parse::<i64>() else {
            continue;
        };
        if let Some(node) = nodes.iter_mut().find(|n| n.name == name) {
            node.weight = Some(weight);
        }
    }
}

/// Find the value of a `Key=value` token on a whitespace-separated line.
fn token<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.split_whitespace().find_map(|part| {
        let (k, v) = part.split_once('=')?;
        (k == key).then_some(v)
    })
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
