// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Per-node resource usage from one of two scheduler views.
//!
//! The live queue and the historical accounting database report the same
//! thing in different columns and units; both variants reduce to the same
//! per-node usage map.

pub mod parser;
pub mod types;

use clap::ValueEnum;

use crate::error::Result;
use crate::exec;

pub use types::{Usage, UsageMap};

/// Which scheduler view supplies the usage side of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UsageSource {
    /// Running jobs as reported by squeue.
    Live,
    /// Accounted jobs as reported by sacct, minus runaway entries.
    Accounting,
}

impl UsageSource {
    /// Query the selected view and aggregate per-node usage totals.
    ///
    /// `min_memory_gib` is the smallest node memory capacity of the run;
    /// jobs that report zero memory are floored to it, so the inventory
    /// must be collected first.
    pub fn collect(self, min_memory_gib: f64) -> Result<UsageMap> {
        match self {
            UsageSource::Live => {
                let output = exec::run(
                    "squeue",
                    &[
                        "--noheader",
                        "--states=running",
                        "--noconvert",
                        "-o",
                        "%N|%b|%m|%c",
                    ],
                )?;
                parser::parse_live(&output.stdout, min_memory_gib)
            }
            UsageSource::Accounting => {
                let output = exec::run(
                    "sacct",
                    &[
                        "--noheader",
                        "--parsable2",
                        "--allusers",
                        "--state=RUNNING",
                        "--format=JobID,NodeList,AllocCPUS,AllocGRES,ReqMem",
                    ],
                )?;
                let runaway = exec::run("sacctmgr", &["show", "-nP", "runawayjobs", "format=id"])?;
                let runaway = parser::parse_runaway(&runaway.stdout);
                parser::parse_accounting(&output.stdout, &runaway, min_memory_gib)
            }
        }
    }
}
