// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

mod error;
mod exec;
mod gres;
mod inventory;
mod report;
mod usage;

use usage::UsageSource;

#[derive(Parser, Debug)]
#[command(name = "sfree")]
#[command(about = "Report free resources (GPUs, CPUs, memory) per cluster node")]
#[command(version)]
struct Args {
    /// Scheduler view to read job usage from
    #[arg(long, value_enum, default_value = "live")]
    source: UsageSource,

    /// gres.conf-style file mapping nodes to GPU model labels
    #[arg(long, default_value = "/etc/slurm/gres.conf")]
    gres_conf: PathBuf,

    /// Node config file carrying scheduling weights
    #[arg(long, default_value = "/etc/slurm/local_nodenames.conf")]
    weights_conf: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(std::io::stderr)
        .init();

    let (nodes, unavailable) = inventory::collect(&args.gres_conf, &args.weights_conf)
        .context("querying node inventory")?;

    // The zero-memory floor needs the cluster minimum, so inventory comes first.
    let min_memory = inventory::min_memory_gib(&nodes);
    let used = args
        .source
        .collect(min_memory)
        .context("querying job usage")?;

    if !unavailable.is_empty() {
        print!("{}", report::render_unavailable(&unavailable));
        println!();
    }

    println!("Free resources");
    let rows = report::reconcile(&nodes, &used);
    print!("{}", report::render_table(&rows));

    Ok(())
}
