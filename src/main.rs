// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use clap::Parser;
use tracing::error;

use itemwatch::driver::{self, DriverOptions};

/// CRUD and watch demonstration against the Item custom resource
#[derive(Parser)]
#[clap(name = "itemwatch", version)]
struct Args {
    /// Path to a kubeconfig file, defaults to $KUBECONFIG
    #[clap(short = 'f', value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Keep running after the CRUD calls and log watch events until interrupted
    #[clap(long)]
    watch: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let options = DriverOptions {
        kubeconfig: args.kubeconfig,
        watch: args.watch,
    };

    if let Err(error) = driver::run(options).await {
        error!("Fatal: {}", error);
        std::process::exit(1);
    }
}
