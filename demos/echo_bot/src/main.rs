//! Echo Bot Example
//!
//! A small bot showing how plugins exchange capabilities and register
//! handlers on the different muxes:
//!
//! ```text
//! logger       BasicMux "*"         logs every line
//! echo         CommandMux           !echo, !ping
//! karma-store  provides KarmaStore  in-memory scores, optional JSON file
//! karma        requires KarmaStore  name++ / name--, !karma
//! greet        MentionMux, JOIN     "echobot: hi", join greetings
//! version      CtcpMux              VERSION, PING
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot -- --config demos/echo_bot/chime.toml
//! ```

mod plugins;

use std::path::PathBuf;

use anyhow::Result;
use chime::prelude::*;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about = "A small demo bot for the Chime runtime")]
struct Cli {
    /// Configuration file; searched for in the current directory if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. `production`.
    #[arg(short, long)]
    profile: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = ChimeRuntime::builder();
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = cli.profile {
        builder = builder.profile(profile);
    }
    let mut runtime = builder.build()?;

    plugins::register_all(&mut runtime)?;

    runtime.run().await?;

    Ok(())
}
