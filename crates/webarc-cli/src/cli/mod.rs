//! CLI for the webarc page archiver.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use webarc_core::config;

use commands::{run_archive, run_info, run_render};

/// Top-level CLI for the webarc page archiver.
#[derive(Debug, Parser)]
#[command(name = "webarc")]
#[command(about = "webarc: archive web pages for offline single-file rendering", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Archive a page: snapshot its HTML, download its assets, write a template.
    Archive {
        /// Page URL to archive.
        url: String,

        /// Archive directory (created if missing).
        #[arg(long, default_value = "archive", value_name = "DIR")]
        dir: PathBuf,
    },

    /// Render an archived page into one self-contained HTML file.
    Render {
        /// Page URL that was archived.
        url: String,

        /// Output HTML file.
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,

        /// Archive directory holding the template and assets.
        #[arg(long, default_value = "archive", value_name = "DIR")]
        dir: PathBuf,
    },

    /// List the assets recorded in an archive directory.
    Info {
        /// Archive directory.
        #[arg(default_value = "archive", value_name = "DIR")]
        dir: PathBuf,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Archive { url, dir } => run_archive(&cfg, &url, &dir)?,
            CliCommand::Render { url, out, dir } => run_render(&url, &out, &dir)?,
            CliCommand::Info { dir } => run_info(&dir)?,
        }

        Ok(())
    }
}
