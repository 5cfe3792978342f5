//! Build automation tasks for SinkState
//!
//! - Generating the CLI reference from the clap definitions

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for SinkState", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<sinkstate_cli::Cli>();

    let content = format!(
        r#"# SinkState CLI Reference

This documentation is generated from the CLI source code. Last updated: {}.

## Overview

`sinkstate` inspects and repairs the `etl_sink_record_state` table that ETL
sinks use to avoid submitting the same record twice. Every record moves
through `ready -> processing -> succeeded | failed`, and failed records can be
put back to `ready`.

## Configuration

| Variable | Default | Purpose |
|----------|---------|---------|
| `DATABASE_URL` | `postgresql://localhost/sinkstate` | State store connection |
| `DATABASE_MAX_CONNECTIONS` | `10` | Pool size |
| `DATABASE_CONNECT_TIMEOUT` | `10` | Acquire timeout in seconds |
| `LOG_LEVEL` | `warn` (`debug` with `--verbose`) | Log verbosity |

## Quick Start

```bash
# Create the state table
sinkstate sync-table

# See what an ETL has done
sinkstate list offline-conversions --state failed

# Inspect one record
sinkstate show offline-conversions "gclid-123||purchase||2024-01-18 10:00:00"

# Let the next run upload failed records again
sinkstate retry offline-conversions "gclid-123||purchase||2024-01-18 10:00:00"
```

## Commands

{}

---

*To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
