use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pagewalk::{constants, io, Geometry, VmManager};

/// Run a read/write trace through the paged virtual memory simulator.
#[derive(Parser)]
#[command(name = "pagewalk")]
#[command(about = "Hierarchical page-table simulator with demand paging")]
struct Cli {
    /// Trace file: one `r <addr>` or `w <addr> <value>` per line
    trace: PathBuf,

    /// Write read results here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Bits of intra-page offset
    #[arg(long, default_value_t = constants::OFFSET_WIDTH)]
    offset_width: u32,

    /// Total physical address bits
    #[arg(long, default_value_t = constants::PHYSICAL_ADDRESS_WIDTH)]
    physical_width: u32,

    /// Total virtual address bits
    #[arg(long, default_value_t = constants::VIRTUAL_ADDRESS_WIDTH)]
    virtual_width: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let geometry = Geometry::new(cli.offset_width, cli.physical_width, cli.virtual_width)
        .context("invalid memory geometry")?;
    let ops = io::load_trace(&cli.trace)
        .with_context(|| format!("failed to load trace {}", cli.trace.display()))?;

    let mut vm = VmManager::new(geometry);
    let results = io::run_trace(&mut vm, &ops).context("trace execution failed")?;

    match cli.output {
        Some(path) => io::write_results(&path, &results)
            .with_context(|| format!("failed to write results to {}", path.display()))?,
        None => {
            for value in results {
                println!("{value}");
            }
        }
    }
    Ok(())
}
