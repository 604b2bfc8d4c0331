//! Pipelined MIPS-variant simulator CLI.
//!
//! Runs an assembly program against a data file and writes per-instruction
//! stage timings plus cache statistics to the output file. Invoked with no
//! arguments it falls back to the classic interactive prompt
//! (`inst.txt, data.txt, out.txt[, -p]`).

use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use mipsim_core::sim::loader;
use mipsim_core::{Config, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "mipsim",
    author,
    version,
    about = "Cycle-accurate six-stage pipelined MIPS-variant simulator",
    long_about = "Simulates ADD, SUB, AND, OR, MULT, ADDI, SUBI, ANDI, ORI, MULTI, J, BNE, BEQ, \
                  LW, SW, LI and HLT over a six-stage in-order pipeline with split direct-mapped \
                  caches.\n\nEvery program must end with HLT. Labels are supported. Data files \
                  hold one base-2 word per line.\n\nThe output file gains one line per retired \
                  instruction listing the clock tick at which it left IF, ID, EX, MEM and WB \
                  (branches and jumps list IF and ID only), followed by the cache statistics."
)]
struct Cli {
    /// Instruction (assembly) file.
    inst: Option<PathBuf>,

    /// Data file (one base-2 word per line).
    data: Option<PathBuf>,

    /// Output file; timing lines are appended.
    out: Option<PathBuf>,

    /// Print the pipeline occupancy line every tick.
    #[arg(short = 'p', long = "pipeline")]
    pipeline: bool,

    /// Print the register file after the run.
    #[arg(long)]
    dump_regs: bool,

    /// Emit per-stage diagnostics to stderr.
    #[arg(long)]
    trace: bool,

    /// JSON configuration file overriding the machine defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let (inst, data, out, pipeline) = match (&cli.inst, &cli.data, &cli.out) {
        (Some(i), Some(d), Some(o)) => (i.clone(), d.clone(), o.clone(), cli.pipeline),
        (None, None, None) => match prompt() {
            Some(files) => files,
            None => {
                eprintln!("Incorrect format.");
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Provide all of <INST> <DATA> <OUT>, or none for the prompt.");
            process::exit(1);
        }
    };

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(1);
        }
    };
    config.general.dump_pipeline |= pipeline;
    config.general.dump_registers |= cli.dump_regs;
    config.general.trace |= cli.trace;

    if let Err(e) = run(&inst, &data, &out, &config) {
        if e.is_missing_halt() {
            // Recoverable diagnostic: report and terminate cleanly.
            println!("{}", e);
        } else {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

/// The classic interactive entry: one line naming the three files and the
/// optional `-p` flag.
fn prompt() -> Option<(PathBuf, PathBuf, PathBuf, bool)> {
    println!("Enter in: \"instruction file, data file, output file, [-p]\"");
    println!("For example: inst.txt, data.txt, out.txt, -p");
    println!("\"-p\" is optional to show pipeline scheduling instead of clock cycle stages.\n");
    print!(">>> ");
    io::stdout().flush().ok();

    let mut answer = String::new();
    io::stdin().read_line(&mut answer).ok()?;
    let parts: Vec<&str> = answer.trim().split(',').map(str::trim).collect();
    match parts.as_slice() {
        &[inst, data, out] => Some((inst.into(), data.into(), out.into(), false)),
        &[inst, data, out, flag] => Some((inst.into(), data.into(), out.into(), flag == "-p")),
        _ => None,
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, String> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

fn run(
    inst: &Path,
    data: &Path,
    out: &Path,
    config: &Config,
) -> Result<(), mipsim_core::common::error::SimError> {
    let program = loader::load_program(inst, data)?;

    let sink = OpenOptions::new().create(true).append(true).open(out)?;
    let mut sim = Simulator::new(&program, config, Box::new(BufWriter::new(sink)))?;
    sim.run()?;

    if config.general.dump_registers {
        sim.cpu.dump_regs();
    }
    Ok(())
}
