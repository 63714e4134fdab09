use clap::{ArgAction, Parser};
use log::{debug, info};
use rv32im_core::board::{self, Board, BoardError};
use rv32im_core::bus::BusError;
use rv32im_core::core::DEFAULT_RESET_VECTOR;
use rv32im_core::resources::ram::LoadError;
use rv32im_core::simulator::{Halt, SimulationError};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use stderrlog::LogLevelNum;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(version, about = "Instruction-accurate RV32IM simulator", long_about = None)]
struct Args {
    /// Program to execute. A flat binary is loaded at address 0.
    binary: PathBuf,
    /// Load the allocatable sections of an ELF file instead of a flat binary.
    #[arg(long)]
    elf: bool,
    /// Print out memory contents between START and END (exclusive) after the run. May be
    /// repeated.
    #[arg(
        long,
        num_args = 2,
        value_names = ["START", "END"],
        value_parser = parse_u32,
        action = ArgAction::Append,
    )]
    dump: Vec<u32>,
    /// Maximum number of cycles to run before exiting.
    #[arg(long, default_value_t = 100_000, value_parser = parse_u64)]
    cycles: u64,
    /// Memory size in units of 1024 bytes.
    #[arg(long, default_value_t = 16 * 1024, value_parser = parse_u64)]
    memsize: u64,
    /// Address to start executing from. Defaults to 0xc0, or the entry point with `--elf`.
    #[arg(long, value_parser = parse_u32)]
    reset_vector: Option<u32>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Error, Debug)]
enum Error {
    #[error("failed to set up logging: {0}")]
    Logger(#[from] log::SetLoggerError),
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid ELF file: {0}")]
    Elf(#[from] goblin::error::Error),
    #[error("section {name} lies outside the ELF file")]
    TruncatedSection { name: String },
    #[error("section {name} ({size:#x} bytes at {address:#x}) lies outside the 32-bit address space")]
    SectionAddress {
        name: String,
        address: u64,
        size: u64,
    },
    #[error("entry point {entry:#x} lies outside the 32-bit address space")]
    EntryPoint { entry: u64 },
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("failed to load program: {0}")]
    Load(#[from] LoadError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("cannot dump memory from {start:08x} to {end:08x}: {source}")]
    Dump {
        start: u32,
        end: u32,
        source: BusError,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let verbosity = match args.verbose {
        0 => LogLevelNum::Warn,
        1 => LogLevelNum::Info,
        2 => LogLevelNum::Debug,
        _ => LogLevelNum::Trace,
    };
    stderrlog::new()
        .verbosity(verbosity)
        .modules([module_path!(), "rv32im_core"])
        .init()?;

    let program = fs::read(&args.binary).map_err(|source| Error::Read {
        path: args.binary.clone(),
        source,
    })?;

    let config = board::Config {
        ram_size: usize::try_from(args.memsize.saturating_mul(1024)).unwrap_or(usize::MAX),
        ..board::Config::default()
    };
    let mut board = Board::new(config)?;
    let entry = if args.elf {
        Some(load_elf(&mut board, &program)?)
    } else {
        board.load(0, &program)?;
        None
    };
    let reset_vector = args
        .reset_vector
        .or(entry)
        .unwrap_or(DEFAULT_RESET_VECTOR);
    board.set_reset_vector(reset_vector);
    debug!("starting execution at {reset_vector:#010x}");
    let mut simulator = board.into_simulator(io::stdout())?;

    let summary = simulator.run(args.cycles)?;
    match summary.halt {
        Halt::Exited { code } => {
            println!("CPU requested halt. Exit code {code}");
            println!("Ran for {} cycles", summary.steps);
        }
        Halt::StepLimit => info!("stopped after {} cycles without a halt request", summary.steps),
    }

    for range in args.dump.chunks_exact(2) {
        let (start, end) = (range[0], range[1]);
        println!("Dumping memory from {start:08x} to {end:08x}:");
        let dump = simulator
            .dump(start, end)
            .map_err(|source| Error::Dump { start, end, source })?;
        print!("{dump}");
    }

    Ok(())
}

/// Copy all in-memory sections of an ELF file into RAM, returning its entry point.
fn load_elf(board: &mut Board, program_elf: &[u8]) -> Result<u32, Error> {
    let elf = goblin::elf::Elf::parse(program_elf)?;

    let sections = elf
        .section_headers
        .iter()
        .filter(|h| h.is_alloc() && h.sh_type != goblin::elf::section_header::SHT_NOBITS);

    for h in sections {
        let name = elf.shdr_strtab.get_at(h.sh_name).unwrap_or("<unnamed>");
        let address = section_address(name, h.sh_addr, h.sh_size)?;
        debug!(
            "loading section {name} into memory at [{address:#010x}..{:#010x})",
            u64::from(address) + h.sh_size,
        );
        let buf = h
            .file_range()
            .and_then(|range| program_elf.get(range))
            .ok_or_else(|| Error::TruncatedSection {
                name: name.to_owned(),
            })?;
        board.load(address, buf)?;
    }

    u32::try_from(elf.entry).map_err(|_| Error::EntryPoint { entry: elf.entry })
}

/// Returns the load address of a section of `size` bytes at `address`, which must lie entirely
/// within the 32-bit address space.
fn section_address(name: &str, address: u64, size: u64) -> Result<u32, Error> {
    address
        .checked_add(size)
        .filter(|&end| end <= 1 << 32)
        .and_then(|_| u32::try_from(address).ok())
        .ok_or_else(|| Error::SectionAddress {
            name: name.to_owned(),
            address,
            size,
        })
}

/// Parse an unsigned number, accepting a `0x`, `0o`, or `0b` radix prefix.
fn parse_u64(s: &str) -> Result<u64, String> {
    let (digits, radix) = match s.get(..2) {
        Some("0x" | "0X") => (&s[2..], 16),
        Some("0o" | "0O") => (&s[2..], 8),
        Some("0b" | "0B") => (&s[2..], 2),
        _ => (s, 10),
    };
    u64::from_str_radix(&digits.replace('_', ""), radix).map_err(|err| format!("{s:?}: {err}"))
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let value = parse_u64(s)?;
    u32::try_from(value).map_err(|_| format!("{s:?} does not fit in 32 bits"))
}
