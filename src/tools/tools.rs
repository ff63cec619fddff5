use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use reach6502::bank::Bank;
use reach6502::database::script::{apply_script, save_script};
use reach6502::database::Database;
use reach6502::interrupt::{self, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR};
use reach6502::plugin::{self, Plugin};
use reach6502::plugins::{all_ops::AllOps, cdl_fceux::CdlFceux, nes::Nes, nes_mapper0::NesMapper0, nes_minimal::NesMinimal};
use reach6502::{analyzer, format, perm::Permissions};

/// Static reachability disassembler for the MOS 6502.
#[derive(Clone, Debug, Parser)]
struct Args {
    #[command(subcommand)]
    operation: Operation,
}

#[derive(Clone, Debug, Subcommand)]
enum Operation {
    /// Classify a binary image as CODE/NOTCODE and print an annotation script.
    Analyze(AnalyzeArgs),
    /// Render a binary image (and optional annotation script) as text.
    Disassemble(DisassembleArgs),
}

#[derive(Clone, Debug, Parser)]
struct AnalyzeArgs {
    /// raw binary image to analyze
    #[arg(short, long)]
    input: PathBuf,
    /// origin address the image is loaded at
    #[arg(long, value_parser = parse_addr16)]
    org: u16,
    /// NMI handler address, or "auto" to read the 0xFFFA vector
    #[arg(long)]
    nmi: Option<VectorArg>,
    /// RESET handler address, or "auto" to read the 0xFFFC vector
    #[arg(long)]
    reset: Option<VectorArg>,
    /// IRQ/BRK handler address, or "auto" to read the 0xFFFE vector
    #[arg(long)]
    irq: Option<VectorArg>,
    /// pre-existing annotation script to seed the database with
    #[arg(long)]
    db: Option<PathBuf>,
    /// a built-in plug-in to run, in the order given (e.g. "nes" or "cdl_fceux:trace.cdl,0,1")
    #[arg(long = "plugin")]
    plugins: Vec<String>,
}

#[derive(Clone, Debug, Parser)]
struct DisassembleArgs {
    /// raw binary image to render
    #[arg(short, long)]
    input: PathBuf,
    /// origin address the image is loaded at
    #[arg(long, value_parser = parse_addr16)]
    org: u16,
    /// pre-existing annotation script to seed the database with
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug)]
enum VectorArg {
    Auto,
    Addr(u16),
}

impl std::str::FromStr for VectorArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(VectorArg::Auto)
        } else {
            parse_addr16(s).map(VectorArg::Addr)
        }
    }
}

fn parse_addr16(s: &str) -> Result<u16, String> {
    let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())?
    } else {
        s.parse::<u32>().map_err(|e| e.to_string())?
    };
    u16::try_from(value).map_err(|_| format!("address out of range: {s}"))
}

fn resolve_vector(arg: Option<VectorArg>, bank: &Bank, vector_addr: u16) -> Result<Option<u16>> {
    match arg {
        None => Ok(None),
        Some(VectorArg::Addr(a)) => Ok(Some(a)),
        Some(VectorArg::Auto) => interrupt::fetch_vector(bank, vector_addr)
            .map(Some)
            .map_err(|e| anyhow!(e)),
    }
}

fn build_plugin(spec: &str, bank_len: usize) -> Result<Box<dyn Plugin>> {
    let mut parts = spec.splitn(2, ':');
    let name = parts.next().unwrap();
    let rest = parts.next();
    match name {
        "all_ops" => Ok(Box::new(AllOps)),
        "nes" => Ok(Box::new(Nes)),
        "nes_minimal" => Ok(Box::new(NesMinimal)),
        "nes_mapper0" => Ok(Box::new(NesMapper0)),
        "cdl_fceux" => {
            let rest = rest.ok_or_else(|| {
                anyhow!("cdl_fceux plugin needs PATH[,OFFSET][,AGGRESSIVE]")
            })?;
            let mut fields = rest.split(',');
            let path = fields.next().unwrap();
            let offset: usize = fields
                .next()
                .map(|s| s.parse())
                .transpose()
                .context("cdl_fceux offset")?
                .unwrap_or(0);
            let aggressive = fields.next().map(|s| s == "1").unwrap_or(false);
            let data = std::fs::read(path).with_context(|| format!("reading {path}"))?;
            let end = offset
                .checked_add(bank_len)
                .ok_or_else(|| anyhow!("cdl_fceux: offset overflow"))?;
            let slice = data
                .get(offset..end)
                .ok_or_else(|| anyhow!("cdl_fceux: log too short for bank"))?
                .to_vec();
            Ok(Box::new(CdlFceux::new(slice, aggressive)))
        }
        other => Err(anyhow!("unknown plugin: {other}")),
    }
}

fn load_or_new_db(path: Option<&PathBuf>, org: u16) -> Result<Database> {
    match path {
        None => Ok(Database::new(org)),
        Some(path) => {
            let mut db = Database::new(0);
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            apply_script(&mut db, &text).map_err(|e| anyhow!(e))?;
            db.set_org(org);
            Ok(db)
        }
    }
}

fn analyze(args: &AnalyzeArgs) -> Result<()> {
    let body = std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let bank = Bank::new(body, args.org).map_err(|e| anyhow!(e))?;
    let mut db = load_or_new_db(args.db.as_ref(), args.org)?;

    interrupt::mark_default_vector_types(&mut db);

    let nmi = resolve_vector(args.nmi, &bank, NMI_VECTOR)?;
    let reset = resolve_vector(args.reset, &bank, RESET_VECTOR)?;
    let irq = resolve_vector(args.irq, &bank, IRQ_VECTOR)?;
    if let Some(addr) = nmi {
        interrupt::register_interrupt(&mut db, &bank, "NMI", addr).map_err(|e| anyhow!(e))?;
    }
    if let Some(addr) = reset {
        interrupt::register_interrupt(&mut db, &bank, "RESET", addr).map_err(|e| anyhow!(e))?;
    }
    if let Some(addr) = irq {
        interrupt::register_interrupt(&mut db, &bank, "IRQ", addr).map_err(|e| anyhow!(e))?;
    }

    let mut ops_valid = plugin::default_ops_valid();
    let plugins = args
        .plugins
        .iter()
        .map(|spec| build_plugin(spec, bank.len()))
        .collect::<Result<Vec<_>>>()?;
    for p in &plugins {
        plugin::run_plugin(p.as_ref(), &bank, &mut db, &mut ops_valid)?;
    }
    let mut perms = Permissions::new();
    for p in &plugins {
        plugin::run_plugin_perms(p.as_ref(), &bank, &db, &mut perms)?;
    }

    analyzer::analyze(&mut db, &bank, &ops_valid, &perms, irq);

    println!("{}", save_script(&db));
    Ok(())
}

fn disassemble(args: &DisassembleArgs) -> Result<()> {
    let body = std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let bank = Bank::new(body, args.org).map_err(|e| anyhow!(e))?;
    let db = load_or_new_db(args.db.as_ref(), args.org)?;
    print!("{}", format::disassemble(&db, &bank));
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    match &args.operation {
        Operation::Analyze(analyze_args) => analyze(analyze_args),
        Operation::Disassemble(disassemble_args) => disassemble(disassemble_args),
    }
}
