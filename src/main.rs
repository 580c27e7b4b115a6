use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{error::ErrorKind, Parser, ValueEnum};
use tapevm::{
    load_source, BoundsPolicy, Cell, Compiler, Config, EofBehavior, Error, OptLevel, Program, Vm,
};
use tracing::debug;

/// Optimizing interpreter for the eight-command tape language
#[derive(Parser, Debug)]
#[command(name = "tapevm")]
#[command(about = "Compile and run a tape program", long_about = None)]
struct Args {
    /// Program file to run
    source: PathBuf,

    /// Initial number of cells on the tape
    #[arg(long, default_value_t = 30000, allow_negative_numbers = true)]
    tape_len: i64,

    /// What to do when the pointer leaves the tape: unchecked, extend, abort, wrap or block
    #[arg(long, default_value = "abort")]
    bounds: BoundsPolicy,

    /// Value stored on end of input (the cell is left unchanged if not set)
    #[arg(long, allow_negative_numbers = true)]
    eof: Option<i32>,

    /// Width of a cell in bits
    #[arg(long, value_enum, default_value = "8")]
    cell_bits: CellBits,

    /// Optimization level, 0 to 3
    #[arg(long, default_value = "3")]
    opt_level: OptLevel,

    /// Output buffer size in bytes
    #[arg(long, default_value_t = tapevm::config::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Print the compiled bytecode instead of running it
    #[arg(long)]
    dump: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CellBits {
    #[value(name = "8")]
    Eight,
    #[value(name = "16")]
    Sixteen,
    #[value(name = "32")]
    ThirtyTwo,
}

impl Args {
    fn config(&self) -> Result<Config, Error> {
        let tape_len = usize::try_from(self.tape_len)
            .ok()
            .filter(|&len| len > 0)
            .ok_or(Error::ArrayConfig)?;

        Ok(Config {
            tape_len,
            bounds: self.bounds,
            eof: self.eof.map_or(EofBehavior::Unchanged, EofBehavior::Set),
            chunk_size: self.chunk_size,
            opt_level: self.opt_level,
        })
    }
}

fn main() -> ExitCode {
    init_logging();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<clap::Error>() {
                // Already carries its own prefix and usage line
                Some(err) => eprint!("{}", err.render()),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    // TAPEVM_LOG or RUST_LOG control the level, warnings only by default
    let filter = EnvFilter::try_from_env("TAPEVM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run() -> anyhow::Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        // --help and --version
        Err(err) if !err.use_stderr() => err.exit(),
        // A missing or extra program file
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::MissingRequiredArgument | ErrorKind::UnknownArgument
            ) =>
        {
            return Err(Error::Usage(err.kind().to_string()).into())
        }
        Err(err) => return Err(err.into()),
    };

    let config = args.config()?;
    let source = load_source(&args.source)?;
    debug!(path = %args.source.display(), bytes = source.len(), "loaded source");

    let program = Compiler::new(config.opt_level).compile(&source)?;

    if args.dump {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{program}")?;
        stdout.flush()?;
        return Ok(());
    }

    match args.cell_bits {
        CellBits::Eight => run_program::<u8>(&program, &config)?,
        CellBits::Sixteen => run_program::<u16>(&program, &config)?,
        CellBits::ThirtyTwo => run_program::<u32>(&program, &config)?,
    }

    Ok(())
}

fn run_program<C: Cell>(program: &Program, config: &Config) -> tapevm::Result<()> {
    let mut vm = Vm::<C, _, _>::new(program, config, io::stdin().lock(), io::stdout().lock())?;
    vm.run()
}
