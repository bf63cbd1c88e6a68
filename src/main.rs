extern crate clap;

use std::{
    collections::HashSet,
    io::{self, BufWriter},
    process::ExitCode,
    time::Instant,
};

use brainblocks::{
    brackets::BracketSide,
    cell::CellWidth,
    codegen::{emit, TextBackend},
    config::{DEFAULT_MAX_NESTING, DEFAULT_TAPE_LENGTH},
    io::StreamIo,
    lexer::render_tokens,
    Config, Error, Program,
};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::LevelFilter;

/// Brainf**k validator/interpreter/lowerer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The file to operate on
    #[arg()]
    file: String,

    #[arg(value_enum)]
    commands: Vec<Commands>,

    /// More output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log every token as it's executed or lowered
    #[arg(short, long)]
    trace: bool,

    #[arg(long, default_value_t = DEFAULT_TAPE_LENGTH)]
    tape_length: usize,

    #[arg(long, value_enum, default_value_t = CellWidth::Eight)]
    cell_width: CellWidth,

    /// Value stored by `,` at end of input (truncated to the cell width)
    #[arg(long, default_value_t = 0)]
    eof_value: u32,

    #[arg(long, default_value_t = DEFAULT_MAX_NESTING)]
    max_nesting: usize,

    /// Give up after this many steps
    #[arg(long)]
    step_limit: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Hash, PartialEq, Eq)]
enum Commands {
    /// Output the tokens
    Tokens,
    /// Output the bracket pairs
    Brackets,
    /// Output the lowered block graph
    Cfg,

    /// Run the tape interpreter
    Interpret,
    /// Lower and run the block graph
    RunCfg,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            tape_length: self.tape_length,
            cell_width: self.cell_width,
            eof_value: self.eof_value,
            trace: self.trace,
            max_nesting: self.max_nesting,
            step_limit: self.step_limit,
        }
    }

    fn level(&self) -> LevelFilter {
        if self.trace {
            return LevelFilter::Trace;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let mut commands: HashSet<Commands> = HashSet::from_iter(args.commands.iter().cloned());
    if commands.is_empty() {
        commands.insert(Commands::Interpret);
    }
    let config = args.config();

    log::info!("Running {}", args.file);
    let text = std::fs::read_to_string(&args.file)?;

    log::info!("{}", "Starting validation".blue());
    let now = Instant::now();
    let program = Program::compile(&text)?;
    log::info!("{} {:.2?}", "Finished validation in".green(), now.elapsed());

    if commands.contains(&Commands::Tokens) {
        println!("{}", render_tokens(program.tokens()));
    }

    if commands.contains(&Commands::Brackets) {
        for (open, close) in program.brackets().pairs() {
            let tokens = program.tokens();
            println!("{} -> {}", tokens[open].position, tokens[close].position);
        }
    }

    if commands.contains(&Commands::Interpret) {
        log::info!("{}", "Starting interpreter".blue());
        let now = Instant::now();
        let mut io = StreamIo::new(io::stdin().lock(), BufWriter::new(io::stdout().lock()));
        let result = brainblocks::interpret(&program, &config, &mut io)?;
        log::info!(
            "{} {} steps in {:.2?}",
            "Finished interpreter with".green(),
            result.steps,
            now.elapsed()
        );
    }

    if commands.contains(&Commands::Cfg) || commands.contains(&Commands::RunCfg) {
        log::info!("{}", "Starting lowering".blue());
        let now = Instant::now();
        let cfg = brainblocks::lower(&program, &config)?;
        log::info!(
            "{} {} blocks in {:.2?}",
            "Finished lowering with".green(),
            cfg.blocks().len(),
            now.elapsed()
        );

        if commands.contains(&Commands::Cfg) {
            print!("{}", emit(&cfg, TextBackend::new()));
        }

        if commands.contains(&Commands::RunCfg) {
            log::info!("{}", "Starting block graph execution".blue());
            let now = Instant::now();
            let mut io = StreamIo::new(io::stdin().lock(), BufWriter::new(io::stdout().lock()));
            let outcome = brainblocks::execute(&cfg, &config, &mut io)?;
            log::info!(
                "{} {} steps in {:.2?}",
                "Finished block graph execution with".green(),
                outcome.steps,
                now.elapsed()
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new().filter_level(args.level()).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{0:}: {1:}", "Error".red(), e);
            if let Error::Bracket(bracket) = &e {
                let hint = match bracket.kind {
                    BracketSide::CloseWithoutOpen => "remove the ']' or add a '[' before it",
                    BracketSide::OpenWithoutClose => "add a ']' after it",
                };
                eprintln!("{0:}: {1:}", "Hint".yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}
