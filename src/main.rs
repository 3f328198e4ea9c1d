use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::process::ExitCode;

use rex::syntax::{DEFAULT_ARENA_CAPACITY, MAX_CODEPOINT, parse_charset};
use rex::{CompileOptions, Compiler, Program, Vm, assemble, compile::charset_ranges};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match a pattern against each INPUT, or each line of stdin
    Match {
        /// Pattern to compile
        pattern: String,

        /// Inputs to match
        inputs: Vec<String>,

        #[command(flatten)]
        options: CompileArgs,
    },

    /// Print the compiled program
    Dump {
        /// Pattern to compile
        pattern: String,

        /// Also print each instruction word in hex
        #[arg(short = 'w', long)]
        words: bool,

        #[command(flatten)]
        options: CompileArgs,
    },

    /// Assemble mnemonic text into little-endian instruction words
    Asm {
        /// Source file, stdin if omitted
        #[arg(value_name = "FILE")]
        file: Option<String>,
    },

    /// Print the codepoint ranges of a single charset atom
    Charset {
        /// Charset, e.g. `[^a-z\d]`
        charset: String,
    },
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Parser arena size in cells
    #[arg(long, value_name = "CELLS", default_value_t = DEFAULT_ARENA_CAPACITY)]
    arena: usize,

    /// Highest codepoint a class may match
    #[arg(long, value_name = "CODEPOINT", default_value_t = MAX_CODEPOINT)]
    ceiling: u32,
}

impl CompileArgs {
    fn compile(&self, pattern: &str) -> Result<Program> {
        let options = CompileOptions::default()
            .arena_capacity(self.arena)
            .ceiling(self.ceiling);
        Compiler::new(options)
            .compile(pattern.as_bytes())
            .with_context(|| format!("Failed to compile \"{pattern}\""))
    }
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Match {
            pattern,
            inputs,
            options,
        } => run_match(&options.compile(&pattern)?, inputs),
        Command::Dump {
            pattern,
            words,
            options,
        } => {
            let program = options.compile(&pattern)?;
            if words {
                for (pc, inst) in program.iter().enumerate() {
                    println!("{pc:>4}: {:08x}  {inst}", inst.word());
                }
            } else {
                print!("{program}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Asm { file } => {
            let text = match file {
                Some(path) => fs::read_to_string(&path).with_context(|| format!("Failed to read {path}"))?,
                None => {
                    let mut text = String::new();
                    io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
                    text
                }
            };
            let program = Program::new(assemble(&text)?);
            io::stdout().write_all(&program.to_le_bytes())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Charset { charset } => {
            let Some((parsed, len)) = parse_charset(charset.as_bytes()) else {
                bail!("Not a charset: \"{charset}\"");
            };
            if len != charset.len() {
                bail!("Unexpected text after charset: \"{}\"", &charset[len..]);
            }
            for range in charset_ranges(parsed, MAX_CODEPOINT) {
                if range.lo == range.hi {
                    println!("{:#08x}", range.lo);
                } else {
                    println!("{:#08x}-{:#08x}", range.lo, range.hi);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_match(program: &Program, inputs: Vec<String>) -> Result<ExitCode> {
    let inputs = if inputs.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .context("Failed to read stdin")?
    } else {
        inputs
    };

    let mut vm = Vm::for_program(program, 1);
    let mut failed = false;
    for input in &inputs {
        let mut captures = [None];
        if vm.exec(program, input.as_bytes(), &mut captures)?
            && let Some(span) = captures[0]
        {
            println!("\"{input}\" : MATCH ({}, {})", span.start, span.len);
        } else {
            println!("\"{input}\" : NO MATCH");
            failed = true;
        }
    }
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
