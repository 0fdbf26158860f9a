use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use treelox::ast_printer::Ast;
use treelox::error::Diagnostics;
use treelox::interpreter::Interpreter;
use treelox::parser::Parser;
use treelox::resolver::Resolver;
use treelox::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Dump the token list as JSON instead of one token per line
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program, or starts a REPL when no
    /// file is given
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file into a String.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let source = std::fs::read_to_string(filename)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Write to file with module path and source line.
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("treelox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));

            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");

    Ok(())
}

/// Run one source string through the full pipeline.  Any scan, parse, or
/// resolution error suppresses execution.
fn run(source: &str, interpreter: &mut Interpreter, diagnostics: &mut Diagnostics) {
    let tokens = Scanner::new(source).scan_tokens(diagnostics);
    let statements = Parser::new(tokens, interpreter.expr_ids(), diagnostics).parse();

    if diagnostics.had_error() {
        return;
    }

    Resolver::new(interpreter, diagnostics).resolve(&statements);

    if diagnostics.had_error() {
        return;
    }

    interpreter.interpret(&statements, diagnostics);
}

/// Render every collected error to stderr.
fn render_errors(diagnostics: &Diagnostics) {
    for error in diagnostics.errors() {
        eprintln!("{}", error);
    }
}

fn run_file(filename: &PathBuf) -> Result<()> {
    let source = read_file(filename)?;

    let mut interpreter = Interpreter::new();
    let mut diagnostics = Diagnostics::new();

    run(&source, &mut interpreter, &mut diagnostics);
    render_errors(&diagnostics);

    if diagnostics.had_error() {
        std::process::exit(65);
    }

    if diagnostics.had_runtime_error() {
        std::process::exit(70);
    }

    Ok(())
}

fn run_prompt() -> Result<()> {
    info!("Starting REPL");

    let mut interpreter = Interpreter::new();
    let mut diagnostics = Diagnostics::new();

    let stdin = io::stdin();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        run(&line, &mut interpreter, &mut diagnostics);
        render_errors(&diagnostics);

        // One bad line must not poison the next.
        diagnostics.reset();
    }

    Ok(())
}

fn usage_exit(subcommand: &str) -> ! {
    eprintln!("Usage: treelox {} <filename>", subcommand);
    std::process::exit(64);
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        // Minimal logger to avoid "no logger" errors.
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            let Some(filename) = filename else {
                usage_exit("tokenize");
            };

            info!("Running Tokenize subcommand");

            let source = read_file(&filename)?;
            let mut diagnostics = Diagnostics::new();

            let tokens = Scanner::new(&source).scan_tokens(&mut diagnostics);

            if json {
                let dump = serde_json::to_string_pretty(&tokens)
                    .context("Failed to serialize tokens")?;

                println!("{}", dump);
            } else {
                for token in &tokens {
                    debug!("Scanned token: {}", token);

                    println!("{}", token);
                }
            }

            render_errors(&diagnostics);

            if diagnostics.had_error() {
                debug!("Tokenization failed, exiting with code 65");

                std::process::exit(65);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename } => {
            let Some(filename) = filename else {
                usage_exit("parse");
            };

            info!("Running Parse subcommand");

            let source = read_file(&filename)?;
            let mut diagnostics = Diagnostics::new();
            let mut ids = 0;

            let tokens = Scanner::new(&source).scan_tokens(&mut diagnostics);
            let expression = Parser::new(tokens, &mut ids, &mut diagnostics).parse_expression();

            if let Some(expression) = expression {
                let ast_str = Ast.print(&expression);

                debug!("AST: {}", ast_str);
                println!("{}", ast_str);
            }

            render_errors(&diagnostics);

            if diagnostics.had_error() {
                std::process::exit(65);
            }

            info!("Parse subcommand completed");
        }

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");

                run_file(&filename)?;
            }

            None => run_prompt()?,
        },
    }

    Ok(())
}
