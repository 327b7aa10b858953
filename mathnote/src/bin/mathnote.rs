//! Command-line interface for mathnote.
//!
//! `mathnote parse` parses an equation (with optional user functions,
//! constants and a domain) and prints the tree, its value and its free
//! variables. `mathnote tokens` prints the token stream, and
//! `mathnote catalog` lists the builtin functions and constants.

use anyhow::{Context, bail};
use clap::{Args as ClapArgs, Parser as ClapParser, Subcommand};
use mathnote::{Catalog, Limits, MathError, Notation, Problem, tokenize, with_timeout};
use std::time::Duration;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Command
    #[command(subcommand)]
    command: Commands,

    /// Abandon the run after this many seconds
    #[arg(long, global = true)]
    timeout: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parses and evaluates an equation
    Parse {
        /// Equation, inequality, interval or expression
        equation: String,

        #[command(flatten)]
        options: ParseOptions,
    },
    /// Prints the token stream
    Tokens {
        /// Text to tokenize
        text: String,
    },
    /// Lists the builtin functions and constants
    Catalog,
}

#[derive(ClapArgs, Debug)]
struct ParseOptions {
    /// Domain, e.g. "R|[0, 1]"
    #[arg(long)]
    domain: Option<String>,

    /// Function definition, e.g. "f(x) = x^2" (repeatable)
    #[arg(long = "function")]
    functions: Vec<String>,

    /// Named constant as NAME=VALUE (repeatable)
    #[arg(long = "constant", value_parser = parse_constant)]
    constants: Vec<(String, f64)>,

    /// Multi-letter name that is not split into letters (repeatable)
    #[arg(long = "symbol")]
    symbols: Vec<String>,

    #[arg(long, default_value_t = f64::INFINITY)]
    max_number: f64,

    #[arg(long, default_value_t = f64::INFINITY)]
    max_exponent: f64,

    #[arg(long, default_value_t = f64::INFINITY)]
    max_factorial: f64,
}

fn parse_constant(arg: &str) -> Result<(String, f64), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {arg:?}"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad value for {name}: {e}"))?;
    Ok((name.trim().to_string(), value))
}

fn run_parse(equation: String, options: ParseOptions) -> Result<(), MathError> {
    let problem = Problem {
        equation,
        domain: options.domain,
        functions: options.functions,
        constants: options.constants,
        limits: Limits {
            max_number: options.max_number,
            max_exponent: options.max_exponent,
            max_factorial: options.max_factorial,
        },
    };
    let notation = options
        .symbols
        .iter()
        .try_fold(problem.notation()?, |n, s| Ok::<_, MathError>(n.with_symbol(s)))?;
    let parsed = notation.parse(&problem.equation)?;
    println!("ast:       {}", parsed.root);
    println!("value:     {}", parsed.evaluate()?);
    println!("variables: {}", parsed.free_symbols().join(", "));
    if let Some(latex) = parsed.root.to_latex() {
        println!("latex:     {latex}");
    }
    if let Some(domain) = &problem.domain {
        let domain = notation.parse_domain(domain)?;
        println!("domain:    {}", domain.evaluate()?);
    }
    Ok(())
}

fn run_tokens(text: &str) -> Result<(), MathError> {
    for token in tokenize(text) {
        let token = token?;
        println!(
            "{:>6}  {:<10} {:?}",
            token.position().to_string(),
            token.kind(),
            token.lexeme.as_str()
        );
    }
    Ok(())
}

fn catalog_lines(catalog: &Catalog) -> Vec<String> {
    let functions: Vec<&str> = catalog.functions().map(|f| f.name()).collect();
    let mut lines = vec![format!("functions: {}", functions.join(", "))];
    lines.extend(
        catalog
            .constants()
            .map(|(name, value)| format!("constant:  {name} = {value}")),
    );
    lines
}

fn run_catalog() -> Result<(), MathError> {
    for line in catalog_lines(Notation::new().catalog()) {
        println!("{line}");
    }
    Ok(())
}

fn timeout_duration(secs: f64) -> anyhow::Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        Ok(_) => bail!("invalid timeout {secs}: must be positive"),
        Err(e) => bail!("invalid timeout {secs}: {e}"),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let job = move || match args.command {
        Commands::Parse { equation, options } => run_parse(equation, options),
        Commands::Tokens { text } => run_tokens(&text),
        Commands::Catalog => run_catalog(),
    };
    let result = match args.timeout {
        Some(secs) => with_timeout(timeout_duration(secs)?, job),
        None => job(),
    };
    result.context("mathnote failed")
}
