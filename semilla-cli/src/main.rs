use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use log::{debug, info};
use semilla_core::{Analysis, CoreError, Diagnostic, Token, analyze, summarize, tokenize};
use walkdir::WalkDir;

/// Lexical, syntactic and semantic analyzer for Semilla sources.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Source file or directory; reads stdin when omitted
    input: Option<PathBuf>,

    #[arg(long, help = "Print every token with its kind and line")]
    tokens: bool,

    #[arg(long, help = "Print token occurrence counts grouped by category")]
    summary: bool,

    #[arg(long, help = "Print the syntax tree outline")]
    ast: bool,

    #[arg(
        long,
        value_name = "EXT",
        default_value = "txt",
        help = "File extension analyzed when INPUT is a directory"
    )]
    ext: String,

    #[arg(short, long, action = ArgAction::Count, help = "Raise log verbosity (-v, -vv, -vvv)")]
    verbose: u8,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    execute(&cli)
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn execute(cli: &Cli) -> Result<ExitCode> {
    let mut clean = true;

    match &cli.input {
        Some(path) if path.is_dir() => {
            let files = collect_sources(path, &cli.ext);
            if files.is_empty() {
                bail!("no .{} files found under {}", cli.ext, path.display());
            }
            info!("analyzing {} files under {}", files.len(), path.display());
            for file in files {
                let source = read_source(&file)?;
                println!("== {} ==", file.display());
                clean &= report(cli, &source)?;
            }
        }
        Some(path) => {
            let source = read_source(path)?;
            clean = report(cli, &source)?;
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read source from stdin")?;
            clean = report(cli, &buffer)?;
        }
    }

    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read input file {}", path.display()))
}

/// Every file under `root` with extension `ext`, in file-name order.
fn collect_sources(root: &Path, ext: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| {
            entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == ext)
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Analyze one source and print the requested sections.
///
/// Returns whether the source came through without diagnostics.
fn report(cli: &Cli, source: &str) -> Result<bool> {
    let mut out = String::new();
    let clean = render(cli, source, &mut out)?;
    print!("{out}");
    Ok(clean)
}

fn render(cli: &Cli, source: &str, out: &mut String) -> Result<bool> {
    if cli.tokens || cli.summary {
        // A fatal lexical error is reported below with the others.
        if let Ok(tokens) = tokenize(source) {
            if cli.tokens {
                render_tokens(&tokens, out)?;
            }
            if cli.summary {
                render_summary(&tokens, out)?;
            }
        }
    }

    let analysis = match analyze(source) {
        Ok(analysis) => analysis,
        Err(err) => {
            debug!("pipeline stopped: {err}");
            let stage = match err {
                CoreError::Lexical(_) => "lexical",
                CoreError::Syntax(_) => "syntax",
            };
            writeln!(out, "{stage} analysis failed")?;
            render_diagnostics(err.diagnostics(), out)?;
            return Ok(false);
        }
    };

    if cli.ast {
        writeln!(out, "ast:")?;
        write!(out, "{}", analysis.program)?;
    }
    render_diagnostics(&analysis.diagnostics, out)?;
    render_symbols(&analysis, out)?;
    render_functions(&analysis, out)?;

    if analysis.is_clean() {
        writeln!(out, "analysis finished without errors")?;
    }
    Ok(analysis.is_clean())
}

fn render_tokens(tokens: &[Token], out: &mut String) -> Result<()> {
    writeln!(out, "tokens:")?;
    writeln!(out, "  {:<6} {:<18} lexeme", "line", "kind")?;
    for token in tokens {
        writeln!(out, "  {:<6} {:<18} {}", token.line, token.kind.describe(), token.lexeme)?;
    }
    Ok(())
}

fn render_summary(tokens: &[Token], out: &mut String) -> Result<()> {
    writeln!(out, "summary:")?;
    writeln!(out, "  {:<20} {:<14} count", "lexeme", "category")?;
    for entry in summarize(tokens) {
        writeln!(out, "  {:<20} {:<14} {}", entry.lexeme, entry.category, entry.count)?;
    }
    Ok(())
}

fn render_diagnostics(diagnostics: &[Diagnostic], out: &mut String) -> Result<()> {
    if diagnostics.is_empty() {
        return Ok(());
    }
    writeln!(out, "diagnostics:")?;
    for diagnostic in diagnostics {
        writeln!(out, "  {diagnostic}")?;
    }
    Ok(())
}

fn render_symbols(analysis: &Analysis, out: &mut String) -> Result<()> {
    let mut entries: Vec<_> = analysis.symbols.entries().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    writeln!(out, "symbols:")?;
    writeln!(out, "  {:<24} {:<10} {:<10} line", "key", "type", "category")?;
    for (key, symbol) in entries {
        writeln!(
            out,
            "  {:<24} {:<10} {:<10} {}",
            key, symbol.ty, symbol.category, symbol.line
        )?;
    }
    Ok(())
}

fn render_functions(analysis: &Analysis, out: &mut String) -> Result<()> {
    if analysis.functions.is_empty() {
        return Ok(());
    }
    writeln!(out, "functions:")?;
    for function in analysis.functions.iter() {
        let params: Vec<String> = function
            .params
            .iter()
            .map(|param| format!("{} {}", param.ty, param.name))
            .collect();
        writeln!(
            out,
            "  {} {}({}) @{}",
            function.return_type,
            function.name,
            params.join(", "),
            function.line
        )?;
    }
    Ok(())
}
