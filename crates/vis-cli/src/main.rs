use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};
use vis_eval::Library;
use vis_interpreter::{
    interpret_with, ErrorFormat, ErrorPolicy, FileError, FileInterpreter, InterpreterOptions, Repl,
};
use vis_parser::DEFAULT_MAX_DEPTH;

/// Vision - an embeddable expression language
#[derive(Parser, Debug)]
#[command(name = "vis", version)]
#[command(about = "Run Vision scripts, expressions and interactive sessions", long_about = None)]
struct Args {
    /// Script to run line by line (starts an interactive session if omitted)
    file: Option<PathBuf>,

    /// Evaluate one expression and print its results
    #[arg(short, long, value_name = "EXPR", conflicts_with = "file")]
    eval: Option<String>,

    /// Keep running a script after a failing line
    #[arg(long)]
    keep_going: bool,

    /// Deepest allowed nesting of brackets, arrays, calls and blocks
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Print errors as JSON
    #[arg(long)]
    json: bool,

    /// Log more (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn options(&self) -> InterpreterOptions {
        InterpreterOptions {
            error_policy: if self.keep_going {
                ErrorPolicy::Continue
            } else {
                ErrorPolicy::Abort
            },
            error_format: if self.json {
                ErrorFormat::Json
            } else {
                ErrorFormat::Text
            },
            max_depth: self.max_depth,
            ..InterpreterOptions::default()
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_expression(expr: &str, options: &InterpreterOptions) -> ExitCode {
    let namespace = Library::new().scope();
    match interpret_with(&namespace, expr, options) {
        Ok(values) => {
            let shown: Vec<String> = values.iter().map(ToString::to_string).collect();
            if !shown.is_empty() {
                println!("{}", shown.join("; "));
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", options.error_format.render(&err));
            ExitCode::FAILURE
        }
    }
}

fn run_file(path: &Path, options: InterpreterOptions) -> ExitCode {
    let format = options.error_format;
    let mut interpreter = match FileInterpreter::open(path) {
        Ok(interpreter) => interpreter.with_options(options),
        Err(err) => {
            eprintln!("{}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };
    match interpreter.interpret_all() {
        Ok(report) if report.is_success() => {
            debug!(lines = report.lines, "script finished");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            if format == ErrorFormat::Json {
                match serde_json::to_string(&report) {
                    Ok(json) => eprintln!("{json}"),
                    Err(err) => eprintln!("could not encode report: {err}"),
                }
            } else {
                for failure in &report.failures {
                    eprintln!("line {}: {}", failure.line, format.render(&failure.error));
                }
            }
            ExitCode::FAILURE
        }
        Err(FileError::Line { line, source }) => {
            eprintln!("line {line}: {}", format.render(&source));
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("{}: {err}", path.display());
            ExitCode::FAILURE
        }
    }
}

fn run_repl(options: InterpreterOptions) -> ExitCode {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut repl = Repl::new(stdin.lock(), stdout.lock()).with_options(options);
    match repl.interpret_all() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("session ended: {err}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    let options = args.options();

    if let Some(expr) = &args.eval {
        return run_expression(expr, &options);
    }
    match &args.file {
        Some(path) => run_file(path, options),
        None => run_repl(options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["vis"]).unwrap();
        assert!(args.file.is_none());
        assert_eq!(args.options(), InterpreterOptions::default());
    }

    #[test]
    fn test_flags_map_to_options() {
        let args = Args::try_parse_from([
            "vis",
            "script.vis",
            "--keep-going",
            "--json",
            "--max-depth",
            "8",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.file, Some(PathBuf::from("script.vis")));
        assert_eq!(args.verbose, 2);
        let options = args.options();
        assert_eq!(options.error_policy, ErrorPolicy::Continue);
        assert_eq!(options.error_format, ErrorFormat::Json);
        assert_eq!(options.max_depth, 8);
    }

    #[test]
    fn test_eval_conflicts_with_file() {
        assert!(Args::try_parse_from(["vis", "script.vis", "-e", "1"]).is_err());
        let args = Args::try_parse_from(["vis", "--eval", "1 + 2"]).unwrap();
        assert_eq!(args.eval.as_deref(), Some("1 + 2"));
    }
}
