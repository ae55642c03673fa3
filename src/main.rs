use clap::Parser;
use loxwalk::cli::{generate_completions, Args, Commands};
use loxwalk::config::AppConfig;
use loxwalk::diagnostic::render_diagnostics;
use loxwalk::interpreter::{RunOutcome, Session};
use loxwalk::lexer::scan;
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;

const EXIT_IO_ERROR: u8 = 74;

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return ExitCode::SUCCESS;
    }

    let config = AppConfig::from_args(&args);
    init_tracing(&config);

    if let Some(source) = &args.eval {
        return run_source(source, "<eval>", &config);
    }

    match &args.script {
        Some(path) => run_file(path, &config),
        None => run_prompt(&config),
    }
}

/// `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true).with_level(true))
        .with(filter)
        .init();
}

fn run_file(path: &Path, config: &AppConfig) -> ExitCode {
    debug!(path = %path.display(), "reading script");
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            error_message(config, &format!("Failed to read {}: {}", path.display(), e));
            return ExitCode::from(EXIT_IO_ERROR);
        }
    };
    run_source(&source, &path.display().to_string(), config)
}

fn run_source(source: &str, file_name: &str, config: &AppConfig) -> ExitCode {
    if config.dump_tokens {
        return dump_tokens(source, file_name, config);
    }

    let mut session = Session::new();
    let outcome = session.run(source);
    report(&outcome, source, file_name, config);
    ExitCode::from(outcome.exit_code())
}

fn dump_tokens(source: &str, file_name: &str, config: &AppConfig) -> ExitCode {
    let scanned = scan(source);
    let mut stdout = io::stdout().lock();
    for token in &scanned.tokens {
        if writeln!(stdout, "{:>4} {}", token.line, token).is_err() {
            return ExitCode::from(EXIT_IO_ERROR);
        }
    }

    if scanned.is_ok() {
        ExitCode::SUCCESS
    } else {
        let outcome = RunOutcome::SyntaxErrors(scanned.errors);
        report(&outcome, source, file_name, config);
        ExitCode::from(outcome.exit_code())
    }
}

fn run_prompt(config: &AppConfig) -> ExitCode {
    debug!("entering REPL");
    let mut session = Session::new();
    let mut lines = io::stdin().lock().lines();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                error_message(config, &format!("Error reading input: {}", e));
                break;
            }
            None => break,
        };

        let trimmed = line.trim();
        if trimmed == "exit" {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }

        // Errors are reported and the next line starts clean.
        let outcome = session.run_line(&line);
        report(&outcome, &line, "<repl>", config);
    }

    ExitCode::SUCCESS
}

fn report(outcome: &RunOutcome, source: &str, file_name: &str, config: &AppConfig) {
    let diagnostics = outcome.diagnostics();
    if !diagnostics.is_empty() {
        eprint!("{}", render_diagnostics(source, file_name, diagnostics, config.color_enabled));
    }
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
