use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Arg, Command};
use minidb::{Database, DatabaseConfig, DbError, Result, config::DEFAULT_NAME};
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

/// Interactive shell reading `;`-terminated statements from stdin.
///
/// # Arguments
/// - `--name NAME`: name of the database (default: `DataBase`)
/// - `--load FILE`: restore a saved database before reading statements
/// - `--save FILE`: save the database when stdin is closed
fn main() -> Result<()> {
    let matches = Command::new("minidb")
        .about("Tiny in-memory relational database")
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("NAME")
                .default_value(DEFAULT_NAME)
                .help("Database name written in saved files"),
        )
        .arg(
            Arg::new("load")
                .long("load")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Database file to load at startup"),
        )
        .arg(
            Arg::new("save")
                .long("save")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Database file to write on exit"),
        )
        .get_matches();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let name = matches
        .get_one::<String>("name")
        .map_or(DEFAULT_NAME, String::as_str);
    let mut db = Database::with_config(DatabaseConfig::with_name(name));

    if let Some(path) = matches.get_one::<PathBuf>("load") {
        db.load_db(path)?;
    }

    repl(&mut db, io::stdin().lock(), &mut io::stdout())?;

    if let Some(path) = matches.get_one::<PathBuf>("save") {
        db.save_db(path)?;
    }
    Ok(())
}

fn repl(db: &mut Database, input: impl BufRead, output: &mut impl Write) -> Result<()> {
    let mut buffer = String::new();

    for line in input.lines() {
        let line = line.map_err(console_error(STDIN))?;
        buffer.push_str(&line);
        buffer.push('\n');

        // A statement may span several lines.
        if !buffer.trim_end().ends_with(';') {
            continue;
        }

        for result in db.run_script(&buffer) {
            match result {
                Ok(outcome) => writeln!(output, "{outcome}").map_err(console_error(STDOUT))?,
                Err(e) => error!("{e}"),
            }
        }
        buffer.clear();
    }

    if !buffer.trim().is_empty() {
        error!("unterminated statement discarded: {}", buffer.trim());
    }
    output.flush().map_err(console_error(STDOUT))
}

const STDIN: &str = "<stdin>";
const STDOUT: &str = "<stdout>";

fn console_error(stream: &'static str) -> impl Fn(io::Error) -> DbError {
    move |source| DbError::WriteFile {
        path: PathBuf::from(stream),
        source,
    }
}
