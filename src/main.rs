use anyhow::Result;
use clap::Parser;
use roster_report::count_students;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[clap(
    author,
    version,
    about = "Count the students in a roster database, grouped by field"
)]
struct Args {
    /// CSV roster: a header line, then `firstname,lastname,age,field` records
    #[clap(parse(from_os_str), env = "ROSTER_DATABASE")]
    database: PathBuf,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // stdout carries the report, logs go to stderr
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    count_students(&args.database)?;

    Ok(())
}
