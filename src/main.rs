use clap::Parser;
use costopt::{load_batch, run_batch};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "costopt")]
#[command(about = "Solve a batch of cloud cost-optimization scenarios")]
struct Cli {
    /// JSON batch file with optimizer settings, cost table and scenarios
    batch: PathBuf,

    /// Solver time limit in seconds, overriding the batch file
    #[arg(long)]
    time_limit: Option<f64>,

    /// Pretty-print the reports
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut batch = load_batch(&cli.batch)?;
    if let Some(secs) = cli.time_limit {
        batch.optimizer.time_limit_secs = Some(secs);
    }

    let reports = run_batch(batch).await?;
    let output = if cli.pretty {
        serde_json::to_string_pretty(&reports)?
    } else {
        serde_json::to_string(&reports)?
    };
    println!("{}", output);

    Ok(())
}
