use std::io::Write;
use std::process::ExitCode;

use gemini_probe::{Client, ProbePlan, ProbeRunner};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let client = match Client::from_env() {
        Ok(client) => client,
        Err(err) => {
            eprintln!("configuration error: {err}");
            eprintln!("set GEMINI_API_KEY (or GOOGLE_API_KEY) and try again");
            return ExitCode::FAILURE;
        }
    };

    let runner = ProbeRunner::new(client, ProbePlan::default());
    let mut stdout = std::io::stdout();
    match runner.run(&mut stdout).await {
        Ok(summary) => {
            let _ = writeln!(
                stdout,
                "\n--- Summary: {} probed, {} answered, {} not found, {} quota exhausted, {} failed ---",
                summary.total(),
                summary.answered,
                summary.not_found,
                summary.quota_exhausted,
                summary.failed,
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("probe run failed: {err}");
            ExitCode::FAILURE
        }
    }
}
