use std::process::ExitCode;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use uptimeowl::http_probe::error_chain;
use uptimeowl::report::{self, console::print_results};
use uptimeowl::runner::{self, PreparedRun};
use uptimeowl::{RunError, load_config, summarize};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), RunError> {
    let config = load_config()?;
    let PreparedRun { scheduler, mut sink } = runner::prepare(&config)?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, waiting for in-flight probes to finish");
            on_ctrl_c.cancel();
        }
    });

    let started = Utc::now();
    log::info!(
        "Run started at {} with {} targets, concurrency {}",
        started.to_rfc3339(),
        config.targets.len(),
        scheduler.concurrency()
    );

    let results = scheduler.run_until_cancelled(&config.targets, &cancel).await;
    let summary = summarize(&results);
    print_results(&results, &summary);
    log::info!(
        "Run finished in {}ms: {}",
        (Utc::now() - started).num_milliseconds(),
        summary
    );

    let rendered = config.report_format.render(&results);
    report::write_report(&mut sink, &rendered).map_err(|source| RunError::ReportWrite {
        path: config.report_path.clone(),
        source,
    })?;
    log::info!("Report written to {}", config.report_path.display());

    Ok(())
}
