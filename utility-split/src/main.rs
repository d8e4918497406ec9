use chrono::Local;
use split_core::config::Settings;
use split_core::error::SplitResult;
use split_core::observability::init_tracing;
use std::process::ExitCode;
use utility_split::{config::Config, models::DispatchReport, Application};

async fn run(settings: Settings) -> SplitResult<DispatchReport> {
    let config = Config::from_settings(settings)?;
    let application = Application::build(config).await?;
    application.run(Local::now().date_naive()).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&settings.log_level, settings.log_format);

    match run(settings).await {
        Ok(report) if report.is_empty() => {
            tracing::info!(note = %report.note, "No utility charges found, nothing requested");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            tracing::info!(
                note = %report.note,
                amount_due = %report.amount_due,
                requests = report.requests.len(),
                dry_run = report.dry_run,
                "Utility split complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(stage = e.stage(), error = %e, "Utility split failed");
            ExitCode::FAILURE
        }
    }
}
