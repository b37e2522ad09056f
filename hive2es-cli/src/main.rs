//! `hive-to-elasticsearch` entry point.

use clap::Parser;
use hive2es_cli::app;
use hive2es_cli::args::Args;
use hive2es_cli::logging::init_logging;
use hive2es_core::ExitCode;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            // --help and --version are not usage errors.
            return if err.use_stderr() {
                ExitCode::Unknown.into()
            } else {
                ExitCode::Ok.into()
            };
        }
    };

    if let Err(err) = init_logging(args.verbose, args.log_json) {
        eprintln!("Failed to initialise logging: {}", err);
    }

    match app::run(&args).await {
        Ok(report) => {
            tracing::info!(
                loaded = report.succeeded() - report.skipped(),
                skipped = report.skipped(),
                "All {} partition(s) indexed",
                report.planned
            );
            ExitCode::Ok.into()
        }
        Err(err) => {
            let code = err.exit_code();
            tracing::error!(exit_code = code.as_i32(), "{}", err);
            code.into()
        }
    }
}
