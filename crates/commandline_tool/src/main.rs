use anyhow::{Context, Result};
use batch_processor::pkg_config::load_or_default;
use chrono::{DateTime, Local};
use commandline_tool::{
    Commands, default_output_dir_for, parse_args, run_analyze, run_convert_file,
    run_convert_project, run_inspect_build,
};
use log::{debug, info};
use std::fs;
use std::path::Path;
use tracing_appender::rolling;
use tracing_log::LogTracer;
use tracing_subscriber::filter::LevelFilter as SubLevel;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Console and `log/latest.log` output for both `log` records and tracing
/// events. The previous `latest.log` is archived under its modification time.
fn init_logging(debug: bool) {
    let _ = LogTracer::init();

    let log_dir = Path::new("log");
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("Failed to create log directory: {}", e);
    }

    let latest_path = log_dir.join("latest.log");
    if let Ok(modified) = fs::metadata(&latest_path).and_then(|m| m.modified()) {
        let datetime: DateTime<Local> = modified.into();
        let code = datetime.format("%y%m%d%H%M%S").to_string();
        let mut final_path = log_dir.join(format!("{}.log", code));
        let mut idx = 1;
        while final_path.exists() {
            final_path = log_dir.join(format!("{}-{}.log", code, idx));
            idx += 1;
        }
        let _ = fs::rename(&latest_path, &final_path);
    }

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::uptime());

    let file_appender = rolling::never(log_dir, "latest.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // Flushes on drop, so it has to outlive main.
    let _guard: &'static _ = Box::leak(Box::new(guard));

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(non_blocking);

    let stdout_filter = if debug { SubLevel::DEBUG } else { SubLevel::WARN };
    let file_filter = if debug { SubLevel::DEBUG } else { SubLevel::INFO };

    let subscriber = tracing_subscriber::registry()
        .with(stdout_layer.with_filter(stdout_filter))
        .with(file_layer.with_filter(file_filter));
    let _ = subscriber.try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args();
    init_logging(cli.debug);

    match &cli.command {
        Commands::ConvertFile {
            input,
            output,
            json,
        } => {
            debug!("Selected convert-file");
            let result = run_convert_file(input)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }
            match output {
                Some(path) => {
                    fs::write(path, &result.code)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{}", result.code),
            }
            for comment in &result.comments {
                eprintln!(
                    "line {} [{:?}] {}",
                    comment.line, comment.severity, comment.text
                );
            }
            Ok(())
        }

        Commands::Analyze { input_dir, json } => {
            debug!("Selected analyze");
            let config = load_or_default();
            let structure = run_analyze(input_dir, &config).await?;
            let summary = structure.summary();
            if *json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }
            println!("Project: {}", input_dir.display());
            println!("Classes: {}", summary.total_classes);
            println!("Test classes: {}", summary.test_classes.len());
            println!("Page objects: {}", summary.page_objects.len());
            println!("Utilities: {}", summary.utilities.len());
            println!("Base classes: {}", summary.base_classes.len());
            if let Some(gradle) = &summary.gradle {
                println!("Gradle project: {}", gradle.project_name);
            }
            Ok(())
        }

        Commands::ConvertProject {
            input_dir,
            output_dir,
            force,
        } => {
            debug!("Selected convert-project");
            let config = load_or_default();
            let output_dir = output_dir
                .clone()
                .unwrap_or_else(|| default_output_dir_for(input_dir));
            info!(
                "Converting {} into {}",
                input_dir.display(),
                output_dir.display()
            );

            let (result, written) =
                run_convert_project(input_dir, &output_dir, *force, config).await?;
            let summary = result.summary;
            println!(
                "Converted {} of {} classes ({} skipped, {} failed)",
                summary.converted_files, summary.total_files, summary.skipped_files, summary.errors
            );
            for failure in &result.failures {
                println!("  failed: {} ({})", failure.file_path, failure.error);
            }
            println!(
                "Wrote {} files to {}",
                written.files_written,
                output_dir.display()
            );
            println!("Report: {}", written.report_path.display());
            Ok(())
        }

        Commands::InspectBuild { input } => {
            debug!("Selected inspect-build");
            let project = run_inspect_build(input)?;
            println!("{}", serde_json::to_string_pretty(&project)?);
            Ok(())
        }
    }
}
