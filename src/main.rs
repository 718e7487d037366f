use anyhow::Context;
use clap::Parser;
use flat_etl::utils::error::ErrorSeverity;
use flat_etl::utils::logger;
use flat_etl::{run_configured, CliArgs, RunReport};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    logger::init_cli_logger(args.verbose, args.log_json);

    tracing::info!("Starting flat-etl");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    match run_configured(&config) {
        Ok(report) => {
            if args.json {
                let json = serde_json::to_string_pretty(&report)
                    .context("failed to serialize run report")?;
                println!("{}", json);
            } else {
                print_report(&report);
            }
        }
        Err(failure) => {
            let e = &failure.source;
            tracing::error!(
                "❌ Pipeline failed while {}: {} (Category: {:?}, Severity: {:?})",
                failure.stage,
                e,
                e.category(),
                e.severity()
            );

            eprintln!("❌ Step '{}' failed: {}", failure.stage, e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("✅ {} completed", report.pipeline);
    println!("📥 Source: {} ({} records)", report.source, report.records_extracted);
    println!("📁 Sink: {} ({} records written)", report.sink, report.load.records_written);
    if report.verification.is_match() {
        println!("🔍 Verified {} records", report.verification.checked);
    } else {
        println!(
            "⚠️  Verification found {} mismatch(es) in {} records",
            report.verification.mismatches.len(),
            report.verification.checked
        );
        for mismatch in &report.verification.mismatches {
            println!("   - {}", mismatch);
        }
    }
}
