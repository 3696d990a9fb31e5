use clap::Parser;
use profile_dedupe::domain::model::RunReport;
use profile_dedupe::utils::error::{DedupeError, ErrorSeverity};
use profile_dedupe::utils::{logger, validation::Validate};
use profile_dedupe::{
    AppConfig, BatchRunner, BulkSender, Chunker, Cli, Command, IdentityProcessor, ReqwestTransport,
    RetryClient,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    cli.apply_to(&mut config);

    let logger_ready = if config.output.json_logs {
        logger::init_json_logger(cli.verbose);
        Ok(())
    } else {
        logger::init_cli_logger(cli.verbose, Some(&config.log_path()))
    };
    if let Err(e) = logger_ready {
        eprintln!("❌ Could not open log file {}: {}", config.log_path().display(), e);
        std::process::exit(1);
    }

    tracing::info!("Starting profile-dedupe");
    if cli.verbose {
        tracing::debug!("Effective config: {:?}", config);
    }

    if let Err(e) = run(&cli, config).await {
        tracing::error!(
            "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: &Cli, config: AppConfig) -> Result<(), DedupeError> {
    if cli.needs_api() {
        config.validate()?;
        tracing::info!(
            "environment={}, dry_run={}",
            config.api.environment,
            config.run.dry_run
        );
    }

    match &cli.command {
        Command::Chunk { input, .. } => {
            let chunker = Chunker::new(config.chunk.size, config.chunk.output_prefix.clone())?;
            let report = chunker.split(input)?;
            println!(
                "✅ Finished splitting. Created {} files from {} rows.",
                report.files.len(),
                report.rows
            );
        }
        Command::Identity { .. } => {
            let input_dir = config.identity.input_dir.clone();
            let pattern = config.identity.file_pattern.clone();
            let output = config.identity.result_summary.clone();

            let processor = IdentityProcessor::new(client(&config)?, config);
            let report = BatchRunner::new(processor)
                .run_dir(&input_dir, &pattern, &output)
                .await?;
            print_report(&report);
        }
        Command::Bulk { .. } => {
            let input_dir = config.bulk.input_dir.clone();
            let pattern = config.bulk.file_pattern.clone();
            let output = config.bulk.result_summary.clone();

            let sender = BulkSender::new(client(&config)?, config);
            let report = BatchRunner::new(sender)
                .run_dir(&input_dir, &pattern, &output)
                .await?;
            print_report(&report);
        }
    }

    Ok(())
}

fn client(config: &AppConfig) -> Result<RetryClient<ReqwestTransport>, DedupeError> {
    let transport = ReqwestTransport::new(config.credentials(), config.request_timeout())?;
    Ok(RetryClient::new(transport, config.retry_policy()))
}

fn print_report(report: &RunReport) {
    println!("📋 Run Summary:");
    println!("  Files processed: {}", report.files.len());
    println!("  Files failed:    {}", report.failed_files.len());
    println!("  Rows:            {}", report.total_rows());
    println!("    delivered:     {}", report.total_delivered());
    println!("    failed:        {}", report.total_failed());
    println!("    skipped:       {}", report.total_skipped());
    println!("    simulated:     {}", report.total_simulated());
    for (file, reason) in &report.failed_files {
        println!("  ❌ {}: {}", file.display(), reason);
    }
    if let (Some(start), Some(end)) = (report.started_at, report.finished_at) {
        println!("  Elapsed:         {}s", (end - start).num_seconds());
    }
    match &report.combined_summary {
        Some(path) => println!("📁 Combined summary: {}", path.display()),
        None => println!("📁 No summary rows to combine"),
    }
}
