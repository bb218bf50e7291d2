use anyhow::Context;
use clap::Parser;
use cutframe::core::validator;
use cutframe::utils::error::{CutFrameError, ErrorSeverity};
use cutframe::utils::{logger, validation::Validate};
use cutframe::{
    CandidateFile, CliConfig, ConfigProvider, ConsolePresenter, CutFrameEngine, HttpCuttingApi,
    LocalStorage, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting cutframe CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let size = tokio::fs::metadata(&cli.file)
        .await
        .with_context(|| format!("Could not read {}", cli.file.display()))?
        .len();
    let name = cli
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.display().to_string());
    let candidate = CandidateFile::new(name, Vec::new()).with_declared_size(size);

    let outcome = match &cli.config {
        Some(path) => {
            let config = TomlConfig::from_file(path).map(|config| {
                config.with_overrides(
                    cli.service_url.as_deref(),
                    cli.output_path.as_deref(),
                    cli.timeout_seconds,
                )
            });
            match config {
                Ok(config) => run(&cli, config, candidate).await,
                Err(e) => Err(e),
            }
        }
        None => run(&cli, cli.clone(), candidate).await,
    };

    if let Err(e) = outcome {
        exit_with(e);
    }
    Ok(())
}

async fn run<C: ConfigProvider + Validate>(
    cli: &CliConfig,
    config: C,
    candidate: CandidateFile,
) -> Result<(), CutFrameError> {
    config.validate()?;

    // a file the rules refuse is handed over without its payload
    let policy = config.upload_policy();
    let candidate = match validator::check(&candidate.name, candidate.size, &policy) {
        Ok(_) => {
            let payload = tokio::fs::read(&cli.file).await?;
            CandidateFile::new(candidate.name, payload).with_declared_size(candidate.size)
        }
        Err(e) => {
            tracing::debug!("Not reading {}: {}", cli.file.display(), e);
            candidate
        }
    };

    let api = HttpCuttingApi::from_config(&config)?;
    let storage = LocalStorage::new(config.output_path());
    let presenter = ConsolePresenter::new();
    let engine = CutFrameEngine::with_policy(api, storage, presenter, policy);

    tracing::info!("Using cutting service at {}", config.service_url());
    let receipts = engine
        .run(candidate, cli.process_type, &cli.formats)
        .await?;

    for receipt in &receipts {
        tracing::info!(
            "✅ {} ({} bytes) saved to {}",
            receipt.filename,
            receipt.bytes,
            receipt.location
        );
    }
    Ok(())
}

fn exit_with(e: CutFrameError) -> ! {
    tracing::error!(
        "❌ cutframe failed: {} (Category: {:?}, Severity: {:?})",
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
    std::process::exit(exit_code);
}
