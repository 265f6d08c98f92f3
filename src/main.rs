use clap::Parser;
use comp_cards::domain::ports::ConfigProvider;
use comp_cards::utils::error::CompError;
use comp_cards::utils::{logger, validation::Validate};
use comp_cards::{CliConfig, CompEngine, CompPipeline, LocalStorage, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting comp-cards");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 指定 --config 時改用 TOML 設定
    let result = match cli.config.clone() {
        Some(path) => match TomlConfig::from_file(&path) {
            Ok(toml) => {
                let monitor = cli.monitor || toml.monitoring_enabled();
                run(toml, monitor).await
            }
            Err(e) => Err(e),
        },
        None => {
            let monitor = cli.monitor;
            run(cli, monitor).await
        }
    };

    match result {
        Ok(output_path) => {
            tracing::info!("✅ Run completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ Run completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            std::process::exit(e.severity().exit_code());
        }
    }

    Ok(())
}

async fn run<C>(config: C, monitor: bool) -> Result<String, CompError>
where
    C: ConfigProvider + Validate,
{
    // 設定有誤時在分組前就停止
    config.validate()?;

    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = CompPipeline::new(storage, config);
    let engine = CompEngine::new_with_monitoring(pipeline, monitor);

    engine.run().await
}
