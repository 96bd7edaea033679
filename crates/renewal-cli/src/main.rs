mod display;

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use renewal_core::{Settings, Timeouts, TracingSink};
use renewal_pipeline::Pipeline;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "renewal", version, about = "Contract renewal reminders")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load alerts, generate reminders, and send them through every channel.
    Run,
    /// Generate reminders and print them without sending anything.
    Preview,
}

#[derive(Args)]
struct ConfigArgs {
    /// JSON array of contract alerts.
    #[arg(long, env = "CONTRACT_ALERTS_JSON", hide_env_values = true)]
    alerts: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    openai_endpoint: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_KEY", hide_env_values = true)]
    openai_key: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT")]
    openai_deployment: Option<String>,

    /// Destination for the email-style webhook notification.
    #[arg(long, env = "OUTLOOK_WEBHOOK_URL")]
    webhook_url: Option<String>,

    #[arg(long, default_value_t = 10)]
    connect_timeout_secs: u64,

    #[arg(long, default_value_t = 20)]
    openai_timeout_secs: u64,

    #[arg(long, default_value_t = 10)]
    webhook_timeout_secs: u64,
}

impl ConfigArgs {
    fn into_settings(self) -> Settings {
        Settings {
            alerts_payload: self.alerts,
            text_service_endpoint: self.openai_endpoint,
            text_service_credential: self.openai_key,
            text_service_deployment: self.openai_deployment,
            webhook_url: self.webhook_url,
            timeouts: Timeouts {
                connect: Duration::from_secs(self.connect_timeout_secs),
                text_service: Duration::from_secs(self.openai_timeout_secs),
                webhook: Duration::from_secs(self.webhook_timeout_secs),
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    tracing::info!("renewal v{}", env!("CARGO_PKG_VERSION"));

    let settings = cli.config.into_settings();
    let pipeline = Pipeline::from_settings(&settings, Arc::new(TracingSink))?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling run");
            on_signal.cancel();
        }
    });

    match cli.command {
        Command::Run => {
            let summary = pipeline.run(&cancel).await;
            tracing::info!(
                alerts = summary.alerts,
                processed = summary.processed,
                from_model = summary.generated_by_model,
                delivered = summary.delivered,
                failed = summary.failed,
                "run finished"
            );
        }
        Command::Preview => {
            let previews = pipeline.preview(&cancel).await;
            if previews.is_empty() {
                println!("No contract alerts.");
            }
            for (alert, message) in &previews {
                println!("{}", display::render(alert, message));
            }
        }
    }
    Ok(())
}
