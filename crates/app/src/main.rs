use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use vigil_app::config::AppConfig;
use vigil_app::runtime;
use vigil_watch::WindowSelector;

#[derive(Parser)]
#[command(name = "vigil")]
#[command(version)]
#[command(about = "Watch a project or window and report when activity finishes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, default_value = "vigil.toml", env = "VIGIL_CONFIG", global = true)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a directory tree for filesystem activity
    Watch {
        /// Directory to watch
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Override the idle threshold, in seconds
        #[arg(long)]
        idle_secs: Option<u64>,

        /// Override the confirm delay, in seconds
        #[arg(long)]
        confirm_secs: Option<u64>,
    },
    /// Watch an application window for visual activity
    WatchWindow {
        /// Application name or alias
        app: String,

        /// Select a window by 1-based index
        #[arg(long, conflicts_with = "title")]
        index: Option<usize>,

        /// Select a window by title substring
        #[arg(long)]
        title: Option<String>,
    },
    /// List the windows of a running application
    Windows {
        /// Application name or alias
        app: String,
    },
    /// Listen for the wake word and print detections
    Listen {
        /// Audio device name
        #[arg(short = 'D', long)]
        device: Option<String>,
    },
    /// Meter the microphone and print a level bar
    MicCheck {
        /// Capture duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Audio device name
        #[arg(short = 'D', long)]
        device: Option<String>,
    },
}

fn init_logging() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Watch {
            path,
            idle_secs,
            confirm_secs,
        } => {
            if let Some(secs) = idle_secs {
                config.watch.idle_threshold_secs = secs;
            }
            if let Some(secs) = confirm_secs {
                config.watch.confirm_delay_secs = secs;
            }
            runtime::watch_path(&config, path).await
        }
        Commands::WatchWindow { app, index, title } => {
            let selector = match (index, title) {
                (Some(i), _) => WindowSelector::Index(i),
                (None, Some(t)) => WindowSelector::Title(t),
                (None, None) => WindowSelector::Index(1),
            };
            runtime::watch_window(&config, app, selector).await
        }
        Commands::Windows { app } => runtime::list_windows(&config, &app),
        Commands::Listen { device } => runtime::listen(device).await,
        Commands::MicCheck { duration, device } => {
            runtime::mic_check(device, Duration::from_secs(duration)).await
        }
    }
}
