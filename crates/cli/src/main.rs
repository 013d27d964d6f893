use anyhow::Context;
use clap::{Parser, Subcommand};
use library_kernel::settings::Settings;

/// Library Management System command line
#[derive(Debug, Parser)]
#[command(name = "library", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Override `server.host`
        #[arg(long)]
        host: Option<String>,
        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create the database file and tables, then exit
    InitDb,
    /// Print the effective settings as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().with_context(|| "failed to load library settings")?;

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            library_telemetry::init(&settings.telemetry)?;
            library_app::serve(settings).await
        }
        Command::InitDb => {
            library_telemetry::init(&settings.telemetry)?;
            let pool = library_app::init_database(&settings).await?;
            pool.close().await;
            tracing::info!(db = %settings.database.url, "database initialized");
            Ok(())
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .with_context(|| "failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
    }
}
