use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use folio_backend::config::FolioConfig;
use folio_backend::importer::ImporterKind;
use folio_backend::node::FolioNode;
use folio_backend::telemetry;

#[derive(Parser)]
#[command(author, version, about = "Portfolio site backend and feed importers")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for the site and admin API
    Serve,
    /// Run feed importers once and exit
    Import {
        #[arg(value_enum, default_value_t = Which::All)]
        which: Which,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Which {
    Movies,
    Books,
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();

    let config = FolioConfig::from_env()?;
    let node = FolioNode::start(config).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => node.run_http_server().await,
        Command::Import { which } => {
            let summaries = match which {
                Which::Movies => vec![node.run_import(ImporterKind::Movies).await?],
                Which::Books => vec![node.run_import(ImporterKind::Books).await?],
                Which::All => node.importer().run_all().await?,
            };
            for summary in summaries {
                println!(
                    "{}: {} rows ({} scanned, {} skipped)",
                    summary.importer, summary.count, summary.scanned, summary.skipped
                );
            }
            Ok(())
        }
    }
}
