use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use boundaries_core::Registry;
use boundaries_core::reference::{
    DEFAULT_ABBREVIATIONS_URL, DEFAULT_CENSUS_URL, DEFAULT_REPRESENT_URL, DEFAULT_SPREADSHEET_URL,
};
use boundaries_store::{Git, Ogr};
use boundaries_sync::{HttpClient, Remote};
use clap::{Parser, Subcommand};
use tracing::{Level, info};

mod checks;
mod display;
mod shapefiles;
mod sheets;

#[derive(Parser, Debug)]
#[command(name = "boundaries", version, about = "Maintenance tasks for the boundary catalog")]
struct Cli {
    #[arg(long, global = true, env = "BOUNDARIES_BASE", default_value = ".", help = "Catalog root")]
    base: PathBuf,
    #[arg(short, long, global = true, help = "Log at debug level")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check every definition for unknown keys, bad values and formatting.
    Definitions,
    /// Check that data directories have a LICENSE.txt matching their licence.
    Licenses,
    /// Check that source, licence and data URLs resolve.
    Urls,
    /// Compare the catalog with the tracking spreadsheet.
    Spreadsheet {
        #[arg(long, env = "BOUNDARIES_SPREADSHEET_URL", default_value = DEFAULT_SPREADSHEET_URL)]
        spreadsheet_url: String,
    },
    /// Print definition notes and spreadsheet revisions.
    Notes {
        #[arg(long, env = "BOUNDARIES_SPREADSHEET_URL", default_value = DEFAULT_SPREADSHEET_URL)]
        spreadsheet_url: String,
    },
    /// Write the national tracking spreadsheet to stdout as CSV.
    WriteSpreadsheet {
        #[arg(long, default_value = DEFAULT_CENSUS_URL)]
        census_url: String,
        #[arg(long, default_value = DEFAULT_ABBREVIATIONS_URL)]
        abbreviations_url: String,
        #[arg(long, default_value = DEFAULT_REPRESENT_URL)]
        represent_url: String,
    },
    /// Download and normalize shapefiles whose source has changed.
    Shapefiles {
        #[arg(long, help = "Only update the definition with this slug")]
        only: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();
    info!("boundaries v{}", env!("CARGO_PKG_VERSION"));

    let registry = Registry::load(&cli.base)
        .with_context(|| format!("loading definitions under {}", cli.base.display()))?;
    info!(count = registry.len(), "loaded definitions");

    let http = HttpClient::new();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Definitions => {
            checks::definitions(&registry, &mut out)?;
        }
        Commands::Licenses => {
            checks::licenses(&cli.base, &registry, &mut out)?;
        }
        Commands::Urls => {
            checks::urls(&registry, &Remote::new(http), &mut out).await?;
        }
        Commands::Spreadsheet { spreadsheet_url } => {
            let sheet = sheets::fetch_sheet(&http, &spreadsheet_url).await?;
            sheets::spreadsheet(&registry, &sheet, &mut out)?;
        }
        Commands::Notes { spreadsheet_url } => {
            let sheet = sheets::fetch_sheet(&http, &spreadsheet_url).await?;
            sheets::notes(&registry, &sheet, &mut out)?;
        }
        Commands::WriteSpreadsheet {
            census_url,
            abbreviations_url,
            represent_url,
        } => {
            let sources = sheets::NationalSources {
                census_url: &census_url,
                abbreviations_url: &abbreviations_url,
                represent_url: &represent_url,
            };
            sheets::write_spreadsheet(&registry, &http, &sources, &mut out).await?;
        }
        Commands::Shapefiles { only } => {
            let remote = Remote::new(http);
            let (ogr, git) = (Ogr::default(), Git::new(&cli.base));
            let outcomes = shapefiles::Pipeline::new(&remote, &ogr, &git)
                .run(&registry, only.as_deref(), &mut out)
                .await?;
            info!(checked = outcomes.len(), "shapefiles done");
        }
    }

    out.flush()?;
    Ok(())
}
