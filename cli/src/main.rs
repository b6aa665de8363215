mod analyze;
mod parse_response;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Larder CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ResponseKind {
    /// Ingredient list from a fridge photo
    Ingredients,
    /// Recipe suggestions for a list of ingredients
    Recipes,
    /// Recipe digitized from a recipe card
    Scan,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect ingredients in a fridge photo and suggest recipes
    AnalyzeFridge {
        /// Path to the fridge photo
        image: PathBuf,
    },
    /// Digitize a photographed recipe card
    ScanRecipe {
        /// Path to the recipe card photo
        image: PathBuf,
    },
    /// Parse a saved model response the way the analysis does, without calling the model
    ParseResponse {
        /// Which analysis step produced the response
        #[arg(long, value_enum)]
        kind: ResponseKind,
        /// File containing the raw model output
        file: PathBuf,
        /// Detected ingredients, comma separated (used by the recipe fallback)
        #[arg(long, value_delimiter = ',')]
        ingredients: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::AnalyzeFridge { image } => {
            analyze::analyze_fridge(&image).await?;
        }
        Commands::ScanRecipe { image } => {
            analyze::scan_recipe(&image).await?;
        }
        Commands::ParseResponse {
            kind,
            file,
            ingredients,
        } => {
            parse_response::parse_response(kind, &file, &ingredients)?;
        }
    }

    Ok(())
}
