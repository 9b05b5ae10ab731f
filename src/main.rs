//! # Wasabi Check CLI (`wck`)
//!
//! ## Usage
//!
//! ```bash
//! wck --config ./config/wck.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wck init` | Create the SQLite database and run schema migrations |
//! | `wck import <file.xlsx>` | Replace the whole catalog from a workbook |
//! | `wck list [--query q]` | Search results, or favorites without a query |
//! | `wck search "<text>"` | Free-text lookup by product number or name |
//! | `wck scan <barcode>` | Barcode lookup |
//! | `wck ocr <image>` | Label-photo lookup via the configured OCR provider |
//! | `wck show <product_number>` | Product detail |
//! | `wck stock <barcode> <+1/-1>` | Adjust store stock by one unit |
//! | `wck favorite <product_number>` | Toggle the favorite flag |
//! | `wck stats` | Catalog counts |
//! | `wck serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wasabi_check::{adjust, config, import_cmd, lookup, migrate, server, show, stats};

/// Wasabi Check: barcode, text and label-photo inventory lookup.
#[derive(Parser)]
#[command(
    name = "wck",
    about = "Wasabi Check: inventory lookup and stock adjustment for a retail catalog",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/wck.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Replace the whole catalog from an .xlsx workbook.
    ///
    /// The first worksheet's first non-blank row is the header. Either every
    /// row is imported or nothing changes.
    Import {
        /// Path to the workbook.
        file: PathBuf,

        /// Validate and count without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// List products matching a query, or the favorites when no query is given.
    List {
        #[arg(long)]
        query: Option<String>,
    },

    /// Look up a product by part of its number or name.
    Search { text: String },

    /// Look up a product by (a prefix of) its barcode.
    Scan { barcode: String },

    /// Look up a product from a photographed label.
    Ocr { image: PathBuf },

    /// Show one product with its variants.
    Show { product_number: String },

    /// Add or remove one unit of store stock.
    Stock {
        barcode: String,

        /// +1 or -1.
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },

    /// Toggle a product's favorite flag.
    Favorite { product_number: String },

    /// Show catalog counts.
    Stats,

    /// Start the HTTP server.
    Serve {
        /// Override `[server].bind`.
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file, dry_run } => {
            import_cmd::run_import(&cfg, &file, dry_run).await?;
        }
        Commands::List { query } => {
            lookup::run_list(&cfg, query.as_deref()).await?;
        }
        Commands::Search { text } => {
            lookup::run_search(&cfg, &text).await?;
        }
        Commands::Scan { barcode } => {
            lookup::run_scan(&cfg, &barcode).await?;
        }
        Commands::Ocr { image } => {
            lookup::run_ocr(&cfg, &image).await?;
        }
        Commands::Show { product_number } => {
            show::run_show(&cfg, &product_number).await?;
        }
        Commands::Stock { barcode, delta } => {
            adjust::run_stock(&cfg, &barcode, delta).await?;
        }
        Commands::Favorite { product_number } => {
            adjust::run_favorite(&cfg, &product_number).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
