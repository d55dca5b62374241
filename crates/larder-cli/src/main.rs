use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use larder_core::{
    expiry::parse_expiration_date,
    models::NutriScore,
    providers::OpenFoodFactsProvider,
    Config, Error, Exporter, FoodProduct, InventoryService, ItemFilter, SaveOutcome, SaveRequest,
    Unit,
};
use larder_store::SqliteInventoryStore;

#[derive(Parser)]
#[command(name = "larder")]
#[command(version, about = "Track your food inventory and what's about to expire", long_about = None)]
struct Cli {
    /// Act as this user (overrides the configured default)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Search the food database by barcode or name
    Search {
        /// Product barcode
        #[arg(long, conflicts_with = "name")]
        barcode: Option<String>,
        /// Product name to search for
        #[arg(long)]
        name: Option<String>,
    },
    /// Save a product to your inventory with an expiration date
    Save {
        /// Product barcode
        #[arg(long)]
        barcode: String,
        /// Expiration date (YYYY-MM-DD)
        #[arg(long)]
        expires: String,
        /// How many you have (default 1)
        #[arg(long)]
        quantity: Option<u32>,
        /// "items" or "cases" (default items)
        #[arg(long)]
        unit: Option<String>,
    },
    /// List your saved foods
    List {
        /// Only the item with this barcode
        #[arg(long)]
        code: Option<String>,
        /// Only items whose name contains this text
        #[arg(long)]
        name: Option<String>,
        /// Write the results to a file (.json, .csv, or .md)
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Show foods expiring within the next 14 days
    Expiring,
    /// Remove a saved food by id
    Remove {
        /// Item id as shown by `larder list`
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - helps when things go sideways
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "larder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let owner = cli
        .user
        .or_else(|| config.user.name.clone())
        .context("no user configured; pass --user or set [user] name in the config file")?;

    let mut lookup = larder_core::lookup::LookupEngine::new();
    lookup.add_provider(Box::new(OpenFoodFactsProvider::with_base_url(
        config.lookup.api_url.clone(),
    )));

    let db_path = config.store.resolved_db_path()?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteInventoryStore::open(&db_path)
        .with_context(|| format!("failed to open inventory database at {}", db_path.display()))?;
    let inventory = InventoryService::new(store);

    match cli.command {
        Commands::Search { barcode, name } => match (barcode, name) {
            (Some(barcode), _) => {
                tracing::info!("Looking up barcode: {}", barcode);
                match lookup.by_barcode(&barcode).await {
                    Ok(product) => print_product(&product),
                    Err(Error::LookupFailure(msg)) => println!("{}", msg),
                    Err(e) => return Err(e.into()),
                }
            }
            (None, Some(name)) => {
                tracing::info!("Searching for: {}", name);
                let products = lookup.by_name(&name).await?;
                if products.is_empty() {
                    println!("No products found");
                } else {
                    for product in &products {
                        print_product(product);
                    }
                }
            }
            (None, None) => {
                anyhow::bail!("enter a barcode or a product name to search");
            }
        },
        Commands::Save {
            barcode,
            expires,
            quantity,
            unit,
        } => {
            let expiration_date = parse_expiration_date(&expires)
                .map_err(|_| anyhow::anyhow!("expiration date must be a valid YYYY-MM-DD date"))?;
            let unit = unit
                .map(|u| u.parse::<Unit>())
                .transpose()
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            let product = match lookup.by_barcode(&barcode).await {
                Ok(product) => product,
                Err(Error::LookupFailure(msg)) => anyhow::bail!("{}", msg),
                Err(e) => return Err(e.into()),
            };

            let request = SaveRequest {
                product,
                quantity,
                unit,
                expiration_date: Some(expiration_date),
            };

            match inventory.save(&owner, request) {
                Ok(SaveOutcome::Saved(item)) => {
                    println!(
                        "Food saved to inventory: {} (expires {})",
                        item.product_name, expires
                    );
                }
                Ok(SaveOutcome::AlreadySaved) => {
                    println!("Food already saved");
                }
                Err(Error::Validation(msg)) => anyhow::bail!("{}", msg),
                Err(Error::MissingDate) => {
                    anyhow::bail!("an expiration date is required to save a food")
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::List { code, name, export } => {
            let filter = ItemFilter { code, name };
            let items = inventory.list(&owner, &filter)?;

            if let Some(path) = export {
                Exporter::export_to_file(&items, &path)?;
                println!("Exported {} item(s) to {}", items.len(), path.display());
            } else if items.is_empty() {
                println!("You have no saved foods yet.");
            } else {
                for item in &items {
                    let expires = item
                        .expiration_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "no date".to_string());
                    println!(
                        "{}  {} x{} {}  [{}]  expires {}  id={}",
                        item.code,
                        item.product_name,
                        item.quantity,
                        item.unit,
                        item.brands,
                        expires,
                        item.id
                    );
                }
            }
        }
        Commands::Expiring => {
            let today = chrono::Local::now().date_naive();
            let expiring = inventory.expiring_soon(&owner, today)?;

            if expiring.is_empty() {
                println!("No foods are expiring in the next 14 days.");
            } else {
                println!("Foods expiring soon:");
                for entry in &expiring {
                    let status = if entry.days_left <= 0 {
                        "Expired!".to_string()
                    } else {
                        format!(
                            "{} day{} remaining",
                            entry.days_left,
                            if entry.days_left == 1 { "" } else { "s" }
                        )
                    };
                    println!(
                        "[{}] {} ({}) - {}  id={}",
                        entry.urgency.label(),
                        entry.item.product_name,
                        entry.item.brands,
                        status,
                        entry.item.id
                    );
                }
            }
        }
        Commands::Remove { id } => match inventory.remove(&owner, &id) {
            Ok(()) => println!("Removed."),
            Err(Error::NotFound(_)) => anyhow::bail!("no saved food with id {}", id),
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}

fn print_product(product: &FoodProduct) {
    let name = product.product_name.as_deref().unwrap_or("No name");
    let brand = product.brands.as_deref().unwrap_or("Unknown");
    let code = product.code.as_deref().unwrap_or("-");

    let score = product
        .nutriscore_grade
        .as_deref()
        .and_then(NutriScore::parse)
        .map(|s| format!("  Nutri-Score: {}", s.label()))
        .unwrap_or_default();

    println!("{}  {} ({}){}", code, name, brand, score);
}
