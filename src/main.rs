use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use cardrank::board::Board;
use cardrank::config::Config;
use cardrank::models::{RepairFilter, RepairStrategy};
use cardrank::{api, db};

#[derive(Parser)]
#[command(name = "cardrank")]
#[command(about = "Lexicographic rank ordering for kanban boards")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Re-space every position in a bucket
    Rebalance {
        bucket: String,
    },
    /// Report missing, invalid and duplicate positions
    Analyze,
    /// Rewrite broken positions
    Repair {
        /// regenerate, fix_missing, fix_duplicates or fix_all
        #[arg(short, long, default_value = "fix_all")]
        strategy: String,

        /// Only repair these buckets
        #[arg(short, long)]
        bucket: Vec<String>,

        /// Only repair these cards (comma separated)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<Uuid>,

        /// Print the planned changes without writing them
        #[arg(long)]
        dry_run: bool,
    },
}

/// Initialize tracing with output to stderr (for one-shot commands) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "cardrank=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // Keep stdout for command output
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn open(config: &Config) -> anyhow::Result<(db::Database, Board)> {
    let board = Board::new(config.generator()?);
    let db = db::Database::open(config.database_path.clone())?;
    db.migrate()?;
    Ok((db, board))
}

async fn serve(config: &Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting cardrank server on port {}", port);

    let (db, board) = open(config)?;
    let app = api::create_router(db, board);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("cardrank server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, None | Some(Commands::Serve { .. }));
    init_tracing(use_stderr);

    let config = Config::from_env()?;
    tracing::debug!(
        database = %config.database_path.display(),
        alphabet = %config.alphabet,
        max_rank_len = config.max_rank_len,
        "Loaded configuration"
    );

    match cli.command {
        Some(Commands::Serve { port }) => serve(&config, port).await?,
        Some(Commands::Rebalance { bucket }) => {
            let (db, board) = open(&config)?;
            let cards = db.rebalance_bucket(&board, &bucket)?;
            println!("Rebalanced {} cards in '{}'", cards.len(), bucket);
            for card in cards {
                println!(
                    "  {}  {}  {}",
                    card.position.as_deref().unwrap_or("-"),
                    card.id,
                    card.title
                );
            }
        }
        Some(Commands::Analyze) => {
            let (db, board) = open(&config)?;
            let analysis = db.analyze_positions(board.generator())?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Some(Commands::Repair {
            strategy,
            bucket,
            ids,
            dry_run,
        }) => {
            let strategy = RepairStrategy::from_str(&strategy)
                .ok_or_else(|| anyhow::anyhow!("Unknown repair strategy '{}'", strategy))?;
            let filter = RepairFilter {
                buckets: bucket,
                ids,
            };

            let (db, board) = open(&config)?;
            let plan = db.repair_positions(&board, strategy, &filter, dry_run)?;

            if plan.is_empty() {
                println!("No positions need repair");
            } else {
                let verb = if dry_run { "Would update" } else { "Updated" };
                println!("{} {} positions ({})", verb, plan.len(), strategy.as_str());
                for (bucket, changes) in &plan.changes {
                    println!("{}:", bucket);
                    for change in changes {
                        println!(
                            "  {}  {} -> {}",
                            change.card_id,
                            change.old.as_deref().unwrap_or("NULL"),
                            change.new
                        );
                    }
                }
            }
        }
        None => serve(&config, 3000).await?,
    }

    Ok(())
}
