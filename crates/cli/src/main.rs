//! Support Desk CLI - demo data and console operations from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Seed the local demo store (no-op if it already holds data)
//! sd-cli demo init
//!
//! # Back up and restore the demo store
//! sd-cli demo export --out backup.json
//! sd-cli demo import backup.json
//!
//! # Work with chats against the configured backend
//! sd-cli --demo chats
//! sd-cli --demo send <CHAT_ID> "Do you have headphones?" --wait
//!
//! # Dashboard numbers
//! sd-cli stats
//! ```
//!
//! # Environment Variables
//!
//! See `support_desk::config` for the full list. `RUST_LOG` controls log
//! verbosity and `SUPPORT_DESK_LOG_JSON` switches logs to JSON.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use support_desk_core::{ChatId, OrderId, OrderStatus, PaymentStatus, ProductId};

mod commands;

#[derive(Parser)]
#[command(name = "sd-cli")]
#[command(author, version, about = "Support Desk CLI tools")]
struct Cli {
    /// Use the local demo store regardless of configuration
    #[arg(long, global = true)]
    demo: bool,

    /// Demo store directory (overrides `SUPPORT_DESK_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the local demo store
    Demo {
        #[command(subcommand)]
        action: DemoAction,
    },
    /// List chats, most recently active first
    Chats,
    /// Show a chat's messages
    Messages {
        chat: ChatId,
    },
    /// Send a message into a chat
    Send {
        chat: ChatId,
        text: String,
        /// Attach a product
        #[arg(long)]
        product: Option<ProductId>,
        /// Wait for the assistant's reply, if one is scheduled
        #[arg(long)]
        wait: bool,
    },
    /// Turn the AI assistant on or off for a chat
    Ai {
        chat: ChatId,
        #[arg(value_parser = clap::builder::BoolishValueParser::new())]
        enabled: bool,
    },
    /// Mark a chat as read
    Read {
        chat: ChatId,
    },
    /// List products
    Products,
    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// List orders, newest first
    Orders,
    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Show dashboard stats
    Stats,
}

#[derive(Subcommand)]
enum DemoAction {
    /// Seed the store if it is empty
    Init,
    /// Replace all demo data with fresh seed data
    Reset,
    /// Write the whole store as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Replace the store with an exported JSON file
    Import {
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Add a product
    Add {
        #[arg(short, long)]
        name: String,
        /// Price, e.g. 19.99
        #[arg(short, long)]
        price: Decimal,
        #[arg(short, long, default_value = "General")]
        category: String,
        #[arg(short, long, default_value_t = 0)]
        quantity: u32,
    },
    /// Delete a product
    Delete {
        id: ProductId,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Change fulfillment status (`new`, `processing`, `completed`, `cancelled`)
    Status {
        id: OrderId,
        status: OrderStatus,
    },
    /// Change payment status (`pending`, `paid`, `cancelled`, `refunded`)
    Payment {
        id: OrderId,
        status: PaymentStatus,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "support_desk=info,support_desk_cli=info".into());

    // Logs go to stderr so command output on stdout stays machine-readable
    let json = std::env::var("SUPPORT_DESK_LOG_JSON").is_ok();
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = support_desk::ConsoleConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.demo.data_dir = dir;
    }

    let command = match cli.command {
        Commands::Demo { action } => {
            let demo = commands::demo::open(config)?;
            match action {
                DemoAction::Init => commands::demo::init(&demo)?,
                DemoAction::Reset => commands::demo::reset(&demo)?,
                DemoAction::Export { out } => commands::demo::export(&demo, out.as_deref())?,
                DemoAction::Import { file } => commands::demo::import(&demo, &file)?,
            }
            return Ok(());
        }
        command => command,
    };

    if cli.demo {
        config.demo.enabled = true;
    }
    let ctx = support_desk::AppContext::new(config)?;

    let result = match command {
        Commands::Demo { .. } => Ok(()),
        Commands::Chats => commands::console::chats(&ctx).await,
        Commands::Messages { chat } => commands::console::messages(&ctx, chat).await,
        Commands::Send {
            chat,
            text,
            product,
            wait,
        } => commands::console::send(&ctx, chat, &text, product, wait).await,
        Commands::Ai { chat, enabled } => commands::console::set_ai(&ctx, chat, enabled).await,
        Commands::Read { chat } => commands::console::mark_read(&ctx, chat).await,
        Commands::Products => commands::console::products(&ctx).await,
        Commands::Product { action } => match action {
            ProductAction::Add {
                name,
                price,
                category,
                quantity,
            } => commands::console::add_product(&ctx, &name, price, &category, quantity).await,
            ProductAction::Delete { id } => commands::console::delete_product(&ctx, id).await,
        },
        Commands::Orders => commands::console::orders(&ctx).await,
        Commands::Order { action } => match action {
            OrderAction::Status { id, status } => {
                commands::console::order_status(&ctx, id, status).await
            }
            OrderAction::Payment { id, status } => {
                commands::console::order_payment(&ctx, id, status).await
            }
        },
        Commands::Stats => commands::console::stats(&ctx).await,
    };

    ctx.shutdown();
    result.map_err(|e| e.user_message().into())
}
