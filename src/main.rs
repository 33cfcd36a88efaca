//! EcoMarket chat - product conversations for a sustainability marketplace
//!
//! A terminal client for listing products and chatting with other users
//! about them.

mod api;
mod auth;
mod config;
mod models;
mod rooms;
mod store;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::models::Sustainability;
use crate::store::{NewProduct, ProductEdit};

#[derive(Parser)]
#[command(name = "ecomarket-chat")]
#[command(about = "Chat with buyers and sellers about sustainable products", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as a marketplace user
    Login {
        /// E-mail address
        #[arg(short, long)]
        email: String,

        /// Display name (defaults to the part of the e-mail before '@')
        #[arg(short, long)]
        name: Option<String>,

        /// Use this user ID instead of issuing one
        #[arg(long)]
        user_id: Option<String>,

        /// Issue a new user ID even if this e-mail already has one
        #[arg(short, long)]
        force: bool,
    },

    /// Sign out
    Logout,

    /// Show current sign-in status
    Status,

    /// Show current user info
    Whoami,

    /// List your chats, most recent first
    Chats,

    /// Read the conversation with another user
    Read {
        /// User ID of the other participant
        #[arg(short, long)]
        with: String,

        /// Product the conversation is about
        #[arg(short, long)]
        product: Option<String>,

        /// Maximum number of messages to show
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Keep printing new messages until Ctrl+C
        #[arg(short, long)]
        follow: bool,
    },

    /// Send a message
    Send {
        /// User ID of the recipient
        #[arg(short, long)]
        to: String,

        /// Product the conversation is about
        #[arg(short, long)]
        product: Option<String>,

        /// Message content
        message: String,
    },

    /// Attach a translation to a message
    Translate {
        /// Message ID (shown by `read --verbose`)
        message_id: String,

        /// Translated text
        text: String,
    },

    /// Follow your inbox as new messages arrive
    Watch,

    /// Manage product listings
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },
}

#[derive(Subcommand)]
enum ProductCommands {
    /// List products
    List {
        /// Only show your own listings
        #[arg(short, long)]
        mine: bool,
    },

    /// List a new product
    Add(AddProductArgs),

    /// Change name, description or price of one of your products
    Edit {
        /// Product ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        price: Option<String>,
    },

    /// Remove one of your products
    Remove {
        /// Product ID
        id: String,
    },
}

#[derive(Args)]
struct AddProductArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    description: String,

    /// Price as it should be shown to buyers
    #[arg(long)]
    price: String,

    /// URL of an already uploaded image
    #[arg(long)]
    image_url: Option<String>,

    /// Material the product is made of (repeatable)
    #[arg(long = "material")]
    materials: Vec<String>,

    /// Estimated carbon footprint in kg CO2e
    #[arg(long)]
    carbon_kg: Option<f64>,

    /// The product can be recycled
    #[arg(long)]
    recyclable: bool,

    /// Sustainability certification (repeatable)
    #[arg(long = "certification")]
    certifications: Vec<String>,
}

impl From<AddProductArgs> for NewProduct {
    fn from(args: AddProductArgs) -> Self {
        NewProduct {
            name: args.name,
            description: args.description,
            price: args.price,
            image_url: args.image_url,
            sustainability: Sustainability {
                materials: args.materials,
                carbon_footprint_kg: args.carbon_kg,
                recyclable: args.recyclable,
                certifications: args.certifications,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Login {
            email,
            name,
            user_id,
            force,
        } => {
            auth::login(&email, name.as_deref(), user_id.as_deref(), force)?;
        }
        Commands::Logout => {
            auth::logout()?;
        }
        Commands::Status => {
            auth::status()?;
        }
        Commands::Whoami => {
            api::whoami()?;
        }
        Commands::Chats => {
            tracing::debug!("Projecting inbox...");
            api::list_chats()?;
        }
        Commands::Read {
            with,
            product,
            limit,
            follow,
        } => {
            api::read_messages(&with, product.as_deref(), limit, follow).await?;
        }
        Commands::Send {
            to,
            product,
            message,
        } => {
            tracing::debug!("Sending message...");
            api::send_message(&to, product.as_deref(), &message)?;
        }
        Commands::Translate { message_id, text } => {
            api::translate_message(&message_id, &text)?;
        }
        Commands::Watch => {
            api::watch().await?;
        }
        Commands::Products { command } => match command {
            ProductCommands::List { mine } => {
                api::list_products(mine)?;
            }
            ProductCommands::Add(args) => {
                api::add_product(args.into())?;
            }
            ProductCommands::Edit {
                id,
                name,
                description,
                price,
            } => {
                api::edit_product(
                    &id,
                    ProductEdit {
                        name,
                        description,
                        price,
                    },
                )?;
            }
            ProductCommands::Remove { id } => {
                api::remove_product(&id)?;
            }
        },
    }

    Ok(())
}
