//! Ecom CLI - Talk to the e-commerce backend from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (storefront or dashboard)
//! ecom login -e shopper@example.com -p secret
//! ecom login -e admin@example.com -p secret --admin
//!
//! # Inspect the stored session
//! ecom status
//! ecom profile
//!
//! # Authenticated requests (tokens refresh transparently)
//! ecom get /products -q page=1 -q size=5
//! ecom upload ./front.png ./back.jpg
//!
//! # Sign out
//! ecom logout
//! ```
//!
//! # Environment Variables
//!
//! - `ECOM_API_BASE_URL` - Backend base URL (default `http://localhost:8080/api/v1`)
//! - `ECOM_API_TIMEOUT_SECS` - Request timeout in seconds (default `10`)
//! - `ECOM_LOGIN_ROUTE` - Route reported when the session ends (default `/login`)
//! - `ECOM_CREDENTIALS_PATH` - Session file (default `.ecom/credentials.json`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "ecom")]
#[command(author, version, about = "Ecom backend CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// Use the dashboard (admin/staff) login
        #[arg(long)]
        admin: bool,
    },
    /// Register a customer account
    Register {
        /// Full name
        #[arg(short = 'n', long)]
        full_name: String,

        /// Date of birth (`YYYY-MM-DD`)
        #[arg(short, long)]
        date_of_birth: String,

        /// Phone number
        #[arg(long)]
        phone: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out on the backend and forget the stored session
    Logout,
    /// Fetch and cache the signed-in user's profile
    Profile,
    /// Show the stored session without contacting the backend
    Status,
    /// Send an authenticated GET and print the JSON response
    Get {
        /// Path below the API base URL, e.g. `/products`
        path: String,

        /// Query parameter as `key=value` (repeatable)
        #[arg(short, long = "query", value_parser = commands::request::parse_query_pair)]
        query: Vec<(String, String)>,
    },
    /// Upload image files and print their URLs
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ecom_client=info,ecom_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context::from_env()?;

    match cli.command {
        Commands::Login {
            email,
            password,
            admin,
        } => commands::auth::login(&ctx, email, password, admin).await?,
        Commands::Register {
            full_name,
            date_of_birth,
            phone,
            email,
            password,
        } => {
            commands::auth::register(&ctx, full_name, date_of_birth, phone, email, password)
                .await?;
        }
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Profile => commands::auth::profile(&ctx).await?,
        Commands::Status => commands::auth::status(&ctx)?,
        Commands::Get { path, query } => commands::request::get(&ctx, &path, &query).await?,
        Commands::Upload { files } => commands::request::upload(&ctx, &files).await?,
    }
    Ok(())
}
