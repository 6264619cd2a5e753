use std::sync::Arc;

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand};
use dotenvy::dotenv;
use uuid::Uuid;

use epes_auth::db;
use epes_auth::jwt::TokenIssuer;
use epes_auth::reconciler::Reconciler;
use epes_auth::store::{AuthStore, SqliteStore};
use epes_auth::utils::{utc_now, PasswordHasher};

#[derive(Parser, Debug)]
#[command(author, version, about = "epes-auth operator tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the stored digest for a password (uses PRIVATE_KEY)
    HashPassword { password: String },
    /// Mint a session token for a user through the regular issuer
    IssueToken { user_id: Uuid },
    /// Grant or revoke an action type for a role
    SetPermission {
        #[arg(long)]
        role: Uuid,
        #[arg(long)]
        action: Uuid,
        #[command(flatten)]
        desired: Desired,
    },
    /// Assign or unassign a role for a user
    SetRole {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        role: Uuid,
        #[command(flatten)]
        desired: Desired,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("state").required(true).args(["on", "off"])))]
struct Desired {
    #[arg(long)]
    on: bool,
    #[arg(long)]
    off: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD first, then fall back to the crate-local `.env`.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::HashPassword { password } => {
            let hasher = PasswordHasher::from_env()?;
            println!("{}", hasher.hash(&password));
        }
        Commands::IssueToken { user_id } => {
            let store = open_store().await?;
            let issuer = TokenIssuer::from_env()?;
            let session = issuer
                .issue(store.as_ref(), user_id, utc_now())
                .await
                .with_context(|| format!("could not issue a token for {user_id}"))?;
            println!("{}", session.token);
        }
        Commands::SetPermission { role, action, desired } => {
            let store = open_store().await?;
            let outcome = Reconciler::new(store.as_ref()).set_grant(role, action, desired.on).await?;
            println!("role permission {outcome}");
        }
        Commands::SetRole { user, role, desired } => {
            let store = open_store().await?;
            let outcome = Reconciler::new(store.as_ref()).set_assignment(user, role, desired.on).await?;
            println!("user role {outcome}");
        }
    }

    Ok(())
}

async fn open_store() -> anyhow::Result<Arc<dyn AuthStore>> {
    let pool = db::init().await.context("failed to open the database")?;
    Ok(Arc::new(SqliteStore::new(pool)))
}
