use anyhow::Result;
use clap::{Parser, Subcommand};
use server_api::{
    seed::{seed_demo_content, upsert_account},
    ApiContext, AuthConfig,
};
use shared::domain::Identity;
use storage::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/blog.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates the account, or resets its password and identity.
    CreateAdmin {
        username: String,
        password: String,
        #[arg(long)]
        owner: bool,
    },
    SeedDemo,
    ListUsers {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;
    let ctx = ApiContext::new(storage, AuthConfig::default());

    match cli.command {
        Command::CreateAdmin {
            username,
            password,
            owner,
        } => {
            let identity = if owner { Identity::Owner } else { Identity::Admin };
            let user = upsert_account(&ctx, &username, &password, identity).await?;
            println!("account {} ({}) is {}", user.username, user.id, user.identity);
        }
        Command::SeedDemo => {
            let created = seed_demo_content(&ctx).await?;
            println!("seeded {created} articles");
        }
        Command::ListUsers { limit } => {
            for user in ctx.storage.list_users(limit).await? {
                println!("{}  {}  {}", user.id, user.username, user.identity);
            }
        }
    }

    Ok(())
}
