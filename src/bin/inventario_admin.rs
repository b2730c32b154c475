use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use inventario_api::{
    auth::Role,
    config::{self, AppConfig},
    db::{self, DbPool},
    services::{NewUser, SeedAccount, UserService},
};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "inventario-admin",
    about = "Schema and account administration for inventario-api",
    version
)]
struct Cli {
    /// Overrides the configured database URL
    #[arg(long, global = true, env = "APP__DATABASE_URL")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Apply migrations and create or refresh the stock accounts
    Bootstrap(BootstrapArgs),
    /// Create a single account
    CreateUser(CreateUserArgs),
    /// Change the role of an existing account
    SetRole(SetRoleArgs),
}

#[derive(Args)]
struct BootstrapArgs {
    #[arg(long, default_value = "admin123")]
    admin_password: String,
    #[arg(long, default_value = "productos 19")]
    productos_password: String,
    #[arg(long, default_value = "almacenes11")]
    almacenes_password: String,
}

#[derive(Args)]
struct CreateUserArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    password: String,
    /// ADMIN, PRODUCTOS or ALMACENES (case-insensitive)
    #[arg(long)]
    role: String,
}

#[derive(Args)]
struct SetRoleArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    role: String,
}

impl BootstrapArgs {
    fn accounts(&self) -> Vec<SeedAccount> {
        SeedAccount::defaults()
            .into_iter()
            .map(|mut account| {
                account.password = match account.role {
                    Role::Admin => self.admin_password.clone(),
                    Role::Productos => self.productos_password.clone(),
                    Role::Almacenes => self.almacenes_password.clone(),
                };
                account
            })
            .collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg: AppConfig = config::load_config().context("failed to load configuration")?;
    if let Some(url) = cli.database_url.clone() {
        cfg.database_url = url;
    }
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let pool: DbPool = db::establish_connection_from_app_config(&cfg)
        .await
        .map_err(|e| anyhow!(e.to_string()))
        .context("failed to connect to the database")?;
    let pool = Arc::new(pool);

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&pool)
                .await
                .map_err(|e| anyhow!(e.to_string()))
                .context("migration failed")?;
            println!("Migrations applied");
        }
        Commands::Bootstrap(args) => {
            let users = UserService::new(pool.clone());
            users
                .bootstrap(&args.accounts())
                .await
                .map_err(|e| anyhow!(e.to_string()))
                .context("bootstrap failed")?;
            println!("Stock accounts are in place");
        }
        Commands::CreateUser(args) => {
            db::run_migrations(&pool)
                .await
                .map_err(|e| anyhow!(e.to_string()))?;
            let users = UserService::new(pool.clone());
            let created = users
                .insert_user(NewUser {
                    name: args.name,
                    password: args.password,
                    role: args.role,
                })
                .await
                .map_err(|e| anyhow!(e.to_string()))
                .context("failed to create user")?;
            info!(user_id = created.id, "user created from CLI");
            println!("User {} created with role {} (id {})", created.name, created.role, created.id);
        }
        Commands::SetRole(args) => {
            let role = Role::parse(&args.role)?;
            let users = UserService::new(pool.clone());
            let updated = users
                .set_role(&args.name, role)
                .await
                .map_err(|e| anyhow!(e.to_string()))
                .context("failed to change role")?;
            println!("User {} now has role {}", updated.name, updated.role);
        }
    }

    Ok(())
}
