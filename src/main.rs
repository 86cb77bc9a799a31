// Stockguard - Main Entry Point
//
// CLI for the warehouse dashboard security core:
// - serve: run the rate-limited HTTP boundary
// - check-permission: evaluate a role/action/resource combination
// - check-route: evaluate route access for a role

use anyhow::Result;
use clap::{Parser, Subcommand};
use stockguard::authz::{
    AuthLookupError, AuthProvider, AuthorizationService, Profile, Role, RouteGuard, RouteTable,
    Session,
};
use stockguard::config::Config;
use stockguard::server;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Stockguard: rate limiting and RBAC for the warehouse dashboard
#[derive(Parser, Debug)]
#[command(name = "stockguard")]
#[command(version = "0.1.0")]
#[command(about = "Rate limiting and role-based authorization core", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to a config file (defaults to the XDG config directory)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Check whether a role may perform an action on a resource
    CheckPermission {
        /// Role name, e.g. "storeman"
        role: String,
        /// Action, e.g. "issue"
        action: String,
        /// Resource, e.g. "inventory"
        resource: String,
    },
    /// Check whether a role may view a route
    CheckRoute {
        /// Route path, e.g. "/settings"
        path: String,
        /// Role name, e.g. "clerk"
        role: String,
    },
}

/// Fixed-session provider for operator spot checks
struct StaticAuth {
    role: Role,
}

#[async_trait::async_trait]
impl AuthProvider for StaticAuth {
    async fn session(&self) -> Result<Option<Session>, AuthLookupError> {
        Ok(Some(Session {
            user_id: uuid::Uuid::new_v4(),
        }))
    }

    async fn profile(&self, _user_id: uuid::Uuid) -> Result<Profile, AuthLookupError> {
        Ok(Profile { role: self.role })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(filter.into())
                .from_env_lossy(),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    match args.command {
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.server.port = port;
            }
            info!("Starting stockguard server...");
            server::serve(&config).await?;
        }
        Some(Commands::CheckPermission {
            role,
            action,
            resource,
        }) => {
            let authz = AuthorizationService::new();
            let allowed = authz.validate_action(&role, &action, &resource)?;
            println!(
                "{} may{} {} {}",
                role,
                if allowed { "" } else { " NOT" },
                action,
                resource
            );
        }
        Some(Commands::CheckRoute { path, role }) => {
            let role: Role = role
                .parse()
                .map_err(|err| anyhow::anyhow!("{err}"))?;
            let guard = RouteGuard::new(
                std::sync::Arc::new(StaticAuth { role }),
                RouteTable::default(),
            );
            let decision = guard.check(&path, None).await;
            println!("{decision:?}");
        }
        None => {
            info!("No command specified. Use \"stockguard --help\" for usage.");
        }
    }

    Ok(())
}
