//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "user-service")]
#[command(about = "User account administration")]
pub struct Cli {
    /// Database URL (overrides USER_SERVICE_DATABASE_URL / DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
    /// Manage user accounts
    Users {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Inspect roles
    Roles {
        #[command(subcommand)]
        action: RoleCommands,
    },
    /// Authentication helpers
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
}

#[derive(Subcommand, Clone, Copy)]
pub enum MigrateCommands {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List all users
    List,
    /// Show one user
    Show(UserSelector),
    /// Create a user
    Create(CreateUserArgs),
    /// Update a user
    Update(UpdateUserArgs),
    /// Delete a user and its role associations
    Delete {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct UserSelector {
    #[arg(long)]
    pub id: Option<Uuid>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(Args)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long, default_value = "")]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    /// Plaintext password, or an already encoded hash
    #[arg(long, env = "USER_SERVICE_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Authority name to grant (repeatable)
    #[arg(long = "role")]
    pub roles: Vec<String>,
}

#[derive(Args)]
pub struct UpdateUserArgs {
    #[arg(long)]
    pub id: Uuid,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// New password; omitted keeps the current one. Never read from the
    /// environment.
    #[arg(long)]
    pub password: Option<String>,
    /// Replace the role set with these authorities (repeatable)
    #[arg(long = "role", conflicts_with = "clear_roles")]
    pub roles: Vec<String>,
    /// Remove every role from the user
    #[arg(long)]
    pub clear_roles: bool,
}

impl UpdateUserArgs {
    /// Role replacement requested on the command line, if any
    pub fn role_names(&self) -> Option<Vec<String>> {
        if self.clear_roles {
            Some(Vec::new())
        } else if self.roles.is_empty() {
            None
        } else {
            Some(self.roles.clone())
        }
    }
}

#[derive(Subcommand)]
pub enum RoleCommands {
    /// List all roles
    List,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Verify a login and print the resulting principal
    Check {
        /// Username or email
        #[arg(long)]
        login: String,
        #[arg(long, env = "USER_SERVICE_PASSWORD", hide_env_values = true)]
        password: String,
    },
}
