//! Command implementations for the `user-service` binary.

use std::error::Error;

use serde::Serialize;
use tracing::info;

use domain::{NewUser, UpdateUser, UserResponse};

use crate::cli::{AuthCommands, Commands, MigrateCommands, RoleCommands, UserCommands, UserSelector};
use crate::config::UserServiceConfig;
use crate::infra::Database;
use crate::Services;

type CommandResult = Result<(), Box<dyn Error>>;

/// Dispatch a parsed command.
pub async fn execute(command: Commands, config: UserServiceConfig) -> CommandResult {
    match command {
        Commands::Migrate { action } => run_migrations(action, &config).await,
        Commands::Users { action } => run_users(&connect(&config).await?, action).await,
        Commands::Roles { action } => run_roles(&connect(&config).await?, action).await,
        Commands::Auth { action } => run_auth(&connect(&config).await?, action).await,
    }
}

async fn connect(config: &UserServiceConfig) -> Result<Services, Box<dyn Error>> {
    let db = Database::connect(&config.database).await?;
    Ok(Services::from_connection(db.get_connection()))
}

async fn run_migrations(action: MigrateCommands, config: &UserServiceConfig) -> CommandResult {
    let db = Database::open(&config.database).await?;

    match action {
        MigrateCommands::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateCommands::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateCommands::Status => {
            let status = db.migration_status().await?;
            for migration in status {
                let marker = if migration.applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, migration.name);
            }
        }
        MigrateCommands::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

async fn run_users(services: &Services, action: UserCommands) -> CommandResult {
    match action {
        UserCommands::List => {
            let users = services.users.list_users().await?;
            let views: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
            print_json(&views)?;
        }
        UserCommands::Show(selector) => {
            let UserSelector {
                id,
                username,
                email,
            } = selector;
            let user = match (id, username, email) {
                (Some(id), _, _) => Some(services.users.get_user(id).await?),
                (_, Some(username), _) => services.users.find_by_username(&username).await?,
                (_, _, Some(email)) => services.users.find_by_email(&email).await?,
                (None, None, None) => None,
            };

            match user {
                Some(user) => print_json(&UserResponse::from(user))?,
                None => return Err("User not found".into()),
            }
        }
        UserCommands::Create(args) => {
            let input = NewUser {
                username: args.username,
                email: args.email,
                first_name: args.first_name,
                last_name: args.last_name,
                password: args.password,
            };
            let roles = (!args.roles.is_empty()).then_some(args.roles);

            let user = services.users.create_user(input, roles).await?;
            print_json(&UserResponse::from(user))?;
        }
        UserCommands::Update(args) => {
            let current = services.users.get_user(args.id).await?;
            let role_names = args.role_names();

            // Profile fields are overwritten wholesale; start from the
            // stored values and apply the flags that were given.
            let mut patch = UpdateUser::from(&current);
            if let Some(username) = args.username {
                patch.username = username;
            }
            if let Some(email) = args.email {
                patch.email = Some(email);
            }
            if let Some(first_name) = args.first_name {
                patch.first_name = first_name;
            }
            if let Some(last_name) = args.last_name {
                patch.last_name = last_name;
            }
            patch.password = args.password;

            let user = services
                .users
                .update_user(args.id, patch, role_names)
                .await?;
            print_json(&UserResponse::from(user))?;
        }
        UserCommands::Delete { id } => {
            services.users.delete_user(id).await?;
            info!(user_id = %id, "Delete completed");
        }
    }

    Ok(())
}

async fn run_roles(services: &Services, action: RoleCommands) -> CommandResult {
    match action {
        RoleCommands::List => {
            for role in services.roles.list_roles().await? {
                println!("{}\t{}", role.id, role.authority);
            }
        }
    }

    Ok(())
}

async fn run_auth(services: &Services, action: AuthCommands) -> CommandResult {
    match action {
        AuthCommands::Check { login, password } => {
            let principal = services.auth.authenticate(&login, &password).await?;
            print_json(&principal)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
