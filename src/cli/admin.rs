use tracing::info;
use crate::auth::{hash_password, Role};
use crate::cli::commands::CreateAdminArgs;
use crate::config::VulnscanConfig;
use crate::db::{Database, NewUser};
use crate::errors::VulnscanError;

/// Bootstraps an admin directly in the database, bypassing the API.
pub fn handle_create_admin(args: CreateAdminArgs, config: &VulnscanConfig) -> Result<(), VulnscanError> {
    let username = args.username.trim();
    let email = args.email.trim();
    if username.is_empty() || email.is_empty() || args.password.is_empty() {
        return Err(VulnscanError::Validation(
            "username, email and password must not be empty".into(),
        ));
    }

    let db = Database::new(&config.database.path)?;
    let existing = db.count_admins()?;
    let password_hash = hash_password(&args.password)?;
    let id = db.create_user(&NewUser {
        username,
        email,
        password_hash: &password_hash,
        role: Role::Admin,
        comment: None,
    })?;

    info!(user_id = id, username = %username, existing_admins = existing, "Admin account created");
    println!("Created admin '{}' (id {})", username, id);
    Ok(())
}
