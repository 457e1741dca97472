//! Database seeder for Firecert.
//!
//! Creates the first admin account and a demo inspector. Existing accounts
//! are left untouched, so the seeder can be re-run safely.
//!
//! Usage: cargo run --bin seeder
//!
//! Reads `DATABASE_URL`, plus `SEED_ADMIN_EMAIL` / `SEED_ADMIN_PASSWORD` and
//! `SEED_INSPECTOR_EMAIL` / `SEED_INSPECTOR_PASSWORD` when set.

use anyhow::Context;
use firecert_core::auth::{Role, check_password_policy, hash_password};
use firecert_db::{NewProfile, ProfileRepository};

const DEFAULT_ADMIN_EMAIL: &str = "admin@firecert.dev";
const DEFAULT_INSPECTOR_EMAIL: &str = "inspector@firecert.dev";
const DEFAULT_PASSWORD: &str = "ChangeMe123!";

struct SeedAccount {
    email: String,
    password: String,
    first_name: &'static str,
    last_name: &'static str,
    role: Role,
    position: Option<&'static str>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    println!("Connecting to database...");
    let db = firecert_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    let profiles = ProfileRepository::new(db);

    let accounts = [
        SeedAccount {
            email: env_or("SEED_ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL),
            password: env_or("SEED_ADMIN_PASSWORD", DEFAULT_PASSWORD),
            first_name: "System",
            last_name: "Administrator",
            role: Role::Admin,
            position: None,
        },
        SeedAccount {
            email: env_or("SEED_INSPECTOR_EMAIL", DEFAULT_INSPECTOR_EMAIL),
            password: env_or("SEED_INSPECTOR_PASSWORD", DEFAULT_PASSWORD),
            first_name: "Demo",
            last_name: "Inspector",
            role: Role::Inspector,
            position: Some("FO1"),
        },
    ];

    for account in accounts {
        println!("Seeding {} account...", account.role);
        seed_account(&profiles, account).await?;
    }

    println!("Seeding complete!");
    Ok(())
}

async fn seed_account(profiles: &ProfileRepository, account: SeedAccount) -> anyhow::Result<()> {
    if profiles.email_exists(&account.email).await? {
        println!("  {} already exists, skipping...", account.email);
        return Ok(());
    }

    check_password_policy(&account.password)
        .with_context(|| format!("password for {} is too weak", account.email))?;
    let password_hash = hash_password(&account.password)?;

    let profile = profiles
        .create(NewProfile {
            email: account.email,
            password_hash,
            first_name: account.first_name.to_string(),
            middle_name: None,
            last_name: account.last_name.to_string(),
            role: account.role,
            position: account.position.map(String::from),
        })
        .await?;

    println!("  Created {}: {}", profile.email, profile.id);
    Ok(())
}
