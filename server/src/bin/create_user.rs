//! Operator tool: create an admin user, rotate a password, or list the
//! accounts on file.
//!
//! Usage:
//!   create_user <username> <password> <region>... [--super]
//!   create_user --change-password <username> <password>
//!   create_user --list

use anyhow::{Context, Result, bail};
use app_core::{AdminLevel, AppConfig, CoreBuilder, DbpUser};
use db_postgres::PgDb;
use std::{env, sync::Arc};
use url::Url;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        bail!(
            "usage: create_user <username> <password> <region>... [--super] | --change-password <username> <password> | --list"
        );
    }

    let config = AppConfig::from_env()?;
    let database_url =
        Url::parse(&config.database_url).context("DATABASE_URL must be a valid url")?;
    let db = PgDb::connect(database_url).await?;
    db.migrate_to_latest().await?;
    let core = CoreBuilder::new()
        .set_db(Arc::new(db))
        .set_config(config)
        .build();

    if args[0] == "--list" {
        for user in core.database.get_all_users().await? {
            let level = match user.admin_level {
                Some(AdminLevel::Super) => " (super)",
                _ => "",
            };
            println!(
                "{}{} -> {:?}",
                user.username, level, user.admin_regions
            );
        }
        return Ok(());
    }

    if args[0] == "--change-password" {
        let [_, username, password] = args.as_slice() else {
            bail!("usage: create_user --change-password <username> <password>");
        };
        core.change_password(username, password)
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        println!("password changed for {username}");
        return Ok(());
    }

    let admin_level = if args.iter().any(|a| a == "--super") {
        Some(AdminLevel::Super)
    } else {
        Some(AdminLevel::Region)
    };
    let positional: Vec<String> = args.iter().filter(|a| *a != "--super").cloned().collect();
    let [username, password, regions @ ..] = positional.as_slice() else {
        bail!("usage: create_user <username> <password> <region>... [--super]");
    };
    if regions.is_empty() {
        bail!("at least one admin region is required");
    }

    let user = core
        .create_user(username, password, regions, admin_level)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    println!(
        "created user {} administering {:?}",
        user.username, user.admin_regions
    );
    Ok(())
}
