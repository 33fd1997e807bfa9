//! Schema migrations.
//!
//! Each version `NN` has a pair of files in this directory:
//! - `migration_NN_up.sql` takes the schema from `NN-1` to `NN`
//! - `migration_NN_down.sql` takes the schema from `NN` back to `NN-1`

use anyhow::{bail, Context};
use sqlx::{Executor, SqlitePool};
use tracing::debug;

use crate::Result;

struct Migration {
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

/// The schema version that this build of the program expects.
pub(crate) const CURRENT_VERSION: i32 = 1;

enum Direction {
    Up,
    Down,
}

/// Moves the schema from `from` to `to`, one version at a time. Every step runs in its own
/// transaction together with the `schema_version` update, so a failure leaves the database at
/// the last version that completed.
pub(crate) async fn run(pool: &SqlitePool, from: i32, to: i32) -> Result<()> {
    if from == to {
        debug!("Schema is at version {to}, nothing to migrate");
        return Ok(());
    }
    check_available(from, to)?;

    let steps: Vec<(i32, Direction)> = if from < to {
        ((from + 1)..=to).map(|v| (v, Direction::Up)).collect()
    } else {
        ((to + 1)..=from).rev().map(|v| (v, Direction::Down)).collect()
    };

    for (version, direction) in steps {
        let migration = find(version)?;
        let (sql, resulting) = match direction {
            Direction::Up => (migration.up_sql, version),
            Direction::Down => (migration.down_sql, version - 1),
        };
        debug!("Migrating schema to version {resulting:02}");
        apply(pool, sql, resulting).await?;
    }

    debug!("Schema is now at version {to}");
    Ok(())
}

fn find(version: i32) -> Result<&'static Migration> {
    MIGRATIONS
        .iter()
        .find(|m| m.version == version)
        .with_context(|| format!("Migration {version} not found"))
}

async fn apply(pool: &SqlitePool, sql: &str, resulting: i32) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Unable to begin migration transaction")?;

    tx.execute(sql)
        .await
        .with_context(|| format!("Migration to version {resulting} failed"))?;

    sqlx::query("DELETE FROM schema_version")
        .execute(&mut *tx)
        .await
        .context("Unable to clear schema_version")?;
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(resulting)
        .execute(&mut *tx)
        .await
        .context("Unable to record schema_version")?;

    tx.commit()
        .await
        .context("Unable to commit migration transaction")?;
    Ok(())
}

/// Fails before anything runs if a version between `from` and `to` has no migration.
fn check_available(from: i32, to: i32) -> Result<()> {
    let (low, high) = if from < to { (from + 1, to) } else { (to + 1, from) };
    for version in low..=high {
        if !MIGRATIONS.iter().any(|m| m.version == version) {
            bail!("Cannot migrate from version {from} to {to}: migration {version} is missing");
        }
    }
    Ok(())
}
