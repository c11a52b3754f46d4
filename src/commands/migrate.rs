use sea_orm::{DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::{
    boot::BootError,
    cli::MigrateAction,
    config::Config,
    database::{setup_database_connection, Migrator},
};

pub async fn handle_migrate_command(config: &Config, action: MigrateAction) -> Result<(), BootError> {
    // Plain connection: migrations are driven by the command, not by boot
    let db = setup_database_connection(&config.database).await?;

    run_migration_action(&db, action).await?;
    Ok(())
}

fn print_names<'a>(marker: &str, migrations: impl Iterator<Item = &'a str>) {
    for name in migrations {
        println!("  {marker} {name}");
    }
}

fn steps_u32(count: usize) -> Result<u32, DbErr> {
    u32::try_from(count).map_err(|_| DbErr::Custom("too many migrations".to_string()))
}

pub async fn run_migration_action(db: &DatabaseConnection, action: MigrateAction) -> Result<(), DbErr> {
    match action {
        MigrateAction::Up { steps } => {
            let pending = Migrator::get_pending_migrations(db).await?;
            if pending.is_empty() {
                println!("✅ All migrations are already up to date");
                return Ok(());
            }

            let count = steps.map_or(pending.len(), |steps| (steps as usize).min(pending.len()));
            println!("Running {count} migration(s) up:");
            print_names("📄", pending[..count].iter().map(|m| m.name()));
            println!();

            Migrator::up(db, Some(steps_u32(count)?)).await?;
            println!("✅ Migrations completed successfully");
        }
        MigrateAction::Down { steps } => {
            let applied = Migrator::get_applied_migrations(db).await?;
            if applied.is_empty() {
                println!("❌ No migrations to roll back");
                return Ok(());
            }

            let count = (steps as usize).min(applied.len());
            println!("Rolling back {count} migration(s):");
            print_names("📄", applied.iter().rev().take(count).map(|m| m.name()));
            println!();

            Migrator::down(db, Some(steps_u32(count)?)).await?;
            println!("✅ Rollback completed successfully");
        }
        MigrateAction::Status => {
            let applied = Migrator::get_applied_migrations(db).await?;
            let pending = Migrator::get_pending_migrations(db).await?;

            println!("📋 Applied migrations:");
            print_names("✓", applied.iter().map(|m| m.name()));

            if pending.is_empty() {
                println!("✅ All migrations are up to date");
            } else {
                println!("📋 Pending migrations:");
                print_names("-", pending.iter().map(|m| m.name()));
            }
        }
        MigrateAction::Reset => {
            println!("🔄 Resetting database (this will drop all data!)...");

            let applied = Migrator::get_applied_migrations(db).await?;
            if !applied.is_empty() {
                print_names("📄", applied.iter().rev().map(|m| m.name()));
                Migrator::down(db, Some(steps_u32(applied.len())?)).await?;
                println!("✅ All migrations rolled back");
            }

            Migrator::up(db, None).await?;
            println!("✅ Database reset completed successfully");
        }
        MigrateAction::Reapply { steps } => {
            let applied = Migrator::get_applied_migrations(db).await?;
            if applied.is_empty() {
                println!("❌ No migrations to reapply");
                return Ok(());
            }

            let count = steps_u32((steps as usize).min(applied.len()))?;
            println!("🔄 Reapplying {count} migration(s):");
            print_names("📄", applied.iter().rev().take(count as usize).map(|m| m.name()));

            Migrator::down(db, Some(count)).await?;
            Migrator::up(db, Some(count)).await?;
            println!("✅ Reapply completed successfully");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    async fn connection() -> DatabaseConnection {
        setup_database_connection(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            pool_size: 1,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_up_then_down_leaves_nothing_applied() {
        let db = connection().await;

        run_migration_action(&db, MigrateAction::Up { steps: None })
            .await
            .unwrap();
        assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());

        run_migration_action(&db, MigrateAction::Down { steps: 1 })
            .await
            .unwrap();
        assert!(Migrator::get_applied_migrations(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_reapplies_everything() {
        let db = connection().await;
        run_migration_action(&db, MigrateAction::Up { steps: None })
            .await
            .unwrap();

        run_migration_action(&db, MigrateAction::Reset).await.unwrap();

        assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());
    }
}
