use crate::cli::MigrateCmd;
use crate::core::client::database::DatabaseClient;
use crate::core::client::MongoDbClient;
use crate::types::params::database::DatabaseArgs;
use crate::OrchestratorResult;
use tracing::info;

/// Rewrite every circuit still stored with the deprecated `ready` status to `ready_for_deployment`.
/// Returns the number of rewritten circuits.
pub async fn migrate_legacy_status(database: &dyn DatabaseClient) -> OrchestratorResult<u64> {
    let migrated = database.migrate_legacy_circuit_status().await?;
    info!(migrated, "Legacy circuit statuses migrated");
    Ok(migrated)
}

pub async fn migrate(migrate_cmd: &MigrateCmd) -> OrchestratorResult<u64> {
    let database_args: DatabaseArgs = migrate_cmd.mongodb_args.clone().into();
    let database = MongoDbClient::new(&database_args).await?;
    migrate_legacy_status(&database).await
}
