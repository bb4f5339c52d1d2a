use clap::Args;

/// Parameters used to config MongoDB.
#[derive(Debug, Clone, Args)]
#[group()]
pub struct MongoDBCliArgs {
    /// The connection string to the MongoDB server.
    #[arg(env = "ZKFLOW_MONGODB_CONNECTION_URL", long, default_value = "mongodb://localhost:27017")]
    pub mongodb_connection_url: String,

    /// The name of the database.
    #[arg(env = "ZKFLOW_DATABASE_NAME", long, default_value = "zkflow")]
    pub mongodb_database_name: String,
}
