use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};
use std::time::Duration;

use crate::{config::Config, errors::AppResult, models::domain::TestResult};

const APP_NAME: &str = "mcq-proctor-server";

/// Mongo handle scoped to the configured database and results collection.
#[derive(Clone)]
pub struct Database {
    client: Client,
    db_name: String,
    results_collection: String,
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut client_options = ClientOptions::parse(&config.mongo_conn_string).await?;
        apply_client_settings(&mut client_options, config);

        let client = Client::with_options(client_options)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        log::info!(
            "Connected to MongoDB database '{}' (pool {}..{})",
            config.mongo_db_name,
            config.mongo_min_pool_size,
            config.mongo_max_pool_size
        );

        Ok(Self {
            client,
            db_name: config.mongo_db_name.clone(),
            results_collection: config.results_collection.clone(),
        })
    }

    /// Submitted test results, one document per scored submission.
    pub fn results(&self) -> Collection<TestResult> {
        self.client
            .database(&self.db_name)
            .collection(&self.results_collection)
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// A min pool larger than the max is clamped down to it.
fn apply_client_settings(options: &mut ClientOptions, config: &Config) {
    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    options.server_api = Some(server_api);
    options.app_name = Some(APP_NAME.to_string());
    options.max_pool_size = Some(config.mongo_max_pool_size);
    options.min_pool_size = Some(config.mongo_min_pool_size.min(config.mongo_max_pool_size));
    options.connect_timeout = Some(Duration::from_secs(config.mongo_timeout_secs));
    options.server_selection_timeout = Some(Duration::from_secs(config.mongo_timeout_secs));
}
