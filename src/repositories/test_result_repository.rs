use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::TestResult,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestResultRepository: Send + Sync {
    async fn create(&self, result: TestResult) -> AppResult<TestResult>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<TestResult>>;
    async fn has_attempted(&self, user_id: &str, configuration_id: &str) -> AppResult<bool>;
    async fn find_by_user(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<TestResult>, i64)>;
}

pub struct MongoTestResultRepository {
    collection: Collection<TestResult>,
}

impl MongoTestResultRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.results(),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for test results collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // One result per generated test
        let attempt_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "configuration_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_configuration_unique".to_string())
                    .build(),
            )
            .build();

        let history_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "submitted_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_history".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(attempt_index).await?;
        self.collection.create_index(history_index).await?;

        log::info!("Successfully created indexes for test results collection");
        Ok(())
    }
}

#[async_trait]
impl TestResultRepository for MongoTestResultRepository {
    async fn create(&self, result: TestResult) -> AppResult<TestResult> {
        if self
            .has_attempted(&result.user_id, &result.configuration_id)
            .await?
        {
            return Err(AppError::AlreadyExists(format!(
                "Result for configuration '{}' already stored",
                result.configuration_id
            )));
        }
        self.collection.insert_one(&result).await?;
        Ok(result)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<TestResult>> {
        let result = self.collection.find_one(doc! { "id": id }).await?;
        Ok(result)
    }

    async fn has_attempted(&self, user_id: &str, configuration_id: &str) -> AppResult<bool> {
        let result = self
            .collection
            .find_one(doc! {
                "user_id": user_id,
                "configuration_id": configuration_id
            })
            .await?;
        Ok(result.is_some())
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<TestResult>, i64)> {
        let filter = doc! { "user_id": user_id };

        let total = self.collection.count_documents(filter.clone()).await?;

        let results = self
            .collection
            .find(filter)
            .skip(offset.max(0) as u64)
            .limit(limit)
            .sort(doc! { "submitted_at": -1 })
            .await?
            .try_collect()
            .await?;

        Ok((results, total as i64))
    }
}
