use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Schema as GraphQLSchema, ID};

use crate::{
    app_state::AppState,
    errors::AppResult,
    models::{domain::TestResult, dto::response::ResultPage},
    services::answer_navigator::NavigatorView,
};

pub type Schema = GraphQLSchema<QueryRoot, EmptyMutation, EmptySubscription>;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Progress grid of the user's current test.
    async fn navigator(&self, ctx: &Context<'_>, user_id: String) -> AppResult<NavigatorView> {
        let state = ctx.data::<AppState>()?;
        let session = state.session_registry.get(&user_id).await?;
        Ok(session.navigator().await)
    }

    async fn test_results(
        &self,
        ctx: &Context<'_>,
        user_id: String,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> AppResult<ResultPage> {
        let state = ctx.data::<AppState>()?;
        state
            .test_result_service
            .list_results(&user_id, offset, limit)
            .await
    }

    async fn test_result(&self, ctx: &Context<'_>, id: ID) -> AppResult<TestResult> {
        let state = ctx.data::<AppState>()?;
        state.test_result_service.get_result(&id).await
    }

    async fn has_attempted(
        &self,
        ctx: &Context<'_>,
        user_id: String,
        configuration_id: ID,
    ) -> AppResult<bool> {
        let state = ctx.data::<AppState>()?;
        state
            .test_result_service
            .has_attempted(&user_id, &configuration_id)
            .await
    }
}

pub fn create_schema(app_state: AppState) -> Schema {
    GraphQLSchema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(app_state)
        .finish()
}
