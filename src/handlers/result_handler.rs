use actix_web::{get, web, HttpResponse};
use validator::Validate;

use crate::{app_state::AppState, errors::AppError, models::dto::request::PaginationParams};

#[get("/api/results/{user_id}")]
async fn list_results(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    let pagination = query.into_inner();
    pagination.validate()?;

    let page = state
        .test_result_service
        .list_results(&user_id, pagination.offset, pagination.limit)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/api/results/{user_id}/{result_id}")]
async fn get_result(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (user_id, result_id) = path.into_inner();
    let result = state.test_result_service.get_result(&result_id).await?;
    if result.user_id != user_id {
        return Err(AppError::NotFound(format!(
            "Test result '{}' not found",
            result_id
        )));
    }
    Ok(HttpResponse::Ok().json(result))
}
