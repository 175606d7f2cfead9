use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    middleware::get_request_id,
    models::dto::{
        request::{
            ConfigureTestRequest, IntegrityEventRequest, QuestionIndexRequest,
            SelectAnswerRequest,
        },
        response::{ApiResponse, SubmitResponse},
    },
    services::test_session_service::SubmitOutcome,
};

#[post("/api/tests/{user_id}/configure")]
async fn configure_test(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    request: web::Json<ConfigureTestRequest>,
) -> Result<HttpResponse, AppError> {
    let session = state
        .session_registry
        .configure(&user_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(session.configuration().await))
}

#[post("/api/tests/{user_id}/start")]
async fn start_test(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let started = state.session_registry.start(&user_id).await?;
    Ok(HttpResponse::Ok().json(started))
}

#[post("/api/tests/{user_id}/select")]
async fn select_answer(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    request: web::Json<SelectAnswerRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let session = state.session_registry.get(&user_id).await?;
    session
        .select_answer(request.question_index, request.option_index)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/tests/{user_id}/commit")]
async fn commit_and_advance(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_registry.get(&user_id).await?;
    let current_index = session.commit_and_advance().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "current_index": current_index })))
}

#[post("/api/tests/{user_id}/clear")]
async fn clear_answer(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    request: web::Json<QuestionIndexRequest>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_registry.get(&user_id).await?;
    session.clear_answer(request.question_index).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/tests/{user_id}/mark")]
async fn toggle_mark_for_review(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    request: web::Json<QuestionIndexRequest>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_registry.get(&user_id).await?;
    let marked = session.toggle_mark_for_review(request.question_index).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "question_index": request.question_index,
        "marked": marked
    })))
}

#[post("/api/tests/{user_id}/jump")]
async fn jump_to(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    request: web::Json<QuestionIndexRequest>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_registry.get(&user_id).await?;
    session.jump_to(request.question_index).await?;
    Ok(HttpResponse::Ok().json(session.snapshot().await))
}

#[post("/api/tests/{user_id}/violations")]
async fn report_violation(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    request: web::Json<IntegrityEventRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let session = state.session_registry.get(&user_id).await?;
    let report = session
        .record_violation(request.into_inner().into_event(Utc::now()))
        .await;
    let message = report
        .warning()
        .map(|w| w.message.clone())
        .unwrap_or_else(|| "Event ignored".to_string());
    Ok(HttpResponse::Ok().json(ApiResponse {
        data: report,
        message,
    }))
}

#[post("/api/tests/{user_id}/submit")]
async fn submit_test(
    req: HttpRequest,
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_registry.get(&user_id).await?;
    log::info!(
        "Manual submit requested for {} [{}]",
        user_id,
        get_request_id(&req).unwrap_or_default()
    );
    let response = match session.submit().await? {
        SubmitOutcome::Submitted(result) => SubmitResponse {
            success: true,
            result: Some(result),
            message: "Test submitted".to_string(),
        },
        SubmitOutcome::InFlight => SubmitResponse {
            success: false,
            result: None,
            message: "A submission for this test is already in progress".to_string(),
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

#[get("/api/tests/{user_id}/navigator")]
async fn get_navigator(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_registry.get(&user_id).await?;
    Ok(HttpResponse::Ok().json(session.navigator().await))
}

#[get("/api/tests/{user_id}/session")]
async fn get_session(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_registry.get(&user_id).await?;
    Ok(HttpResponse::Ok().json(session.snapshot().await))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(configure_test)
        .service(start_test)
        .service(select_answer)
        .service(commit_and_advance)
        .service(clear_answer)
        .service(toggle_mark_for_review)
        .service(jump_to)
        .service(report_violation)
        .service(submit_test)
        .service(get_navigator)
        .service(get_session);
}
