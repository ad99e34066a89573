use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use log::error;
use serde_json::{Value, json};

use crate::data::{SolveOutput, SolveRequest, ValidateRequest};
use crate::error::SolveError;
use crate::{solver, validate};

async fn solve_handler(
    Json(request): Json<SolveRequest>,
) -> Result<Json<SolveOutput>, (StatusCode, Json<Value>)> {
    // the solve is pure CPU work, keep it off the async workers
    let result = match tokio::task::spawn_blocking(move || solver::solve(&request)).await {
        Ok(result) => result,
        Err(join_error) => {
            error!("solver task failed: {join_error}");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal solver failure" })),
            ));
        }
    };

    match result {
        Ok(output) => Ok(Json(output)),
        Err(failure) => Err((
            status_for(&failure.error),
            Json(json!({
                "error": failure.error.to_string(),
                "kind": failure.error.kind(),
                "stats": failure.stats,
            })),
        )),
    }
}

async fn validate_handler(Json(request): Json<ValidateRequest>) -> Json<Value> {
    let violations = validate::check(
        &request.schedule_data,
        request.interviewer_schedule.as_ref(),
        &request.students,
        &request.interviewers,
        &request.quotas(),
    );
    Json(json!({ "violations": violations }))
}

fn status_for(error: &SolveError) -> StatusCode {
    match error {
        SolveError::InvalidScenario(_) => StatusCode::BAD_REQUEST,
        SolveError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub async fn run_server() {
    let app = Router::new()
        .route("/v1/schedule/solve", post(solve_handler))
        .route("/v1/schedule/validate", post(validate_handler));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
