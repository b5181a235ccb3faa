//! Loan management endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::loan::{CreateLoan, Loan, LoanDetails, ReturnLoan, UserLoansQuery},
    AppState,
};

use super::{AuthenticatedUser, ValidatedJson};

/// Return response with loan details
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub loan: Loan,
    /// The book came back after its due date
    pub was_overdue: bool,
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "No copies available", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state.services.loans.borrow(&user, &request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Loan returned", body = ReturnResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "No active loan with this id for the user", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Json(request), _): WithRejection<Json<ReturnLoan>, AppError>,
) -> AppResult<Json<ReturnResponse>> {
    let (loan, was_overdue) = state
        .services
        .loans
        .return_loan(&user, request.loan_id)
        .await?;

    Ok(Json(ReturnResponse { loan, was_overdue }))
}

/// Get the current user's loans
#[utoipa::path(
    get,
    path = "/loans/user",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(UserLoansQuery),
    responses(
        (status = 200, description = "User's loans", body = Vec<LoanDetails>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user_loans(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Query(query), _): WithRejection<Query<UserLoansQuery>, AppError>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state
        .services
        .loans
        .list_for_user(&user, query.include_returned)
        .await?;
    Ok(Json(loans))
}

/// List all overdue loans
#[utoipa::path(
    get,
    path = "/loans/overdue",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue loans", body = Vec<LoanDetails>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Administrator role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_overdue_loans(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.list_overdue(&user).await?;
    Ok(Json(loans))
}
