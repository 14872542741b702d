//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, State},
    http::header,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::aggregation::{ExpenseFilter, Summary};
use crate::auth::Identity;
use crate::domain::{Budgets, Expense, OperationContext, PublicUser};
use crate::error::AppError;
use crate::export::CSV_FILENAME;
use crate::handlers::{
    AddExpenseCommand, AuthResult, BudgetHandler, DeleteResult, EditExpenseCommand,
    ExpenseHandler, LoginCommand, LoginHandler, ProfileHandler, ReportHandler, SignupCommand,
    SignupHandler, SummaryQuery, UpdateBudgetsCommand, UpdateProfileCommand,
};

use super::extract::{ApiJson, ApiQuery};
use super::middleware::auth_middleware;
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

/// Request bodies are the handler commands themselves.
pub type SignupRequest = SignupCommand;
pub type LoginRequest = LoginCommand;
pub type UpdateProfileRequest = UpdateProfileCommand;
pub type AddExpenseRequest = AddExpenseCommand;
pub type EditExpenseRequest = EditExpenseCommand;
pub type UpdateBudgetsRequest = UpdateBudgetsCommand;

pub type AuthResponse = AuthResult;
pub type DeleteResponse = DeleteResult;

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpenseResponse {
    pub expense: Expense,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpensesListResponse {
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BudgetsResponse {
    pub budgets: Budgets,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: Summary,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router. Everything except signup, login and the status
/// probe sits behind the bearer-token check.
pub fn create_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(api_status))
        .route("/signup", post(signup))
        .route("/login", post(login));

    let protected = Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/expenses", get(list_expenses).post(add_expense))
        .route("/expenses/:id", put(edit_expense).delete(delete_expense))
        .route("/budgets", get(get_budgets).put(update_budgets))
        .route("/summary", get(get_summary))
        .route("/export/csv", get(export_csv))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

// =========================================================================
// GET /
// =========================================================================

async fn api_status() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// =========================================================================
// POST /signup, POST /login
// =========================================================================

/// Register a new user and return a session token
async fn signup(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let handler = SignupHandler::new(state.store, state.passwords, state.tokens);
    let result = handler.execute(request, &context).await?;
    Ok(Json(result))
}

/// Exchange credentials for a session token
async fn login(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let handler = LoginHandler::new(state.store, state.passwords, state.tokens);
    let result = handler.execute(request, &context).await?;
    Ok(Json(result))
}

// =========================================================================
// GET /profile, PUT /profile
// =========================================================================

async fn get_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserResponse>, AppError> {
    let user = ProfileHandler::new(state.store).get(identity.user_id).await?;
    Ok(Json(UserResponse { user }))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = ProfileHandler::new(state.store)
        .update(identity.user_id, request, &context)
        .await?;
    Ok(Json(UserResponse { user }))
}

// =========================================================================
// /expenses
// =========================================================================

/// List the caller's entries, newest first, optionally filtered
async fn list_expenses(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiQuery(filter): ApiQuery<ExpenseFilter>,
) -> Result<Json<ExpensesListResponse>, AppError> {
    let expenses = ExpenseHandler::new(state.store)
        .list(identity.user_id, &filter)
        .await?;
    Ok(Json(ExpensesListResponse { expenses }))
}

async fn add_expense(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<AddExpenseRequest>,
) -> Result<Json<ExpenseResponse>, AppError> {
    let expense = ExpenseHandler::new(state.store)
        .add(identity.user_id, request, &context)
        .await?;
    Ok(Json(ExpenseResponse { expense }))
}

async fn edit_expense(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<EditExpenseRequest>,
) -> Result<Json<ExpenseResponse>, AppError> {
    let expense = ExpenseHandler::new(state.store)
        .edit(identity.user_id, &id, request, &context)
        .await?;
    Ok(Json(ExpenseResponse { expense }))
}

async fn delete_expense(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let result = ExpenseHandler::new(state.store)
        .delete(identity.user_id, &id, &context)
        .await?;
    Ok(Json(result))
}

// =========================================================================
// /budgets
// =========================================================================

async fn get_budgets(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<BudgetsResponse>, AppError> {
    let budgets = BudgetHandler::new(state.store).get(identity.user_id).await?;
    Ok(Json(BudgetsResponse { budgets }))
}

async fn update_budgets(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<UpdateBudgetsRequest>,
) -> Result<Json<BudgetsResponse>, AppError> {
    let budgets = BudgetHandler::new(state.store)
        .update(identity.user_id, request, &context)
        .await?;
    Ok(Json(BudgetsResponse { budgets }))
}

// =========================================================================
// Reports
// =========================================================================

async fn get_summary(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    let summary = ReportHandler::new(state.store)
        .summary(identity.user_id, &query)
        .await?;
    Ok(Json(SummaryResponse { summary }))
}

/// Download the caller's ledger as a CSV attachment
async fn export_csv(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    let csv = ReportHandler::new(state.store)
        .export_csv(identity.user_id)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={CSV_FILENAME}"),
            ),
        ],
        csv,
    ))
}
