use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::user_controller::UserController;
use crate::dto::user_dto::{InviteUserRequest, SetRoleRequest, SetStatusRequest, UserResponse};
use crate::dto::ApiResponse;
use crate::models::user::ActingUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_user_router() -> Router<AppState> {
    Router::new()
        .route("/", post(invite_user))
        .route("/", get(list_users))
        .route("/me", get(me))
        .route("/:id/role", put(set_role))
        .route("/:id/status", put(set_status))
}

async fn invite_user(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Json(request): Json<InviteUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = UserController::new(state.pool.clone(), state.config.bcrypt_cost);
    let response = controller.invite(&acting, request).await?;
    Ok(Json(response))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let controller = UserController::new(state.pool.clone(), state.config.bcrypt_cost);
    let response = controller.list(&acting).await?;
    Ok(Json(response))
}

async fn me(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
) -> Result<Json<UserResponse>, AppError> {
    let controller = UserController::new(state.pool.clone(), state.config.bcrypt_cost);
    let response = controller.me(&acting).await?;
    Ok(Json(response))
}

async fn set_role(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetRoleRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = UserController::new(state.pool.clone(), state.config.bcrypt_cost);
    let response = controller.set_role(&acting, id, request).await?;
    Ok(Json(response))
}

async fn set_status(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = UserController::new(state.pool.clone(), state.config.bcrypt_cost);
    let response = controller.set_status(&acting, id, request).await?;
    Ok(Json(response))
}
