use axum::{
    Extension, Json,
    extract::{Path, State},
};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::AppState;
use crate::entities::notification;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;

/// List the actor's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<notification::Model>>> {
    let notes = notification::Entity::find()
        .filter(notification::Column::RecipientId.eq(claims.sub))
        .order_by_desc(notification::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(notes))
}

/// Mark one notification as read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<notification::Model>> {
    let found = notification::Entity::find_by_id(notification_id)
        .filter(notification::Column::RecipientId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    let mut active: notification::ActiveModel = found.into();
    active.read = Set(true);
    let updated = active.update(&state.db).await?;

    Ok(Json(updated))
}

/// Mark all of the actor's unread notifications as read
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<serde_json::Value>> {
    let result = notification::Entity::update_many()
        .col_expr(notification::Column::Read, Expr::value(true))
        .filter(notification::Column::RecipientId.eq(claims.sub))
        .filter(notification::Column::Read.eq(false))
        .exec(&state.db)
        .await?;

    Ok(Json(
        serde_json::json!({ "updated": result.rows_affected }),
    ))
}
