use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use contracts::domain::a001_book::aggregate::{Book, BookDto};
use contracts::domain::a001_book::query::CatalogListParams;
use serde_json::json;

use crate::domain::a001_book::service::{self, CatalogError};
use crate::routes::AppState;

fn error_status(context: &str, e: CatalogError) -> StatusCode {
    match e {
        CatalogError::InvalidInput(msg) => {
            tracing::warn!("{}: invalid input: {}", context, msg);
            StatusCode::BAD_REQUEST
        }
        CatalogError::Store(err) => {
            tracing::error!("{}: {:#}", context, err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// GET /api/catalog
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<CatalogListParams>,
) -> Result<Json<Vec<Book>>, StatusCode> {
    match service::list(state.books.as_ref(), params).await {
        Ok(items) => Ok(Json(items)),
        Err(e) => Err(error_status("Failed to list books", e)),
    }
}

/// GET /api/catalog/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, StatusCode> {
    match service::get_by_id(state.books.as_ref(), &id).await {
        Ok(Some(book)) => Ok(Json(book)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(error_status(&format!("Failed to get book {}", id), e)),
    }
}

/// PUT /api/catalog/:id
///
/// Один и тот же ответ и при создании, и при обновлении.
pub async fn upsert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(dto): Json<BookDto>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match service::upsert(state.books.as_ref(), &id, dto).await {
        Ok(upserted) => Ok(Json(json!({ "id": upserted.id }))),
        Err(e) => Err(error_status(&format!("Failed to upsert book {}", id), e)),
    }
}

/// POST /api/testdata/catalog
pub async fn insert_test_data(State(state): State<AppState>) -> StatusCode {
    match service::insert_test_data(state.books.as_ref()).await {
        Ok(count) => {
            tracing::info!("Inserted {} test books", count);
            StatusCode::OK
        }
        Err(e) => error_status("Failed to insert test data", e),
    }
}
