use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::domain::a001_book::repository::BookRepository;
use crate::handlers;

/// Общее состояние для обработчиков
#[derive(Clone)]
pub struct AppState {
    pub books: Arc<dyn BookRepository>,
}

impl AppState {
    pub fn new(books: Arc<dyn BookRepository>) -> Self {
        Self { books }
    }
}

/// Конфигурация всех роутов приложения
///
/// Под `/api/catalog/` любой сегмент считается ID книги, поэтому
/// список и тестовые данные живут на отдельных путях.
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // CATALOG (a001_book)
        // ========================================
        .route("/api/catalog", get(handlers::a001_book::list))
        .route(
            "/api/catalog/:id",
            get(handlers::a001_book::get_by_id).put(handlers::a001_book::upsert),
        )
        .route(
            "/api/testdata/catalog",
            post(handlers::a001_book::insert_test_data),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_book::memory::InMemoryBookRepository;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        configure_routes(AppState::new(Arc::new(InMemoryBookRepository::default())))
    }

    fn put_book(uri: &str, title: &str) -> Request<Body> {
        let body = serde_json::json!({
            "title": title,
            "author": "Author",
            "price": 1.0,
            "rating": 2.0,
            "releaseDate": "2001-01-01",
            "genre": "Essay",
            "topSeller": false
        });
        Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_collection_words_are_ordinary_ids() {
        let app = app();
        for id in ["list", "testdata"] {
            let response = app
                .clone()
                .oneshot(put_book(&format!("/api/catalog/{id}"), id))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let (status, book) = get_json(&app, &format!("/api/catalog/{id}")).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(book["id"], id);
            assert_eq!(book["title"], id);
        }

        let (status, list) = get_json(&app, "/api/catalog?sort_by=title&limit=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_test_data_route_seeds_catalog() {
        let app = app();
        let response = app
            .clone()
            .oneshot(
                Request::post("/api/testdata/catalog")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (_, list) = get_json(&app, "/api/catalog").await;
        assert!(!list.as_array().map(Vec::is_empty).unwrap_or(true));
    }
}
