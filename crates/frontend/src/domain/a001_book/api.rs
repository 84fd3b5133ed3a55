use async_trait::async_trait;
use contracts::domain::a001_book::aggregate::Book;
use contracts::domain::a001_book::query::{CatalogListParams, CatalogQuery, QueryError};
use gloo_net::http::Request;

use crate::shared::api_utils::api_url;

/// Ошибки получения данных каталога на клиенте
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("request failed: {0}")]
    Http(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<QueryError> for ListError {
    fn from(e: QueryError) -> Self {
        ListError::InvalidInput(e.to_string())
    }
}

/// Источник данных каталога
///
/// Ответ `find_all` приходит уже отсортированным и нарезанным по странице;
/// клиент ничего не пересортировывает.
#[async_trait(?Send)]
pub trait CatalogQueryService {
    async fn find_all(&self, query: &CatalogQuery) -> Result<Vec<Book>, ListError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, ListError>;
}

/// Заполнение каталога тестовыми данными; вне `/api/catalog/`, где любой сегмент это ID
pub const TEST_DATA_PATH: &str = "/api/testdata/catalog";

/// Путь и query-string для страницы списка
pub fn list_path(query: &CatalogQuery) -> Result<String, ListError> {
    let params = CatalogListParams::from(query);
    let qs = serde_qs::to_string(&params).map_err(|e| ListError::InvalidInput(e.to_string()))?;
    Ok(format!("/api/catalog?{}", qs))
}

/// Путь к одной книге; ID кодируется
pub fn book_path(id: &str) -> String {
    format!("/api/catalog/{}", urlencoding::encode(id))
}

/// Каталог на backend по HTTP
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpCatalogService;

#[async_trait(?Send)]
impl CatalogQueryService for HttpCatalogService {
    async fn find_all(&self, query: &CatalogQuery) -> Result<Vec<Book>, ListError> {
        let url = api_url(&list_path(query)?);
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| ListError::Http(e.to_string()))?;

        if !response.ok() {
            return Err(ListError::Status(response.status()));
        }

        response
            .json::<Vec<Book>>()
            .await
            .map_err(|e| ListError::Decode(e.to_string()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, ListError> {
        let url = api_url(&book_path(id));
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| ListError::Http(e.to_string()))?;

        if response.status() == 404 {
            return Ok(None);
        }
        if !response.ok() {
            return Err(ListError::Status(response.status()));
        }

        response
            .json::<Book>()
            .await
            .map(Some)
            .map_err(|e| ListError::Decode(e.to_string()))
    }
}

/// Заполнить каталог тестовыми книгами
pub async fn insert_test_data() -> Result<(), ListError> {
    let url = api_url(TEST_DATA_PATH);
    let response = Request::post(&url)
        .send()
        .await
        .map_err(|e| ListError::Http(e.to_string()))?;

    if !response.ok() {
        return Err(ListError::Status(response.status()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a001_book::query::{PageSpec, SortDirection, SortField, SortSpec};

    #[test]
    fn test_list_path_carries_sort_and_page() {
        let query = CatalogQuery {
            sort: SortSpec {
                field: SortField::Price,
                direction: SortDirection::Descending,
            },
            filter: None,
            page: PageSpec::for_page(1, 20).unwrap(),
        };
        let path = list_path(&query).unwrap();
        assert!(path.starts_with("/api/catalog?"));
        assert!(path.contains("sort_by=price"));
        assert!(path.contains("sort_desc=true"));
        assert!(path.contains("limit=20"));
        assert!(path.contains("offset=20"));
        assert!(!path.contains("search_query"));
    }

    #[test]
    fn test_book_path_encodes_id() {
        assert_eq!(book_path("a b/c"), "/api/catalog/a%20b%2Fc");
    }
}
