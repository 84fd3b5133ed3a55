//! Параметры выборки списка книг: сортировка, страница, фильтр.
//!
//! Одни и те же типы используются фронтендом для построения запроса и
//! бэкендом для его разбора, поэтому проверка корректности живёт здесь.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Размер страницы по умолчанию
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Максимальный размер страницы
pub const MAX_PAGE_SIZE: usize = 200;

/// Ошибки разбора параметров запроса
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("unknown sort field: {0}")]
    UnknownSortField(String),
    #[error("unknown sort direction: {0}")]
    UnknownDirection(String),
    #[error("page limit must be in 1..={max}, got {0}", max = MAX_PAGE_SIZE)]
    InvalidLimit(usize),
    #[error("page offset overflow: page {page} x limit {limit}")]
    OffsetOverflow { page: usize, limit: usize },
}

// ============================================================================
// Sorting
// ============================================================================

/// Поле сортировки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "author")]
    Author,
    #[serde(rename = "price")]
    Price,
    #[serde(rename = "rating")]
    Rating,
    #[serde(rename = "releaseDate")]
    ReleaseDate,
    #[serde(rename = "genre")]
    Genre,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::Title,
        SortField::Author,
        SortField::Price,
        SortField::Rating,
        SortField::ReleaseDate,
        SortField::Genre,
    ];

    /// Ключ поля в API
    pub fn key(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Author => "author",
            SortField::Price => "price",
            SortField::Rating => "rating",
            SortField::ReleaseDate => "releaseDate",
            SortField::Genre => "genre",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Заголовок для UI
    pub fn label(self) -> &'static str {
        match self {
            SortField::Title => "Название",
            SortField::Author => "Автор",
            SortField::Price => "Цена",
            SortField::Rating => "Рейтинг",
            SortField::ReleaseDate => "Дата выхода",
            SortField::Genre => "Жанр",
        }
    }
}

impl FromStr for SortField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| QueryError::UnknownSortField(s.to_string()))
    }
}

/// Направление сортировки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn is_descending(self) -> bool {
        matches!(self, SortDirection::Descending)
    }

    pub fn from_descending(desc: bool) -> Self {
        if desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    pub fn toggled(self) -> Self {
        Self::from_descending(!self.is_descending())
    }
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(QueryError::UnknownDirection(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

// ============================================================================
// Paging
// ============================================================================

/// Срез результата: лимит и смещение в элементах
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSpec {
    limit: usize,
    offset: usize,
}

impl PageSpec {
    pub fn new(limit: usize, offset: usize) -> Result<Self, QueryError> {
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(QueryError::InvalidLimit(limit));
        }
        Ok(Self { limit, offset })
    }

    /// Страница с номером `page` (с нуля): offset = page * limit
    pub fn for_page(page: usize, limit: usize) -> Result<Self, QueryError> {
        let offset = page
            .checked_mul(limit)
            .ok_or(QueryError::OffsetOverflow { page, limit })?;
        Self::new(limit, offset)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page_index(&self) -> usize {
        self.offset / self.limit
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

// ============================================================================
// Filtering
// ============================================================================

/// Поиск подстроки в названии без учёта регистра.
/// Пустой (или из пробелов) запрос совпадает со всем.
pub fn title_matches(title: &str, query: &str) -> bool {
    let needle = query.trim();
    needle.is_empty() || title.to_lowercase().contains(&needle.to_lowercase())
}

/// Фильтр по подстроке названия
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub title_contains: String,
}

impl FilterSpec {
    /// `None` для пустого запроса
    pub fn title(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| Self {
            title_contains: trimmed.to_string(),
        })
    }

    pub fn matches(&self, title: &str) -> bool {
        title_matches(title, &self.title_contains)
    }
}

// ============================================================================
// Query
// ============================================================================

/// Полный запрос к каталогу
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CatalogQuery {
    pub sort: SortSpec,
    pub filter: Option<FilterSpec>,
    pub page: PageSpec,
}

/// Плоские query-параметры `GET /api/catalog/list`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_desc: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

impl From<&CatalogQuery> for CatalogListParams {
    fn from(q: &CatalogQuery) -> Self {
        Self {
            sort_by: Some(q.sort.field.key().to_string()),
            sort_desc: Some(q.sort.direction.is_descending()),
            limit: Some(q.page.limit()),
            offset: Some(q.page.offset()),
            search_query: q.filter.as_ref().map(|f| f.title_contains.clone()),
        }
    }
}

impl TryFrom<CatalogListParams> for CatalogQuery {
    type Error = QueryError;

    fn try_from(p: CatalogListParams) -> Result<Self, Self::Error> {
        let field = match p.sort_by.as_deref() {
            Some(key) => key.parse()?,
            None => SortField::default(),
        };
        let direction = SortDirection::from_descending(p.sort_desc.unwrap_or(false));
        let page = PageSpec::new(
            p.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            p.offset.unwrap_or(0),
        )?;
        let filter = p.search_query.as_deref().and_then(FilterSpec::title);

        Ok(CatalogQuery {
            sort: SortSpec { field, direction },
            filter,
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_keys_are_closed_set() {
        for field in SortField::ALL {
            assert_eq!(SortField::from_key(field.key()), Some(field));
        }
        assert_eq!(SortField::from_key("isbn"), None);
        assert_eq!(
            "Price".parse::<SortField>(),
            Err(QueryError::UnknownSortField("Price".into()))
        );
    }

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!("Descending".parse::<SortDirection>(), Ok(SortDirection::Descending));
        assert_eq!("asc".parse::<SortDirection>(), Ok(SortDirection::Ascending));
        assert!("sideways".parse::<SortDirection>().is_err());
        assert_eq!(SortDirection::Ascending.toggled(), SortDirection::Descending);
    }

    #[test]
    fn test_page_spec_bounds() {
        assert_eq!(PageSpec::new(0, 0), Err(QueryError::InvalidLimit(0)));
        assert!(PageSpec::new(MAX_PAGE_SIZE + 1, 0).is_err());

        let page = PageSpec::for_page(3, 20).unwrap();
        assert_eq!(page.offset(), 60);
        assert_eq!(page.page_index(), 3);

        assert!(matches!(
            PageSpec::for_page(usize::MAX, 2),
            Err(QueryError::OffsetOverflow { .. })
        ));
    }

    #[test]
    fn test_title_matches_is_case_insensitive() {
        assert!(title_matches("The Hobbit", "hob"));
        assert!(title_matches("The Hobbit", ""));
        assert!(title_matches("The Hobbit", "   "));
        assert!(!title_matches("The Hobbit", "ring"));
        assert_eq!(FilterSpec::title("  "), None);
    }

    #[test]
    fn test_list_params_conversion() {
        let query = CatalogQuery {
            sort: SortSpec {
                field: SortField::Price,
                direction: SortDirection::Descending,
            },
            filter: None,
            page: PageSpec::for_page(2, 10).unwrap(),
        };
        let params = CatalogListParams::from(&query);
        assert_eq!(params.sort_by.as_deref(), Some("price"));
        assert_eq!(params.sort_desc, Some(true));
        assert_eq!(params.offset, Some(20));
        assert_eq!(CatalogQuery::try_from(params).unwrap(), query);
    }

    #[test]
    fn test_list_params_defaults_and_rejections() {
        let query = CatalogQuery::try_from(CatalogListParams::default()).unwrap();
        assert_eq!(query, CatalogQuery::default());

        let bad_sort = CatalogListParams {
            sort_by: Some("isbn".into()),
            ..Default::default()
        };
        assert!(matches!(
            CatalogQuery::try_from(bad_sort),
            Err(QueryError::UnknownSortField(_))
        ));

        let bad_limit = CatalogListParams {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(
            CatalogQuery::try_from(bad_limit),
            Err(QueryError::InvalidLimit(0))
        );
    }
}
