use async_trait::async_trait;
use chrono::Utc;
use contracts::domain::a001_book::aggregate::{Book, BookDto, BookId};
use contracts::domain::a001_book::query::{CatalogQuery, SortField};
use contracts::domain::common::EntityMetadata;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{ActiveValue, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect, Set};

use super::memory::InMemoryBookRepository;
use crate::shared::config::{self, Config, StorageBackend};
use crate::shared::data::db::{get_connection, initialize_database};

/// Хранилище книг
///
/// Сервис не знает, какое хранилище под ним: sqlite или память процесса.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// `None`, если записи нет (это не ошибка)
    async fn find_by_id(&self, id: &BookId) -> anyhow::Result<Option<Book>>;

    async fn create(&self, book: &Book) -> anyhow::Result<()>;

    /// Перезаписывает документ существующей записи
    async fn update(&self, book: &Book) -> anyhow::Result<()>;

    /// Одна страница, упорядоченная по `query.sort`, при равенстве по id
    async fn find_all(&self, query: &CatalogQuery) -> anyhow::Result<Vec<Book>>;
}

/// Открывает хранилище, выбранное в конфигурации
pub async fn open_repository(config: &Config) -> anyhow::Result<Arc<dyn BookRepository>> {
    match config.database.backend {
        StorageBackend::Sqlite => {
            let db_path = config::get_database_path(config)?;
            initialize_database(&db_path).await?;
            Ok(Arc::new(SqliteBookRepository))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory book storage, data is lost on restart");
            Ok(Arc::new(InMemoryBookRepository::default()))
        }
    }
}

// ============================================================================
// SQLite (sea-orm)
// ============================================================================

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_book")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub rating: f64,
    pub release_date: chrono::NaiveDate,
    pub genre: String,
    pub top_seller: bool,
    pub image_url: String,
    /// Название в нижнем регистре для поиска
    pub title_search: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Book {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            version: m.version,
        };

        Book {
            id: BookId::new(m.id),
            data: BookDto {
                title: m.title,
                author: m.author,
                price: m.price,
                rating: m.rating,
                release_date: m.release_date,
                genre: m.genre,
                top_seller: m.top_seller,
                image_url: m.image_url,
            },
            metadata,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn sort_column(field: SortField) -> Column {
    match field {
        SortField::Title => Column::Title,
        SortField::Author => Column::Author,
        SortField::Price => Column::Price,
        SortField::Rating => Column::Rating,
        SortField::ReleaseDate => Column::ReleaseDate,
        SortField::Genre => Column::Genre,
    }
}

/// Шаблон LIKE «содержит подстроку» для ключа `title_search`
///
/// lower() в SQLite понимает только ASCII, поэтому регистр приводится здесь.
/// `%`, `_` и `\` экранируются через `\`.
fn like_contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.trim().to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn active_model(book: &Book) -> ActiveModel {
    let data = &book.data;
    ActiveModel {
        id: Set(book.id.value().to_string()),
        title: Set(data.title.clone()),
        author: Set(data.author.clone()),
        price: Set(data.price),
        rating: Set(data.rating),
        release_date: Set(data.release_date),
        genre: Set(data.genre.clone()),
        top_seller: Set(data.top_seller),
        image_url: Set(data.image_url.clone()),
        title_search: Set(data.title.to_lowercase()),
        created_at: Set(Some(book.metadata.created_at)),
        updated_at: Set(Some(book.metadata.updated_at)),
        version: Set(book.metadata.version),
    }
}

/// Книги в таблице `a001_book` через глобальное подключение sea-orm
pub struct SqliteBookRepository;

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn find_by_id(&self, id: &BookId) -> anyhow::Result<Option<Book>> {
        let result = Entity::find_by_id(id.value().to_string())
            .one(conn())
            .await?;
        Ok(result.map(Into::into))
    }

    async fn create(&self, book: &Book) -> anyhow::Result<()> {
        active_model(book).insert(conn()).await?;
        Ok(())
    }

    async fn update(&self, book: &Book) -> anyhow::Result<()> {
        let mut active = active_model(book);
        active.created_at = ActiveValue::NotSet;
        active.update(conn()).await?;
        Ok(())
    }

    async fn find_all(&self, query: &CatalogQuery) -> anyhow::Result<Vec<Book>> {
        let mut select = Entity::find();
        if let Some(filter) = &query.filter {
            let pattern = like_contains_pattern(&filter.title_contains);
            select = select.filter(
                Expr::col(Column::TitleSearch).like(LikeExpr::new(pattern).escape('\\')),
            );
        }

        let order = if query.sort.direction.is_descending() {
            Order::Desc
        } else {
            Order::Asc
        };

        let items = select
            .order_by(sort_column(query.sort.field), order)
            .order_by_asc(Column::Id)
            .limit(query.page.limit() as u64)
            .offset(query.page.offset() as u64)
            .all(conn())
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::domain::a001_book::query::{FilterSpec, PageSpec, SortDirection, SortSpec};
    use uuid::Uuid;

    fn book(id: &str, title: &str, price: f64) -> Book {
        Book::new_for_insert(
            BookId::new(id),
            BookDto {
                title: title.into(),
                author: "Author".into(),
                price,
                rating: 4.0,
                release_date: NaiveDate::from_ymd_opt(2001, 2, 3).unwrap(),
                genre: "Fantasy".into(),
                top_seller: false,
                image_url: String::new(),
            },
        )
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_contains_pattern(" Dune "), "%dune%");
        assert_eq!(like_contains_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
        assert_eq!(like_contains_pattern("МАР"), "%мар%");
    }

    // Глобальное подключение инициализируется один раз, поэтому весь
    // сценарий sqlite собран в одном тесте.
    #[tokio::test]
    async fn test_sqlite_repository_roundtrip() {
        let db_path = std::env::temp_dir().join(format!("catalog-test-{}.db", Uuid::new_v4()));
        initialize_database(&db_path).await.unwrap();
        let repo = SqliteBookRepository;

        assert!(repo.find_by_id(&BookId::new("a")).await.unwrap().is_none());

        repo.create(&book("a", "Dune", 9.0)).await.unwrap();
        repo.create(&book("b", "Emma", 3.0)).await.unwrap();
        repo.create(&book("c", "Ulysses", 5.0)).await.unwrap();

        let mut changed = repo.find_by_id(&BookId::new("a")).await.unwrap().unwrap();
        changed.data.title = "Dune Messiah".into();
        changed.metadata.increment_version();
        repo.update(&changed).await.unwrap();

        let stored = repo.find_by_id(&BookId::new("a")).await.unwrap().unwrap();
        assert_eq!(stored.data.title, "Dune Messiah");
        assert_eq!(stored.metadata.version, 1);

        let query = CatalogQuery {
            sort: SortSpec {
                field: SortField::Price,
                direction: SortDirection::Descending,
            },
            filter: None,
            page: PageSpec::new(2, 0).unwrap(),
        };
        let first = repo.find_all(&query).await.unwrap();
        let ids: Vec<&str> = first.iter().map(|b| b.id.value()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let second = repo
            .find_all(&CatalogQuery {
                page: PageSpec::for_page(1, 2).unwrap(),
                ..query
            })
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id.value(), "b");

        repo.create(&book("d", "Мастер и Маргарита", 1.0)).await.unwrap();
        repo.create(&book("e", "100% Lemon", 2.0)).await.unwrap();
        let sort = query.sort;
        let filtered = |text: &str| CatalogQuery {
            sort,
            filter: FilterSpec::title(text),
            page: PageSpec::new(10, 0).unwrap(),
        };
        let found_ids = |books: Vec<Book>| -> Vec<String> {
            books.into_iter().map(|b| b.id.0).collect()
        };

        let found = repo.find_all(&filtered("МАРГ")).await.unwrap();
        assert_eq!(found_ids(found), vec!["d"]);
        let found = repo.find_all(&filtered("dune")).await.unwrap();
        assert_eq!(found_ids(found), vec!["a"]);
        let found = repo.find_all(&filtered("%")).await.unwrap();
        assert_eq!(found_ids(found), vec!["e"]);
        assert!(repo.find_all(&filtered("_")).await.unwrap().is_empty());

        let _ = std::fs::remove_file(&db_path);
    }
}
