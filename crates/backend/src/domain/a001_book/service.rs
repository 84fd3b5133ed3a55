use chrono::NaiveDate;
use contracts::domain::a001_book::aggregate::{Book, BookDto, BookId};
use contracts::domain::a001_book::query::{CatalogListParams, CatalogQuery};
use contracts::domain::common::AggregateId;

use super::repository::BookRepository;

/// Ошибки операций с каталогом
///
/// Отсутствие записи ошибкой не считается и возвращается как `None`.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store failure: {0}")]
    Store(#[from] anyhow::Error),
}

/// Какая ветка upsert отработала (наружу не отдаётся, только в лог)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Итог upsert: ID в том виде, в каком он сохранён, и сработавшая ветка
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub id: BookId,
    pub outcome: UpsertOutcome,
}

fn parse_id(id: &str) -> Result<BookId, CatalogError> {
    BookId::from_string(id).map_err(CatalogError::InvalidInput)
}

/// Создать запись, если её нет, иначе перезаписать поля
pub async fn upsert(
    repo: &dyn BookRepository,
    id: &str,
    dto: BookDto,
) -> Result<Upserted, CatalogError> {
    let id = parse_id(id)?;
    dto.validate().map_err(CatalogError::InvalidInput)?;

    let outcome = match repo.find_by_id(&id).await? {
        None => {
            let mut book = Book::new_for_insert(id.clone(), dto);
            book.before_write();
            repo.create(&book).await?;
            tracing::info!(id = %book.id, "Book created");
            UpsertOutcome::Created
        }
        Some(mut book) => {
            book.update(&dto);
            book.before_write();
            repo.update(&book).await?;
            tracing::info!(id = %book.id, version = book.metadata.version, "Book updated");
            UpsertOutcome::Updated
        }
    };
    Ok(Upserted { id, outcome })
}

/// Получение книги по ID
pub async fn get_by_id(repo: &dyn BookRepository, id: &str) -> Result<Option<Book>, CatalogError> {
    let id = parse_id(id)?;
    Ok(repo.find_by_id(&id).await?)
}

/// Одна страница списка; некорректные параметры отклоняются до обращения к хранилищу
pub async fn list(
    repo: &dyn BookRepository,
    params: CatalogListParams,
) -> Result<Vec<Book>, CatalogError> {
    let query =
        CatalogQuery::try_from(params).map_err(|e| CatalogError::InvalidInput(e.to_string()))?;
    tracing::debug!(?query, "Listing books");
    Ok(repo.find_all(&query).await?)
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, CatalogError> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| CatalogError::InvalidInput(format!("invalid date {y}-{m}-{d}")))
}

/// Вставка тестовых данных
pub async fn insert_test_data(repo: &dyn BookRepository) -> Result<usize, CatalogError> {
    let data = vec![
        BookDto {
            title: "The Master and Margarita".into(),
            author: "Mikhail Bulgakov".into(),
            price: 14.99,
            rating: 4.8,
            release_date: date(1967, 1, 1)?,
            genre: "Fantasy".into(),
            top_seller: true,
            image_url: "https://covers.example.com/master-and-margarita.jpg".into(),
        },
        BookDto {
            title: "Crime and Punishment".into(),
            author: "Fyodor Dostoevsky".into(),
            price: 11.5,
            rating: 4.6,
            release_date: date(1866, 1, 1)?,
            genre: "Classic".into(),
            top_seller: true,
            image_url: "https://covers.example.com/crime-and-punishment.jpg".into(),
        },
        BookDto {
            title: "Roadside Picnic".into(),
            author: "Arkady and Boris Strugatsky".into(),
            price: 9.99,
            rating: 4.4,
            release_date: date(1972, 1, 1)?,
            genre: "Science fiction".into(),
            top_seller: false,
            image_url: String::new(),
        },
        BookDto {
            title: "Dead Souls".into(),
            author: "Nikolai Gogol".into(),
            price: 8.25,
            rating: 4.1,
            release_date: date(1842, 5, 21)?,
            genre: "Classic".into(),
            top_seller: false,
            image_url: String::new(),
        },
        BookDto {
            title: "We".into(),
            author: "Yevgeny Zamyatin".into(),
            price: 10.0,
            rating: 4.0,
            release_date: date(1924, 1, 1)?,
            genre: "Dystopia".into(),
            top_seller: false,
            image_url: String::new(),
        },
    ];

    let count = data.len();
    for dto in data {
        upsert(repo, BookId::new_v4().value(), dto).await?;
    }

    Ok(count)
}
