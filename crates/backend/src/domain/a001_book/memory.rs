use async_trait::async_trait;
use contracts::domain::a001_book::aggregate::{Book, BookId};
use contracts::domain::a001_book::query::{CatalogQuery, SortField};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::repository::BookRepository;

/// Хранилище книг в памяти процесса
#[derive(Default)]
pub struct InMemoryBookRepository {
    books: RwLock<BTreeMap<BookId, Book>>,
}

impl InMemoryBookRepository {
    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.books.read().await.is_empty()
    }
}

fn compare_by_field(a: &Book, b: &Book, field: SortField) -> Ordering {
    let (a, b) = (&a.data, &b.data);
    match field {
        SortField::Title => a.title.cmp(&b.title),
        SortField::Author => a.author.cmp(&b.author),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Rating => a.rating.total_cmp(&b.rating),
        SortField::ReleaseDate => a.release_date.cmp(&b.release_date),
        SortField::Genre => a.genre.cmp(&b.genre),
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn find_by_id(&self, id: &BookId) -> anyhow::Result<Option<Book>> {
        Ok(self.books.read().await.get(id).cloned())
    }

    async fn create(&self, book: &Book) -> anyhow::Result<()> {
        let mut books = self.books.write().await;
        if books.contains_key(&book.id) {
            anyhow::bail!("Book {} already exists", book.id);
        }
        books.insert(book.id.clone(), book.clone());
        Ok(())
    }

    async fn update(&self, book: &Book) -> anyhow::Result<()> {
        let mut books = self.books.write().await;
        let Some(existing) = books.get_mut(&book.id) else {
            anyhow::bail!("Book {} not found for update", book.id);
        };
        let created_at = existing.metadata.created_at;
        *existing = book.clone();
        existing.metadata.created_at = created_at;
        Ok(())
    }

    async fn find_all(&self, query: &CatalogQuery) -> anyhow::Result<Vec<Book>> {
        let books = self.books.read().await;
        let mut items: Vec<&Book> = books
            .values()
            .filter(|b| query.filter.as_ref().map_or(true, |f| f.matches(&b.data.title)))
            .collect();

        let descending = query.sort.direction.is_descending();
        items.sort_by(|a, b| {
            let cmp = compare_by_field(a, b, query.sort.field);
            let cmp = if descending { cmp.reverse() } else { cmp };
            cmp.then_with(|| a.id.cmp(&b.id))
        });

        Ok(items
            .into_iter()
            .skip(query.page.offset())
            .take(query.page.limit())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::domain::a001_book::aggregate::BookDto;
    use contracts::domain::a001_book::query::{
        FilterSpec, PageSpec, SortDirection, SortSpec,
    };

    fn book(id: &str, title: &str, rating: f64) -> Book {
        Book::new_for_insert(
            BookId::new(id),
            BookDto {
                title: title.into(),
                author: "Author".into(),
                price: 10.0,
                rating,
                release_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                genre: "Drama".into(),
                top_seller: false,
                image_url: String::new(),
            },
        )
    }

    async fn seeded() -> InMemoryBookRepository {
        let repo = InMemoryBookRepository::default();
        repo.create(&book("1", "Anna Karenina", 4.5)).await.unwrap();
        repo.create(&book("2", "Beloved", 4.5)).await.unwrap();
        repo.create(&book("3", "Catch-22", 3.9)).await.unwrap();
        repo.create(&book("4", "The Road", 4.1)).await.unwrap();
        repo
    }

    fn query(field: SortField, direction: SortDirection, page: PageSpec) -> CatalogQuery {
        CatalogQuery {
            sort: SortSpec { field, direction },
            filter: None,
            page,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let repo = seeded().await;
        assert!(repo.create(&book("1", "Again", 1.0)).await.is_err());
        assert_eq!(repo.len().await, 4);
    }

    #[tokio::test]
    async fn test_update_requires_existing_record() {
        let repo = InMemoryBookRepository::default();
        assert!(repo.update(&book("x", "Ghost", 1.0)).await.is_err());
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_all_sorts_with_id_tiebreak() {
        let repo = seeded().await;
        let page = repo
            .find_all(&query(
                SortField::Rating,
                SortDirection::Descending,
                PageSpec::new(10, 0).unwrap(),
            ))
            .await
            .unwrap();
        let ids: Vec<&str> = page.iter().map(|b| b.id.value()).collect();
        assert_eq!(ids, vec!["1", "2", "4", "3"]);
    }

    #[tokio::test]
    async fn test_find_all_pages_do_not_overlap() {
        let repo = seeded().await;
        let mut seen = Vec::new();
        for index in 0..3 {
            let page = repo
                .find_all(&query(
                    SortField::Title,
                    SortDirection::Ascending,
                    PageSpec::for_page(index, 3).unwrap(),
                ))
                .await
                .unwrap();
            seen.extend(page.into_iter().map(|b| b.id.0));
        }
        assert_eq!(seen, vec!["1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_find_all_applies_title_filter() {
        let repo = seeded().await;
        let mut q = query(
            SortField::Title,
            SortDirection::Ascending,
            PageSpec::default(),
        );
        q.filter = FilterSpec::title("THE");
        let page = repo.find_all(&q).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].data.title, "The Road");
    }
}
