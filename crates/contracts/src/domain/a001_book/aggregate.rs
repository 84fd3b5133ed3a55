use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::common::{AggregateId, AggregateRoot, EntityMetadata};

/// Максимальная длина идентификатора книги
pub const MAX_ID_LEN: usize = 128;

/// Верхняя граница рейтинга
pub const MAX_RATING: f64 = 5.0;

// ============================================================================
// ID Type
// ============================================================================

/// Идентификатор книги
///
/// Непрозрачная строка: сервер не интерпретирует её содержимое, только
/// проверяет что она не пустая и не слишком длинная.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub String);

impl BookId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AggregateId for BookId {
    fn as_string(&self) -> String {
        self.0.clone()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("ID не может быть пустым".into());
        }
        if trimmed.len() > MAX_ID_LEN {
            return Err(format!(
                "ID слишком длинный: {} символов (максимум {})",
                trimmed.len(),
                MAX_ID_LEN
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// Тело документа книги
///
/// Используется и как payload для PUT, и как хранимая часть агрегата.
/// Идентификатор сюда не входит: он передаётся отдельно.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDto {
    pub title: String,
    pub author: String,
    pub price: f64,
    pub rating: f64,
    #[serde(rename = "releaseDate")]
    pub release_date: NaiveDate,
    pub genre: String,
    #[serde(rename = "topSeller")]
    pub top_seller: bool,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

impl BookDto {
    /// Валидация данных
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Название не может быть пустым".into());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("Некорректная цена: {}", self.price));
        }
        if !self.rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(format!(
                "Рейтинг должен быть в диапазоне 0..={}, получено {}",
                MAX_RATING, self.rating
            ));
        }
        let url = self.image_url.trim();
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            return Err("URL изображения должен начинаться с http:// или https://".into());
        }
        Ok(())
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Книга (элемент каталога)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,

    #[serde(flatten)]
    pub data: BookDto,

    pub metadata: EntityMetadata,
}

impl Book {
    /// Создать новую книгу для вставки в хранилище
    pub fn new_for_insert(id: BookId, data: BookDto) -> Self {
        Self {
            id,
            data,
            metadata: EntityMetadata::new(),
        }
    }

    /// Перезаписать поля документа данными из DTO
    pub fn update(&mut self, dto: &BookDto) {
        self.data = dto.clone();
        self.metadata.increment_version();
    }

    pub fn title(&self) -> &str {
        &self.data.title
    }

    /// Хук перед записью
    pub fn before_write(&mut self) {
        self.metadata.touch();
    }
}

impl AggregateRoot for Book {
    type Id = BookId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.metadata
    }

    fn aggregate_index() -> &'static str {
        "a001"
    }

    fn collection_name() -> &'static str {
        "book"
    }

    fn element_name() -> &'static str {
        "Книга"
    }

    fn list_name() -> &'static str {
        "Книги"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dto() -> BookDto {
        BookDto {
            title: "Solaris".into(),
            author: "Stanisław Lem".into(),
            price: 12.5,
            rating: 4.7,
            release_date: NaiveDate::from_ymd_opt(1961, 6, 1).unwrap(),
            genre: "Science fiction".into(),
            top_seller: true,
            image_url: "https://example.com/solaris.jpg".into(),
        }
    }

    #[test]
    fn test_book_id_from_string() {
        assert_eq!(BookId::from_string(" X1 ").unwrap(), BookId::new("X1"));
        assert!(BookId::from_string("   ").is_err());
        assert!(BookId::from_string(&"a".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_payloads() {
        assert!(sample_dto().validate().is_ok());

        let mut dto = sample_dto();
        dto.title = "  ".into();
        assert!(dto.validate().is_err());

        let mut dto = sample_dto();
        dto.price = -1.0;
        assert!(dto.validate().is_err());

        let mut dto = sample_dto();
        dto.rating = 5.5;
        assert!(dto.validate().is_err());

        let mut dto = sample_dto();
        dto.image_url = "ftp://example.com/x.png".into();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_wire_format_uses_original_field_names() {
        let book = Book::new_for_insert(BookId::new("X1"), sample_dto());
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["id"], "X1");
        assert_eq!(json["releaseDate"], "1961-06-01");
        assert_eq!(json["topSeller"], true);
        assert_eq!(json["imageUrl"], "https://example.com/solaris.jpg");
        assert_eq!(json["metadata"]["version"], 0);
    }

    #[test]
    fn test_update_overwrites_fields_and_bumps_version() {
        let mut book = Book::new_for_insert(BookId::new("X1"), sample_dto());
        let mut changed = sample_dto();
        changed.title = "Eden".into();
        book.update(&changed);
        assert_eq!(book.data, changed);
        assert_eq!(book.metadata.version, 1);
        assert_eq!(Book::full_name(), "a001_book");
    }
}
