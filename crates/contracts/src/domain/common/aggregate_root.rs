use super::{AggregateId, EntityMetadata};

/// Трейт для корня агрегата
///
/// Определяет обязательные методы и метаданные для всех агрегатов системы
pub trait AggregateRoot {
    /// Тип идентификатора агрегата
    type Id: AggregateId;

    /// Получить ID записи
    fn id(&self) -> &Self::Id;

    /// Получить метаданные жизненного цикла
    fn metadata(&self) -> &EntityMetadata;

    /// Получить изменяемые метаданные
    fn metadata_mut(&mut self) -> &mut EntityMetadata;

    /// Индекс агрегата (например, "a001")
    fn aggregate_index() -> &'static str;

    /// Имя коллекции (используется в путях API и именах таблиц)
    fn collection_name() -> &'static str;

    /// Название одного элемента для UI
    fn element_name() -> &'static str;

    /// Название списка для UI
    fn list_name() -> &'static str;

    /// Полное имя таблицы хранилища: "{index}_{collection}"
    fn full_name() -> String {
        format!("{}_{}", Self::aggregate_index(), Self::collection_name())
    }
}
