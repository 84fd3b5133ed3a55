use serde::{de::DeserializeOwned, Serialize};
use std::hash::Hash;

/// Трейт для типов идентификаторов агрегатов
///
/// Идентификатор непрозрачен для клиента: он передаётся в пути запроса
/// отдельно от тела документа.
pub trait AggregateId:
    Clone + PartialEq + Eq + Hash + Serialize + DeserializeOwned + std::fmt::Debug
{
    /// Преобразовать ID в строку
    fn as_string(&self) -> String;

    /// Создать ID из строки (с проверкой формата)
    fn from_string(s: &str) -> Result<Self, String>;
}
