/// Утилиты для списков: подсветка совпадений, поиск с debounce, индикатор сортировки
use contracts::domain::a001_book::query::{SortField, SortSpec};
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;

/// Задержка перед применением поискового запроса
pub const SEARCH_DEBOUNCE_MS: u32 = 300;

/// Байтовые диапазоны совпадений `filter` в `text` без учёта регистра
///
/// Пусто, если запрос пустой или нижний регистр меняет длину строки
/// (тогда позиции в исходном тексте не восстановить).
pub fn match_ranges(text: &str, filter: &str) -> Vec<(usize, usize)> {
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let haystack = text.to_lowercase();
    if haystack.len() != text.len() {
        return Vec::new();
    }

    let mut ranges = Vec::new();
    let mut last_pos = 0;
    while let Some(pos) = haystack[last_pos..].find(&needle) {
        let start = last_pos + pos;
        let end = start + needle.len();
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return Vec::new();
        }
        ranges.push((start, end));
        last_pos = end;
    }
    ranges
}

/// Новый текст поля ввода, если применённый запрос ушёл от набранного
///
/// Запрос может смениться снаружи (например, сброс списка очищает поиск).
pub fn resync_input(applied: &str, typed: &str) -> Option<String> {
    (applied != typed).then(|| applied.to_string())
}

/// Подсветка совпадений в тексте (case-insensitive)
pub fn highlight_matches(text: &str, filter: &str) -> AnyView {
    let ranges = match_ranges(text, filter);
    if ranges.is_empty() {
        return view! { <span>{text.to_string()}</span> }.into_any();
    }

    let mut parts: Vec<AnyView> = Vec::new();
    let mut last_pos = 0;
    for (start, end) in ranges {
        if start > last_pos {
            parts.push(view! { <span>{text[last_pos..start].to_string()}</span> }.into_any());
        }
        parts.push(view! {
            <span style="background-color: #ff9800; color: white; padding: 1px 2px; border-radius: 2px; font-weight: 500;">
                {text[start..end].to_string()}
            </span>
        }.into_any());
        last_pos = end;
    }
    if last_pos < text.len() {
        parts.push(view! { <span>{text[last_pos..].to_string()}</span> }.into_any());
    }

    view! { <>{parts}</> }.into_any()
}

/// Компонент поиска с debounce и кнопкой очистки
#[component]
pub fn SearchInput(
    /// Текущее применённое значение (для подсветки поля)
    #[prop(into)]
    value: Signal<String>,
    /// Вызывается с новым запросом после паузы ввода
    #[prop(into)]
    on_change: Callback<String>,
    #[prop(optional, into)]
    placeholder: String,
) -> impl IntoView {
    let placeholder = if placeholder.is_empty() {
        "Поиск по названию...".to_string()
    } else {
        placeholder
    };

    let (input_value, set_input_value) = signal(String::new());
    // Номер последнего ввода: срабатывает только самый свежий таймер
    let generation = StoredValue::new(0u64);

    // Применённый запрос сменился снаружи: показываем его и гасим ожидающий таймер
    Effect::new(move |_| {
        let applied = value.get();
        if let Some(text) = resync_input(&applied, &input_value.get_untracked()) {
            generation.update_value(|g| *g += 1);
            set_input_value.set(text);
        }
    });

    let handle_input_change = move |new_value: String| {
        set_input_value.set(new_value.clone());
        generation.update_value(|g| *g += 1);
        let current = generation.get_value();

        wasm_bindgen_futures::spawn_local(async move {
            TimeoutFuture::new(SEARCH_DEBOUNCE_MS).await;
            if generation.try_get_value() == Some(current) {
                on_change.run(new_value);
            }
        });
    };

    let is_filter_active = move || !value.get().trim().is_empty();

    let clear_filter = move |_| {
        generation.update_value(|g| *g += 1);
        set_input_value.set(String::new());
        on_change.run(String::new());
    };

    view! {
        <div style="position: relative; display: inline-flex; align-items: center;">
            <input
                type="text"
                placeholder={placeholder}
                style=move || format!(
                    "width: 250px; padding: 6px 32px 6px 10px; border: 1px solid #ddd; border-radius: 4px; font-size: 15px; background: {};",
                    if is_filter_active() { "#fffbea" } else { "white" }
                )
                prop:value=move || input_value.get()
                on:input=move |ev| {
                    let val = event_target_value(&ev);
                    handle_input_change(val);
                }
            />
            {move || if !input_value.get().is_empty() {
                view! {
                    <button
                        style="position: absolute; right: 6px; background: none; border: none; cursor: pointer; padding: 4px; color: #666; line-height: 1;"
                        on:click=clear_filter
                        title="Очистить"
                    >
                        "✕"
                    </button>
                }.into_any()
            } else {
                view! { <></> }.into_any()
            }}
        </div>
    }
}

/// Индикатор сортировки для заголовка колонки
pub fn get_sort_indicator(current: SortSpec, field: SortField) -> &'static str {
    if current.field == field {
        if current.direction.is_descending() { " ▼" } else { " ▲" }
    } else {
        " ⇅"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a001_book::query::SortDirection;

    #[test]
    fn test_match_ranges_case_insensitive() {
        assert_eq!(match_ranges("The Road to the Sea", "the"), vec![(0, 3), (12, 15)]);
    }

    #[test]
    fn test_match_ranges_cyrillic() {
        let text = "Мастер и Маргарита";
        let ranges = match_ranges(text, "мар");
        assert_eq!(ranges.len(), 1);
        let (start, end) = ranges[0];
        assert_eq!(&text[start..end], "Мар");
    }

    #[test]
    fn test_match_ranges_blank_filter() {
        assert!(match_ranges("Anything", "   ").is_empty());
        assert!(match_ranges("Anything", "zzz").is_empty());
    }

    #[test]
    fn test_resync_input_after_external_reset() {
        assert_eq!(resync_input("", "war"), Some(String::new()));
        assert_eq!(resync_input("war", "war"), None);
    }

    #[test]
    fn test_sort_indicator() {
        let spec = SortSpec {
            field: SortField::Price,
            direction: SortDirection::Descending,
        };
        assert_eq!(get_sort_indicator(spec, SortField::Price), " ▼");
        assert_eq!(get_sort_indicator(spec, SortField::Title), " ⇅");
    }
}
