use crate::domain::a001_book::api::{CatalogQueryService, HttpCatalogService};
use contracts::domain::a001_book::aggregate::Book;
use contracts::domain::common::AggregateRoot;
use leptos::prelude::*;

/// Результат последнего поиска по ID
#[derive(Debug, Clone, PartialEq)]
enum LookupResult {
    Found(Book),
    NotFound(String),
    Failed(String),
}

/// Поиск книги по ID
#[component]
#[allow(non_snake_case)]
pub fn BookLookup() -> impl IntoView {
    let (id, set_id) = signal(String::new());
    let (loading, set_loading) = signal(false);
    let (result, set_result) = signal::<Option<LookupResult>>(None);

    let can_search = move || !id.get().trim().is_empty() && !loading.get();

    let search = move || {
        let wanted = id.get_untracked().trim().to_string();
        if wanted.is_empty() {
            return;
        }
        set_loading.set(true);
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = match HttpCatalogService.find_by_id(&wanted).await {
                Ok(Some(book)) => LookupResult::Found(book),
                Ok(None) => LookupResult::NotFound(wanted),
                Err(e) => {
                    log::error!("Book lookup failed: {}", e);
                    LookupResult::Failed(e.to_string())
                }
            };
            set_result.set(Some(outcome));
            set_loading.set(false);
        });
    };

    view! {
        <div class="content">
            <div class="header">
                <h2>{format!("{}: поиск по ID", Book::element_name())}</h2>
            </div>
            <form
                class="form"
                on:submit=move |ev| {
                    ev.prevent_default();
                    search();
                }
            >
                <input
                    type="text"
                    class="form__input"
                    placeholder="ID книги"
                    prop:value=move || id.get()
                    on:input=move |ev| set_id.set(event_target_value(&ev))
                />
                <button type="submit" class="button button--primary" disabled=move || !can_search()>
                    {move || if loading.get() { "Поиск..." } else { "Найти" }}
                </button>
            </form>

            {move || result.get().map(|r| match r {
                LookupResult::Found(book) => {
                    let data = book.data;
                    let image = (!data.image_url.is_empty()).then(|| view! {
                        <img src=data.image_url.clone() alt="cover" style="max-width: 120px;" />
                    });
                    view! {
                        <div class="details">
                            {image}
                            <h3>{data.title}</h3>
                            <p>{"Автор: "}{data.author}</p>
                            <p>{"Жанр: "}{data.genre}</p>
                            <p>{"Цена: "}{format!("{:.2}", data.price)}</p>
                            <p>{"Рейтинг: "}{format!("{:.1}", data.rating)}</p>
                            <p>{"Дата выхода: "}{data.release_date.format("%d.%m.%Y").to_string()}</p>
                            {data.top_seller.then(|| view! { <p><b>{"Бестселлер"}</b></p> })}
                        </div>
                    }.into_any()
                }
                LookupResult::NotFound(id) => view! {
                    <div class="info">{format!("Книга с ID \"{}\" не найдена", id)}</div>
                }.into_any(),
                LookupResult::Failed(e) => view! { <div class="error">{e}</div> }.into_any(),
            })}
        </div>
    }
}
