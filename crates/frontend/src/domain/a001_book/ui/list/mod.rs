pub mod controller;
pub mod state;

use self::controller::{BookListController, Completion, FetchTicket};
use self::state::create_state;
use crate::domain::a001_book::api::{self, CatalogQueryService, HttpCatalogService, ListError};
use crate::shared::list_utils::{get_sort_indicator, highlight_matches, SearchInput};
use contracts::domain::a001_book::aggregate::Book;
use contracts::domain::a001_book::query::{SortDirection, SortField};
use contracts::domain::common::AggregateRoot;
use leptos::prelude::*;

/// Запас до конца прокрутки, при котором догружается следующая страница
const SCROLL_THRESHOLD_PX: i32 = 120;

/// Выполнить запрос в фоне и применить ответ к состоянию
fn spawn_fetch(
    state: RwSignal<BookListController>,
    set_error: WriteSignal<Option<String>>,
    ticket: FetchTicket,
) {
    wasm_bindgen_futures::spawn_local(async move {
        let service = HttpCatalogService;
        let mut ticket = ticket;
        loop {
            let result = service.find_all(ticket.query()).await;
            match state.try_update(|c| c.complete(ticket, result)) {
                Some(Ok(Completion::Superseded(next))) => ticket = next,
                Some(Ok(_)) => {
                    set_error.set(None);
                    break;
                }
                Some(Err(e)) => {
                    set_error.set(Some(e.to_string()));
                    break;
                }
                // список уже закрыт
                None => break,
            }
        }
    });
}

#[component]
#[allow(non_snake_case)]
pub fn BookList() -> impl IntoView {
    let state = create_state();
    let (error, set_error) = signal::<Option<String>>(None);

    let dispatch = move |intent: Option<Result<Option<FetchTicket>, ListError>>| match intent {
        Some(Ok(Some(ticket))) => spawn_fetch(state, set_error, ticket),
        Some(Ok(None)) | None => {}
        Some(Err(e)) => set_error.set(Some(e.to_string())),
    };

    let init = move || dispatch(state.try_update(|c| c.init().map(Some)));
    init();

    let toggle_sort = move |field: SortField| {
        move |_: leptos::ev::MouseEvent| {
            let current = state.with_untracked(|c| c.sort());
            if current.field == field {
                dispatch(state.try_update(|c| c.set_sort_direction(current.direction.toggled())));
            } else {
                dispatch(state.try_update(|c| c.set_sort(field.key())));
            }
        }
    };

    let on_scroll = move |ev: web_sys::Event| {
        let el = event_target::<web_sys::Element>(&ev);
        let near_bottom =
            el.scroll_top() + el.client_height() >= el.scroll_height() - SCROLL_THRESHOLD_PX;
        if !near_bottom {
            return;
        }
        if state.with_untracked(|c| c.is_loading() || c.reached_end()) {
            return;
        }
        dispatch(state.try_update(|c| c.load_more()));
    };

    let on_search = Callback::new(move |text: String| {
        state.update(|c| {
            c.search(&text);
        });
    });

    let fill_test_data = move |_: leptos::ev::MouseEvent| {
        wasm_bindgen_futures::spawn_local(async move {
            match api::insert_test_data().await {
                Ok(()) => init(),
                Err(e) => set_error.set(Some(e.to_string())),
            }
        });
    };

    let visible = move || state.with(|c| c.visible_items());
    // Memo: поле поиска синхронизируется только при смене самого запроса
    let search_query = Memo::new(move |_| state.with(|c| c.query().to_string()));

    view! {
        <div class="content">
            <div class="header">
                <h2>{Book::list_name()}</h2>
                <div class="header__actions">
                    <SearchInput value=search_query on_change=on_search />
                    <select
                        class="form__select"
                        prop:value=move || state.with(|c| c.sort().field.key())
                        on:change=move |ev| {
                            let key = event_target_value(&ev);
                            dispatch(state.try_update(|c| c.set_sort(&key)));
                        }
                    >
                        {SortField::ALL.into_iter().map(|field| view! {
                            <option value=field.key()>{field.label()}</option>
                        }).collect_view()}
                    </select>
                    <button
                        class="button button--secondary"
                        on:click=move |_| {
                            let direction = state.with_untracked(|c| c.sort().direction).toggled();
                            dispatch(state.try_update(|c| c.set_sort_direction(direction)));
                        }
                    >
                        {move || match state.with(|c| c.sort().direction) {
                            SortDirection::Ascending => "По возрастанию",
                            SortDirection::Descending => "По убыванию",
                        }}
                    </button>
                    <button class="button button--secondary" on:click=move |_| init()>
                        {"Обновить"}
                    </button>
                    <button class="button button--secondary" on:click=fill_test_data>
                        {"Заполнить тестовыми данными"}
                    </button>
                </div>
            </div>

            {move || error.get().map(|e| view! { <div class="error">{e}</div> })}

            <div
                class="table-container"
                style="max-height: 70vh; overflow-y: auto;"
                on:scroll=on_scroll
            >
                <table class="table__data table--striped">
                    <thead class="table__head">
                        <tr>
                            {SortField::ALL.into_iter().map(|field| view! {
                                <th class="table__header-cell table__header-cell--sortable" on:click=toggle_sort(field)>
                                    {field.label()}
                                    <span>{move || get_sort_indicator(state.with(|c| c.sort()), field)}</span>
                                </th>
                            }).collect_view()}
                            <th class="table__header-cell">{"Бестселлер"}</th>
                        </tr>
                    </thead>
                    <tbody>
                        {move || {
                            let query = state.with(|c| c.query().to_string());
                            visible().into_iter().map(|book| {
                                let data = book.data;
                                view! {
                                    <tr class="table__row" title=book.id.to_string()>
                                        <td class="table__cell">{highlight_matches(&data.title, &query)}</td>
                                        <td class="table__cell">{data.author}</td>
                                        <td class="table__cell">{format!("{:.2}", data.price)}</td>
                                        <td class="table__cell">{format!("{:.1}", data.rating)}</td>
                                        <td class="table__cell">{data.release_date.format("%d.%m.%Y").to_string()}</td>
                                        <td class="table__cell">{data.genre}</td>
                                        <td class="table__cell">{if data.top_seller { "✓" } else { "" }}</td>
                                    </tr>
                                }
                            }).collect_view()
                        }}
                    </tbody>
                </table>
            </div>

            <div class="list-footer">
                {move || state.with(|c| {
                    if c.is_loading() {
                        "Загрузка...".to_string()
                    } else if c.has_searched() && !c.query().trim().is_empty() {
                        format!("Найдено: {} из {}", c.visible_items().len(), c.items().len())
                    } else if c.reached_end() {
                        format!("Загружено всё: {}", c.items().len())
                    } else {
                        format!("Загружено: {}", c.items().len())
                    }
                })}
            </div>
        </div>
    }
}
