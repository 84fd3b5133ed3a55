use crate::domain::a001_book::ui::list::BookList;
use crate::domain::a001_book::ui::lookup::BookLookup;
use leptos::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Catalog,
    Lookup,
}

impl Tab {
    fn title(self) -> &'static str {
        match self {
            Tab::Catalog => "Каталог",
            Tab::Lookup => "Поиск по ID",
        }
    }
}

#[component]
pub fn App() -> impl IntoView {
    let (tab, set_tab) = signal(Tab::Catalog);

    view! {
        <div class="app">
            <nav class="tabs">
                {[Tab::Catalog, Tab::Lookup].into_iter().map(|t| view! {
                    <button
                        class="tabs__item"
                        class:tabs__item--active=move || tab.get() == t
                        on:click=move |_| set_tab.set(t)
                    >
                        {t.title()}
                    </button>
                }).collect_view()}
            </nav>
            // вкладка пересоздаётся при переключении, список загружается заново
            {move || match tab.get() {
                Tab::Catalog => view! { <BookList /> }.into_any(),
                Tab::Lookup => view! { <BookLookup /> }.into_any(),
            }}
        </div>
    }
}
