use leptos::prelude::*;

use super::controller::BookListController;

pub fn create_state() -> RwSignal<BookListController> {
    RwSignal::new(BookListController::default())
}
