//! Состояние списка книг: сортировка, постраничная догрузка, локальный поиск.
//!
//! Контроллер не делает I/O сам. Каждое действие пользователя возвращает
//! `FetchTicket` (если нужен запрос), а ответ сервера передаётся обратно
//! в `complete`. Так контроллер одинаково работает и в браузере
//! (`spawn_local`), и в нативных тестах.
//!
//! Правила:
//! - пока идёт запрос, новая страница не запрашивается;
//! - смена сортировки во время запроса ставит перезагрузку в очередь,
//!   ответ на устаревший запрос отбрасывается;
//! - ошибка запроса не меняет уже показанные элементы; если не удалась
//!   перезагрузка, следующее действие снова запрашивает страницу 0;
//! - поиск фильтрует только загруженные элементы и ничего не запрашивает.

use contracts::domain::a001_book::aggregate::Book;
use contracts::domain::a001_book::query::{
    title_matches, CatalogQuery, PageSpec, SortDirection, SortField, SortSpec, DEFAULT_PAGE_SIZE,
};

use crate::domain::a001_book::api::{CatalogQueryService, ListError};

/// Как ответ сливается с уже загруженными элементами
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Заменить все элементы
    Replace,
    /// Дописать в конец
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum FetchPhase {
    #[default]
    Idle,
    Fetching {
        token: u64,
    },
}

/// Выданный контроллером запрос, который нужно выполнить
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    token: u64,
    mode: FetchMode,
    query: CatalogQuery,
    /// Номер страницы, к которому откатиться, если догрузка не удалась
    rollback_page: Option<usize>,
}

impl FetchTicket {
    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }
}

/// Итог обработки ответа
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Ответ применён, получено `received` элементов
    Merged { received: usize },
    /// Ответ относился к устаревшей сортировке; нужно выполнить новый запрос
    Superseded(FetchTicket),
    /// Ответ на запрос, который уже не ждут; состояние не изменилось
    Discarded,
}

#[derive(Debug, Clone)]
pub struct BookListController {
    sort: SortSpec,
    page: usize,
    page_size: usize,
    phase: FetchPhase,
    items: Vec<Book>,
    query: String,
    searched: bool,
    reached_end: bool,
    pending_replace: bool,
    /// Показанные элементы не соответствуют текущей сортировке
    needs_reload: bool,
    last_token: u64,
}

impl Default for BookListController {
    fn default() -> Self {
        Self {
            sort: SortSpec::default(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            phase: FetchPhase::Idle,
            items: Vec::new(),
            query: String::new(),
            searched: false,
            reached_end: false,
            pending_replace: false,
            needs_reload: false,
            last_token: 0,
        }
    }
}

impl BookListController {
    pub fn new(page_size: usize) -> Result<Self, ListError> {
        PageSpec::new(page_size, 0)?;
        Ok(Self {
            page_size,
            ..Self::default()
        })
    }

    // ------------------------------------------------------------------
    // Действия
    // ------------------------------------------------------------------

    /// Первый показ: страница 0, пустой поиск, загрузка с заменой.
    /// Ответы на все ранее выданные запросы после этого отбрасываются.
    pub fn init(&mut self) -> Result<FetchTicket, ListError> {
        let query = self.query_for_page(0)?;
        self.page = 0;
        self.query.clear();
        self.searched = false;
        self.reached_end = false;
        self.pending_replace = false;
        self.needs_reload = false;
        self.phase = FetchPhase::Idle;
        Ok(self.issue(FetchMode::Replace, query, None))
    }

    /// Сменить поле сортировки по ключу API (`title`, `price`, ...)
    ///
    /// Неизвестный ключ отклоняется до любых изменений состояния.
    pub fn set_sort(&mut self, key: &str) -> Result<Option<FetchTicket>, ListError> {
        let field: SortField = key.parse()?;
        self.sort.field = field;
        self.restart()
    }

    pub fn set_sort_direction(
        &mut self,
        direction: SortDirection,
    ) -> Result<Option<FetchTicket>, ListError> {
        self.sort.direction = direction;
        self.restart()
    }

    /// Следующая страница. Пока идёт запрос, ничего не делает.
    ///
    /// После неудачной перезагрузки вместо догрузки снова запрашивается страница 0.
    pub fn load_more(&mut self) -> Result<Option<FetchTicket>, ListError> {
        if self.is_loading() {
            log::debug!("load_more ignored: fetch in progress");
            return Ok(None);
        }
        if self.needs_reload {
            return self.restart();
        }
        let previous = self.page;
        let next = previous + 1;
        let query = self.query_for_page(next)?;
        self.page = next;
        Ok(Some(self.issue(FetchMode::Append, query, Some(previous))))
    }

    /// Запрос текущей страницы с указанным режимом слияния.
    ///
    /// Во время другого запроса замена ставится в очередь, догрузка пропускается.
    pub fn request(&mut self, mode: FetchMode) -> Result<Option<FetchTicket>, ListError> {
        if self.is_loading() {
            if mode == FetchMode::Replace {
                self.pending_replace = true;
            }
            return Ok(None);
        }
        if self.needs_reload && mode == FetchMode::Append {
            return self.restart();
        }
        let query = self.query_for_page(self.page)?;
        Ok(Some(self.issue(mode, query, None)))
    }

    /// Локальный поиск по названию среди загруженных элементов.
    /// Элементы не меняются; пустой запрос возвращает всё.
    pub fn search(&mut self, text: &str) -> Vec<Book> {
        self.query = text.to_string();
        self.searched = true;
        self.visible_items()
    }

    /// Применить ответ сервера на выданный запрос
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Book>, ListError>,
    ) -> Result<Completion, ListError> {
        if self.phase != (FetchPhase::Fetching { token: ticket.token }) {
            log::debug!("Discarding response for stale request #{}", ticket.token);
            return Ok(Completion::Discarded);
        }
        self.phase = FetchPhase::Idle;

        if self.pending_replace {
            self.pending_replace = false;
            let query = self.query_for_page(self.page)?;
            log::debug!("Sort changed during request #{}, reloading", ticket.token);
            return Ok(Completion::Superseded(self.issue(FetchMode::Replace, query, None)));
        }

        match result {
            Ok(page) => {
                let received = page.len();
                self.reached_end = received < ticket.query.page.limit();
                match ticket.mode {
                    FetchMode::Replace => {
                        self.items = page;
                        self.needs_reload = false;
                    }
                    FetchMode::Append => self.items.extend(page),
                }
                Ok(Completion::Merged { received })
            }
            Err(e) => {
                match ticket.mode {
                    FetchMode::Replace => self.needs_reload = true,
                    FetchMode::Append => {
                        if let Some(page) = ticket.rollback_page {
                            self.page = page;
                        }
                    }
                }
                log::error!("Catalog request #{} failed: {}", ticket.token, e);
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Выполнение запросов через сервис
    // ------------------------------------------------------------------

    /// Выполнить запрос и применить ответ (с перезапросами при смене сортировки)
    pub async fn run<S>(&mut self, service: &S, ticket: FetchTicket) -> Result<usize, ListError>
    where
        S: CatalogQueryService + ?Sized,
    {
        let mut ticket = ticket;
        loop {
            let result = service.find_all(ticket.query()).await;
            match self.complete(ticket, result)? {
                Completion::Merged { received } => return Ok(received),
                Completion::Superseded(next) => ticket = next,
                Completion::Discarded => return Ok(0),
            }
        }
    }

    /// Запросить текущую страницу и дождаться результата
    pub async fn fetch<S>(&mut self, service: &S, mode: FetchMode) -> Result<usize, ListError>
    where
        S: CatalogQueryService + ?Sized,
    {
        match self.request(mode)? {
            Some(ticket) => self.run(service, ticket).await,
            None => Ok(0),
        }
    }

    // ------------------------------------------------------------------
    // Чтение состояния
    // ------------------------------------------------------------------

    /// Загруженные элементы, прошедшие текущий поиск
    pub fn visible_items(&self) -> Vec<Book> {
        self.items
            .iter()
            .filter(|b| title_matches(&b.data.title, &self.query))
            .cloned()
            .collect()
    }

    pub fn items(&self) -> &[Book] {
        &self.items
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, FetchPhase::Fetching { .. })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn has_searched(&self) -> bool {
        self.searched
    }

    /// Последняя полученная страница была короче лимита
    pub fn reached_end(&self) -> bool {
        self.reached_end
    }

    // ------------------------------------------------------------------

    fn restart(&mut self) -> Result<Option<FetchTicket>, ListError> {
        self.page = 0;
        self.request(FetchMode::Replace)
    }

    fn query_for_page(&self, page: usize) -> Result<CatalogQuery, ListError> {
        Ok(CatalogQuery {
            sort: self.sort,
            filter: None,
            page: PageSpec::for_page(page, self.page_size)?,
        })
    }

    fn issue(
        &mut self,
        mode: FetchMode,
        query: CatalogQuery,
        rollback_page: Option<usize>,
    ) -> FetchTicket {
        self.last_token += 1;
        self.phase = FetchPhase::Fetching {
            token: self.last_token,
        };
        FetchTicket {
            token: self.last_token,
            mode,
            query,
            rollback_page,
        }
    }
}
