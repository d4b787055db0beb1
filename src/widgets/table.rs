//! Generic interactive table.
//!
//! A [`TableWidget`] knows nothing about the rows it shows. Callers inject a
//! loader, a row formatter, a filter predicate, a selection handler and any
//! number of keyed per-row actions; the widget owns the loading spinner, the
//! live search box, cursor movement and dispatch.

use anyhow::Result;
use futures::future::BoxFuture;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use tracing::{debug, info, warn};

use crate::input::{Action, map_key, normalize_hotkey_spec};
use crate::runtime::{Command, Message, Screen};
use crate::theme::Theme;
use crate::widgets::search::{DEFAULT_CHAR_LIMIT, SearchInput};
use crate::widgets::spinner::Spinner;

pub const DEFAULT_TABLE_HEIGHT: usize = 10;

pub type LoadFuture<T> = BoxFuture<'static, Result<Vec<T>>>;
type Loader<T> = Box<dyn FnOnce() -> LoadFuture<T> + Send>;
type Formatter<T> = Box<dyn Fn(&T) -> Vec<String> + Send + Sync>;
type Predicate<T> = Box<dyn Fn(&T, &str) -> bool + Send + Sync>;
type Handler<T> = Box<dyn Fn(&T) -> Command + Send + Sync>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Column {
    pub title: String,
    pub width: u16,
}

impl Column {
    pub fn new(title: impl Into<String>, width: u16) -> Self {
        Self {
            title: title.into(),
            width,
        }
    }
}

/// An extra per-row operation bound to a key while browsing.
pub struct CustomOption<T> {
    /// `None` when the key cannot be bound.
    key: Option<String>,
    title: String,
    action: Handler<T>,
}

impl<T> CustomOption<T> {
    pub fn new(
        key: &str,
        title: impl Into<String>,
        action: impl Fn(&T) -> Command + Send + Sync + 'static,
    ) -> Self {
        let normalized = normalize_hotkey_spec(key);
        if normalized.is_none() {
            warn!("custom option key {key:?} is reserved or unknown, option dropped");
        }
        Self {
            key: normalized,
            title: title.into(),
            action: Box::new(action),
        }
    }

    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TableMode {
    Loading,
    Browsing,
    Searching,
}

/// Loader outcome posted back through the runtime.
enum LoadOutcome<T> {
    Loaded(Vec<T>),
    Failed(anyhow::Error),
}

pub struct TableWidget<T> {
    name: String,
    mode: TableMode,
    current_filter: String,
    data: Vec<T>,
    /// Indices into `data`, in order, of the items passing the current filter.
    filtered: Vec<usize>,
    rows: Vec<Vec<String>>,
    state: TableState,
    focused: bool,
    height: usize,
    spinner: Spinner,
    search: SearchInput,
    columns: Vec<Column>,
    loader: Option<Loader<T>>,
    format: Formatter<T>,
    on_select: Handler<T>,
    filter: Predicate<T>,
    custom_options: Vec<CustomOption<T>>,
}

impl<T: Send + 'static> TableWidget<T> {
    pub fn new<L, F, S, P>(
        name: impl Into<String>,
        load: L,
        format: F,
        on_select: S,
        columns: Vec<Column>,
        filter: P,
        custom_options: Vec<CustomOption<T>>,
    ) -> Self
    where
        L: FnOnce() -> LoadFuture<T> + Send + 'static,
        F: Fn(&T) -> Vec<String> + Send + Sync + 'static,
        S: Fn(&T) -> Command + Send + Sync + 'static,
        P: Fn(&T, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            mode: TableMode::Loading,
            current_filter: String::new(),
            data: Vec::new(),
            filtered: Vec::new(),
            rows: Vec::new(),
            state: TableState::default(),
            focused: true,
            height: DEFAULT_TABLE_HEIGHT,
            spinner: Spinner::default(),
            search: SearchInput::new(DEFAULT_CHAR_LIMIT),
            columns,
            loader: Some(Box::new(load)),
            format: Box::new(format),
            on_select: Box::new(on_select),
            filter: Box::new(filter),
            custom_options: custom_options
                .into_iter()
                .filter(|option| option.key.is_some())
                .collect(),
        }
    }

    pub fn with_height(mut self, height: usize) -> Self {
        self.height = height.max(1);
        self
    }

    pub fn with_char_limit(mut self, char_limit: usize) -> Self {
        self.search = SearchInput::new(char_limit);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> TableMode {
        self.mode
    }

    pub fn current_filter(&self) -> &str {
        &self.current_filter
    }

    pub fn search_value(&self) -> String {
        self.search.value()
    }

    pub fn focused(&self) -> bool {
        self.focused
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Items passing the current filter, in data order.
    pub fn filtered(&self) -> impl Iterator<Item = &T> {
        self.filtered.iter().filter_map(|&index| self.data.get(index))
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state.selected()
    }

    /// The item under the cursor, resolved by row position in the filtered set.
    pub fn selected_item(&self) -> Option<&T> {
        let row = self.selected_index()?;
        self.filtered().nth(row)
    }

    pub fn custom_options(&self) -> &[CustomOption<T>] {
        &self.custom_options
    }

    /// Starts the one-shot load. Later calls return [`Command::None`].
    pub fn init(&mut self) -> Command {
        let Some(load) = self.loader.take() else {
            return Command::None;
        };
        info!(table = %self.name, "loading");
        let future = load();
        Command::task(async move {
            match future.await {
                Ok(items) => Command::deliver(LoadOutcome::Loaded(items)),
                Err(error) => Command::deliver(LoadOutcome::<T>::Failed(error)),
            }
        })
    }

    pub fn update(&mut self, message: Message) -> Command {
        match message {
            Message::Payload(payload) => match payload.downcast::<LoadOutcome<T>>() {
                Ok(outcome) => self.on_load(*outcome),
                Err(_) => {
                    debug!(table = %self.name, "ignoring foreign payload");
                    Command::None
                }
            },
            Message::Tick => {
                match self.mode {
                    TableMode::Loading => self.spinner.tick(),
                    TableMode::Searching => self.search.tick(),
                    TableMode::Browsing => {}
                }
                Command::None
            }
            Message::Key(key) => match map_key(self.mode, key) {
                Some(action) => self.apply_action(action),
                None => Command::None,
            },
        }
    }

    pub fn apply_action(&mut self, action: Action) -> Command {
        match self.mode {
            TableMode::Loading => Command::None,
            TableMode::Browsing => self.apply_browsing(action),
            TableMode::Searching => self.apply_searching(action),
        }
    }

    fn on_load(&mut self, outcome: LoadOutcome<T>) -> Command {
        if self.mode != TableMode::Loading {
            debug!(table = %self.name, "ignoring duplicate load result");
            return Command::None;
        }
        match outcome {
            LoadOutcome::Loaded(items) => {
                info!(table = %self.name, count = items.len(), "loaded");
                self.data = items;
                self.current_filter.clear();
                self.filtered = (0..self.data.len()).collect();
                self.update_rows();
                self.mode = TableMode::Browsing;
                Command::None
            }
            LoadOutcome::Failed(error) => {
                // Stays in Loading so no table is ever drawn for a failed load.
                warn!(table = %self.name, "load failed: {error:#}");
                Command::Fail(error.context(format!("failed to load {}", self.name)))
            }
        }
    }

    fn apply_browsing(&mut self, action: Action) -> Command {
        match action {
            Action::StartSearch => {
                self.mode = TableMode::Searching;
                self.search.focus();
                Command::None
            }
            Action::Cancel => {
                self.focused = !self.focused;
                Command::None
            }
            Action::Select => self.select_current(),
            Action::Up if self.focused => {
                self.move_selection(-1);
                Command::None
            }
            Action::Down if self.focused => {
                self.move_selection(1);
                Command::None
            }
            Action::Hotkey(signature) => self.run_custom_option(&signature),
            _ => Command::None,
        }
    }

    fn apply_searching(&mut self, action: Action) -> Command {
        match action {
            Action::Select => {
                self.mode = TableMode::Browsing;
                self.search.blur();
                self.select_current()
            }
            Action::Cancel => {
                self.cancel_search();
                Command::None
            }
            Action::Up => {
                self.move_selection(-1);
                Command::None
            }
            Action::Down => {
                self.move_selection(1);
                Command::None
            }
            Action::InputChar(c) => {
                self.search.insert(c);
                self.refilter();
                Command::None
            }
            Action::Backspace => {
                self.search.backspace();
                self.refilter();
                Command::None
            }
            Action::Delete => {
                self.search.delete();
                self.refilter();
                Command::None
            }
            Action::ClearInput => {
                self.search.clear();
                self.refilter();
                Command::None
            }
            Action::CursorLeft => {
                self.search.move_left();
                Command::None
            }
            Action::CursorRight => {
                self.search.move_right();
                Command::None
            }
            Action::CursorHome => {
                self.search.move_home();
                Command::None
            }
            Action::CursorEnd => {
                self.search.move_end();
                Command::None
            }
            Action::StartSearch | Action::Hotkey(_) => Command::None,
        }
    }

    fn cancel_search(&mut self) {
        self.mode = TableMode::Browsing;
        self.search.reset();
        self.current_filter.clear();
        self.filtered = (0..self.data.len()).collect();
        self.update_rows();
    }

    fn refilter(&mut self) {
        self.current_filter = self.search_value();
        self.filtered = filter_indices(&self.data, &self.current_filter, &self.filter);
        debug!(
            table = %self.name,
            filter = %self.current_filter,
            matches = self.filtered.len(),
            "filter applied"
        );
        self.update_rows();
    }

    fn update_rows(&mut self) {
        self.rows = self
            .filtered
            .iter()
            .map(|&index| (self.format)(&self.data[index]))
            .collect();
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        if self.rows.is_empty() {
            self.state.select(None);
            return;
        }
        let max_index = self.rows.len() - 1;
        let current = self.state.selected().unwrap_or(0).min(max_index);
        self.state.select(Some(current));
    }

    fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.state.select(None);
            return;
        }
        let max_index = self.rows.len().saturating_sub(1) as isize;
        let current = self.state.selected().unwrap_or(0).min(max_index as usize) as isize;
        let next = (current + delta).clamp(0, max_index) as usize;
        self.state.select(Some(next));
    }

    fn select_current(&self) -> Command {
        let Some(item) = self.selected_item() else {
            return Command::None;
        };
        debug!(table = %self.name, row = ?self.selected_index(), "row selected");
        (self.on_select)(item)
    }

    fn run_custom_option(&self, signature: &str) -> Command {
        let Some(option) = self
            .custom_options()
            .iter()
            .find(|option| option.key() == signature)
        else {
            return Command::None;
        };
        let Some(item) = self.selected_item() else {
            return Command::None;
        };
        debug!(table = %self.name, option = %option.title(), "custom option");
        (option.action)(item)
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if self.mode == TableMode::Loading {
            let caption = Text::from(vec![
                Line::default(),
                Line::default(),
                Line::from(vec![
                    Span::raw("   "),
                    Span::styled(self.spinner.frame(), Style::default().fg(theme.spinner)),
                    Span::styled(
                        format!("Loading {}...", self.name),
                        Style::default().fg(theme.text),
                    ),
                ]),
            ]);
            frame.render_widget(Paragraph::new(caption), area);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(self.table_rows().saturating_add(4)),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);

        self.render_table(frame, chunks[0], theme);

        let footer = if self.mode == TableMode::Searching {
            let mut spans = vec![Span::styled("Search: ", Style::default().fg(theme.text))];
            spans.extend(self.search.line(theme).spans);
            Line::from(spans)
        } else {
            self.action_hints(theme)
        };
        frame.render_widget(Paragraph::new(footer), chunks[2]);
    }

    /// Visible row budget clamped to what a terminal can address.
    fn table_rows(&self) -> u16 {
        u16::try_from(self.height).unwrap_or(u16::MAX)
    }

    fn render_table(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let header = Row::new(self.columns.iter().map(|column| {
            Cell::from(column.title.clone()).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .height(1)
        .bottom_margin(1)
        .style(Style::default().fg(theme.accent));

        let width = self.columns.len();
        let rows = self.rows.iter().map(|cells| {
            Row::new((0..width).map(|index| {
                let text = cells.get(index).cloned().unwrap_or_default();
                Cell::from(text).style(Style::default().fg(theme.text))
            }))
        });

        let title = if self.current_filter().is_empty() {
            format!("{} ({})", self.name(), self.rows().len())
        } else {
            format!(
                "{} ({}/{}) filter: {}",
                self.name(),
                self.rows().len(),
                self.data().len(),
                self.current_filter()
            )
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(theme.border(self.focused()))
            .style(Style::default().bg(theme.panel));

        let widths = self
            .columns
            .iter()
            .map(|column| Constraint::Length(column.width))
            .collect::<Vec<_>>();

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .row_highlight_style(theme.selected_row(self.focused()));

        frame.render_stateful_widget(table, area, &mut self.state);
    }

    fn action_hints(&self, theme: &Theme) -> Line<'static> {
        let style = Style::default().fg(theme.hint);
        let mut hints = vec!["/ Search".to_string(), "enter Select".to_string()];
        hints.extend(
            self.custom_options()
                .iter()
                .map(|option| format!("{} {}", option.key(), option.title())),
        );

        let mut spans = Vec::new();
        for (index, hint) in hints.into_iter().enumerate() {
            if index > 0 {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(hint, style));
        }
        Line::from(spans)
    }
}

impl<T: Send + 'static> Screen for TableWidget<T> {
    fn title(&self) -> String {
        self.name().to_string()
    }

    fn init(&mut self) -> Command {
        TableWidget::init(self)
    }

    fn update(&mut self, message: Message) -> Command {
        TableWidget::update(self, message)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        TableWidget::render(self, frame, area, theme)
    }

    fn captures_text(&self) -> bool {
        self.mode() == TableMode::Searching
    }
}

/// Positions of the items in `data` accepted by `predicate` for the lowercased
/// `query`, or every position when the query is empty.
pub fn filter_indices<T, P>(data: &[T], query: &str, predicate: &P) -> Vec<usize>
where
    P: Fn(&T, &str) -> bool + ?Sized,
{
    if query.is_empty() {
        return (0..data.len()).collect();
    }
    let query = query.to_lowercase();
    data.iter()
        .enumerate()
        .filter(|(_, item)| predicate(*item, &query))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Column, CustomOption, LoadOutcome, TableMode, TableWidget, filter_indices};
    use crate::input::Action;
    use crate::runtime::{Command, Message};
    use crate::theme::Theme;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use futures::FutureExt;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        id: String,
        name: String,
    }

    fn item(id: &str, name: &str) -> Item {
        Item {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn sample() -> Vec<Item> {
        vec![
            item("a", "X"),
            item("b", "Y"),
            item("c", "api-gateway"),
            item("d", "worker"),
        ]
    }

    fn matches_name(item: &Item, query: &str) -> bool {
        item.name.to_lowercase().contains(query) || item.id.to_lowercase().contains(query)
    }

    fn widget_with(items: Vec<Item>, options: Vec<CustomOption<Item>>) -> TableWidget<Item> {
        TableWidget::new(
            "things",
            move || async move { Ok(items) }.boxed(),
            |item: &Item| vec![item.id.clone(), item.name.clone()],
            |item: &Item| Command::status(format!("selected {}", item.id)),
            vec![Column::new("ID", 10), Column::new("Name", 20)],
            matches_name,
            options,
        )
    }

    fn loaded(items: Vec<Item>) -> TableWidget<Item> {
        let mut widget = widget_with(Vec::new(), Vec::new());
        widget.update(Message::Payload(Box::new(LoadOutcome::Loaded(items))));
        widget
    }

    fn key(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_query(widget: &mut TableWidget<Item>, query: &str) {
        for c in query.chars() {
            widget.update(key(KeyCode::Char(c)));
        }
    }

    fn status_text(command: Command) -> Option<String> {
        match command {
            Command::Status(text) => Some(text),
            _ => None,
        }
    }

    fn ids(widget: &TableWidget<Item>) -> Vec<String> {
        widget
            .filtered()
            .map(|item| item.id.clone())
            .collect()
    }

    #[tokio::test]
    async fn init_runs_loader_once_and_delivers_rows() {
        let mut widget = widget_with(sample(), Vec::new());
        assert_eq!(widget.mode(), TableMode::Loading);
        assert!(widget.data().is_empty());
        assert!(widget.filtered().next().is_none());

        let Command::Task(task) = widget.init() else {
            panic!("expected load task");
        };
        assert!(widget.init().is_none());

        let Command::Deliver(payload) = task.await else {
            panic!("expected delivery");
        };
        assert!(widget.update(Message::Payload(payload)).is_none());

        assert_eq!(widget.mode(), TableMode::Browsing);
        assert_eq!(widget.data().len(), 4);
        assert_eq!(widget.rows()[1], vec!["b".to_string(), "Y".to_string()]);
        assert_eq!(widget.selected_index(), Some(0));
    }

    #[tokio::test]
    async fn load_failure_requests_termination() {
        let mut widget: TableWidget<Item> = TableWidget::new(
            "services",
            || async { Err(anyhow::anyhow!("network unreachable")) }.boxed(),
            |item: &Item| vec![item.id.clone()],
            |_: &Item| Command::None,
            vec![Column::new("ID", 10)],
            matches_name,
            Vec::new(),
        );

        let Command::Task(task) = widget.init() else {
            panic!("expected load task");
        };
        let Command::Deliver(payload) = task.await else {
            panic!("expected delivery");
        };
        let command = widget.update(Message::Payload(payload));

        let Command::Fail(error) = command else {
            panic!("expected failure, got {command:?}");
        };
        assert!(format!("{error:#}").contains("network unreachable"));
        assert!(widget.rows().is_empty());
        assert_eq!(widget.mode(), TableMode::Loading);

        let text = render_to_text(&mut widget);
        assert!(text.contains("Loading services..."));
        assert!(!text.contains("ID"));
    }

    #[test]
    fn keys_are_ignored_while_loading() {
        let mut widget = widget_with(sample(), Vec::new());
        assert!(widget.update(key(KeyCode::Char('/'))).is_none());
        assert!(widget.update(key(KeyCode::Enter)).is_none());
        assert_eq!(widget.mode(), TableMode::Loading);
    }

    #[test]
    fn typing_filters_case_insensitively() {
        let mut widget = loaded(vec![item("a", "X"), item("b", "Y")]);
        widget.update(key(KeyCode::Char('/')));
        assert_eq!(widget.mode(), TableMode::Searching);

        type_query(&mut widget, "y");

        assert_eq!(widget.current_filter(), "y");
        assert_eq!(widget.filtered().collect::<Vec<_>>(), vec![&item("b", "Y")]);
        assert_eq!(widget.rows(), &[vec!["b".to_string(), "Y".to_string()]]);
    }

    #[test]
    fn uppercase_query_is_lowercased_for_predicate() {
        let mut widget = loaded(sample());
        widget.update(key(KeyCode::Char('/')));
        type_query(&mut widget, "API");
        assert_eq!(ids(&widget), vec!["c"]);
    }

    #[test]
    fn esc_from_search_restores_everything() {
        let mut widget = loaded(sample());
        widget.update(key(KeyCode::Char('/')));
        type_query(&mut widget, "wor");
        widget.update(key(KeyCode::Backspace));
        type_query(&mut widget, "zzz");
        assert!(widget.filtered().next().is_none());
        assert_eq!(widget.selected_index(), None);

        widget.update(key(KeyCode::Esc));

        assert_eq!(widget.mode(), TableMode::Browsing);
        assert_eq!(widget.current_filter(), "");
        assert_eq!(widget.search_value(), "");
        assert_eq!(ids(&widget), vec!["a", "b", "c", "d"]);
        assert_eq!(widget.selected_index(), Some(0));
    }

    #[test]
    fn enter_in_search_keeps_filter_and_selects() {
        let mut widget = loaded(sample());
        widget.update(key(KeyCode::Char('/')));
        type_query(&mut widget, "r");
        assert_eq!(ids(&widget), vec!["d"]);

        let command = widget.update(key(KeyCode::Enter));

        assert_eq!(status_text(command).as_deref(), Some("selected d"));
        assert_eq!(widget.mode(), TableMode::Browsing);
        assert_eq!(widget.current_filter(), "r");
    }

    #[test]
    fn enter_selects_highlighted_row_by_position() {
        let mut widget = loaded(sample());
        widget.update(key(KeyCode::Down));
        widget.update(key(KeyCode::Down));

        let command = widget.update(key(KeyCode::Enter));

        assert_eq!(status_text(command).as_deref(), Some("selected c"));
    }

    #[test]
    fn duplicate_first_cells_select_the_highlighted_row() {
        let mut widget = loaded(vec![item("dup", "first"), item("dup", "second")]);
        widget.update(key(KeyCode::Down));
        assert_eq!(widget.selected_item(), Some(&item("dup", "second")));
    }

    #[test]
    fn selection_matches_displayed_row_at_every_position() {
        let mut widget = loaded(sample());
        for position in 0..widget.rows().len() {
            let displayed = widget.rows()[position].clone();
            widget.apply_action(Action::Up);
            widget.apply_action(Action::Up);
            widget.apply_action(Action::Up);
            for _ in 0..position {
                widget.apply_action(Action::Down);
            }
            let selected = widget.selected_item().expect("row under cursor");
            assert_eq!(vec![selected.id.clone(), selected.name.clone()], displayed);
        }
    }

    #[test]
    fn enter_on_empty_table_is_noop() {
        let mut widget = loaded(Vec::new());
        assert!(widget.update(key(KeyCode::Enter)).is_none());
    }

    #[test]
    fn cursor_stays_within_bounds() {
        let mut widget = loaded(sample());
        widget.update(key(KeyCode::Up));
        assert_eq!(widget.selected_index(), Some(0));
        for _ in 0..10 {
            widget.update(key(KeyCode::Down));
        }
        assert_eq!(widget.selected_index(), Some(3));
    }

    #[test]
    fn esc_while_browsing_toggles_focus_and_blur_freezes_cursor() {
        let mut widget = loaded(sample());
        widget.update(key(KeyCode::Esc));
        assert!(!widget.focused());
        widget.update(key(KeyCode::Down));
        assert_eq!(widget.selected_index(), Some(0));

        widget.update(key(KeyCode::Esc));
        assert!(widget.focused());
        widget.update(key(KeyCode::Down));
        assert_eq!(widget.selected_index(), Some(1));
    }

    #[test]
    fn custom_option_key_runs_its_own_action() {
        let options = vec![
            CustomOption::new("d", "Deploy", |item: &Item| {
                Command::status(format!("deploy {}", item.id))
            }),
            CustomOption::new("w", "Workspace", |item: &Item| {
                Command::status(format!("workspace {}", item.id))
            }),
        ];
        let mut widget = widget_with(Vec::new(), options);
        widget.update(Message::Payload(Box::new(LoadOutcome::Loaded(sample()))));
        widget.update(key(KeyCode::Down));

        let command = widget.update(key(KeyCode::Char('w')));

        assert_eq!(status_text(command).as_deref(), Some("workspace b"));
    }

    #[test]
    fn custom_option_keys_are_plain_text_while_searching() {
        let options = vec![CustomOption::new("d", "Deploy", |_: &Item| {
            Command::status("deploy")
        })];
        let mut widget = widget_with(Vec::new(), options);
        widget.update(Message::Payload(Box::new(LoadOutcome::Loaded(sample()))));
        widget.update(key(KeyCode::Char('/')));

        let command = widget.update(key(KeyCode::Char('d')));

        assert!(command.is_none());
        assert_eq!(widget.current_filter(), "d");
    }

    #[test]
    fn shifted_custom_option_key_matches_uppercase_press() {
        let options = vec![CustomOption::new("D", "Delete", |item: &Item| {
            Command::status(format!("delete {}", item.id))
        })];
        let mut widget = widget_with(Vec::new(), options);
        widget.update(Message::Payload(Box::new(LoadOutcome::Loaded(sample()))));

        let plain = widget.update(key(KeyCode::Char('d')));
        let shifted = widget.update(Message::Key(KeyEvent::new(
            KeyCode::Char('D'),
            KeyModifiers::SHIFT,
        )));

        assert!(plain.is_none());
        assert_eq!(status_text(shifted).as_deref(), Some("delete a"));
    }

    #[test]
    fn reserved_option_keys_are_dropped() {
        let options = vec![
            CustomOption::new("q", "Quiet", |_: &Item| Command::status("quiet")),
            CustomOption::new("/", "Slash", |_: &Item| Command::status("slash")),
            CustomOption::new("d", "Deploy", |_: &Item| Command::status("deploy")),
        ];
        let mut widget = widget_with(Vec::new(), options);
        widget.update(Message::Payload(Box::new(LoadOutcome::Loaded(sample()))));

        let keys = widget
            .custom_options()
            .iter()
            .map(CustomOption::key)
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["d"]);

        assert!(widget.update(key(KeyCode::Char('/'))).is_none());
        assert_eq!(widget.mode(), TableMode::Searching);

        let text = render_to_text(&mut widget);
        assert!(!text.contains("Quiet"));
        assert!(!text.contains("Slash"));
    }

    #[test]
    fn tick_advances_spinner_while_loading() {
        let mut widget = widget_with(sample(), Vec::new());
        let before = widget.spinner.frame();
        widget.update(Message::Tick);
        assert_ne!(widget.spinner.frame(), before);
    }

    #[test]
    fn filter_indices_is_ordered_subsequence() {
        let data = sample();
        for query in ["", "a", "A", "er", "zz", "-"] {
            let indices = filter_indices(&data, query, &matches_name);
            assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
            let expected = data
                .iter()
                .enumerate()
                .filter(|(_, item)| query.is_empty() || matches_name(item, &query.to_lowercase()))
                .map(|(index, _)| index)
                .collect::<Vec<_>>();
            assert_eq!(indices, expected, "query {query:?}");
        }
    }

    #[test]
    fn same_query_twice_is_idempotent() {
        let mut widget = loaded(sample());
        widget.update(key(KeyCode::Char('/')));
        type_query(&mut widget, "a");
        let once = ids(&widget);
        widget.update(key(KeyCode::Char('u')));
        widget.update(Message::Key(KeyEvent::new(
            KeyCode::Char('u'),
            KeyModifiers::CONTROL,
        )));
        type_query(&mut widget, "a");
        assert_eq!(ids(&widget), once);
    }

    #[test]
    fn loading_render_shows_caption_without_table() {
        let mut widget = widget_with(sample(), Vec::new());
        let text = render_to_text(&mut widget);
        assert!(text.contains("Loading things..."));
        assert!(!text.contains("Name"));
    }

    #[test]
    fn browsing_render_lists_rows_and_hints() {
        let options = vec![CustomOption::new("d", "Deploy", |_: &Item| Command::None)];
        let mut widget = widget_with(Vec::new(), options);
        widget.update(Message::Payload(Box::new(LoadOutcome::Loaded(sample()))));

        let text = render_to_text(&mut widget);

        assert!(text.contains("api-gateway"));
        assert!(text.contains("/ Search"));
        assert!(text.contains("d Deploy"));
    }

    #[test]
    fn searching_render_shows_query_line() {
        let mut widget = loaded(sample());
        widget.update(key(KeyCode::Char('/')));
        type_query(&mut widget, "wor");

        let text = render_to_text(&mut widget);

        assert!(text.contains("Search: wor"));
        assert!(!text.contains("/ Search"));
    }

    #[test]
    fn huge_height_renders_without_overflow() {
        let mut widget = loaded(sample()).with_height(65534);
        assert_eq!(widget.table_rows(), 65534);

        let text = render_to_text(&mut widget);

        assert!(text.contains("api-gateway"));
        assert_eq!(loaded(sample()).with_height(usize::MAX).table_rows(), u16::MAX);
    }

    fn render_to_text(widget: &mut TableWidget<Item>) -> String {
        let backend = TestBackend::new(60, 20);
        let mut terminal = Terminal::new(backend).expect("test terminal");
        terminal
            .draw(|frame| widget.render(frame, frame.area(), &Theme::default()))
            .expect("draw");
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
