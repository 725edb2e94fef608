use std::collections::HashSet;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::api::{cover_url, CoverSize, SearchClient};
use crate::db::{LibraryStore, StoreError, StoreResult};
use crate::models::BookRecord;

use super::forms::{ConfirmBookRemove, SearchField, SearchForm};
use super::helpers::{centered_rect, ellipsize, surface_error};
use super::screens::{LibraryScreen, SearchScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// The two sections of the UI, mirroring the search/library toggle of the
/// original layout. Both keep their state while the other is visible.
enum View {
    Search,
    Library,
}

/// Fine-grained modes layered over the current view.
enum Mode {
    Normal,
    EditingSearch(SearchForm),
    ConfirmRemove(ConfirmBookRemove),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
///
/// The store handle is optional: when opening the library failed at startup
/// the app keeps running in search-only mode and every persistence action
/// explains itself instead. Store and search failures never leave the event
/// loop; they land in the status footer and the user retries the action.
pub struct App {
    store: Option<LibraryStore>,
    client: SearchClient,
    view: View,
    mode: Mode,
    search: SearchScreen,
    library: LibraryScreen,
    status: Option<StatusMessage>,
    saved_form: Option<SearchForm>,
}

impl App {
    pub fn new(store: StoreResult<LibraryStore>, client: SearchClient) -> Self {
        let (store, startup_error) = match store {
            Ok(store) => (Some(store), None),
            Err(err) => (None, Some(err)),
        };

        let mut app = Self {
            store,
            client,
            view: View::Search,
            mode: Mode::Normal,
            search: SearchScreen::default(),
            library: LibraryScreen::default(),
            status: None,
            saved_form: None,
        };

        match startup_error {
            Some(err) => app.set_status(
                format!("{err}. Search still works; the library is disabled."),
                StatusKind::Error,
            ),
            None => app.reload_library(None),
        }

        app
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::EditingSearch(form) => self.handle_search_form(code, form)?,
            Mode::ConfirmRemove(confirm) => self.handle_confirm_remove(code, confirm)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.view {
            View::Search => match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc => self.clear_status(),
                KeyCode::Char('/') | KeyCode::Char('s') | KeyCode::Char('S') => {
                    self.clear_status();
                    let form = self.saved_form.clone().unwrap_or_else(SearchForm::new);
                    return Ok(Mode::EditingSearch(form));
                }
                KeyCode::Tab | KeyCode::Char('l') | KeyCode::Char('L') => {
                    self.open_library_view();
                }
                KeyCode::Up => self.search.move_selection(-1),
                KeyCode::Down => self.search.move_selection(1),
                KeyCode::PageUp => self.search.move_selection(-5),
                KeyCode::PageDown => self.search.move_selection(5),
                KeyCode::Home => self.search.select_first(),
                KeyCode::End => self.search.select_last(),
                KeyCode::Enter | KeyCode::Char('a') | KeyCode::Char('A') => {
                    self.add_selected_book();
                }
                KeyCode::Char('c') | KeyCode::Char('C') => self.open_selected_cover(),
                _ => {}
            },
            View::Library => match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc | KeyCode::Tab | KeyCode::Char('s') | KeyCode::Char('S') => {
                    self.clear_status();
                    self.view = View::Search;
                }
                KeyCode::Up => self.library.move_selection(-1),
                KeyCode::Down => self.library.move_selection(1),
                KeyCode::PageUp => self.library.move_selection(-5),
                KeyCode::PageDown => self.library.move_selection(5),
                KeyCode::Home => self.library.select_first(),
                KeyCode::End => self.library.select_last(),
                KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('R') => {
                    self.toggle_read_status();
                }
                KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                    if let Some(book) = self.library.current_book() {
                        let confirm = ConfirmBookRemove::from_book(book);
                        self.clear_status();
                        return Ok(Mode::ConfirmRemove(confirm));
                    }
                    self.set_status("No book selected to remove.", StatusKind::Error);
                }
                KeyCode::Char('c') | KeyCode::Char('C') => self.open_selected_cover(),
                _ => {}
            },
        }

        Ok(Mode::Normal)
    }

    fn handle_search_form(&mut self, code: KeyCode, mut form: SearchForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                // Keep the edits so reopening the form does not lose them.
                self.saved_form = Some(form);
                Ok(Mode::Normal)
            }
            KeyCode::Enter => self.run_search(form),
            KeyCode::Tab | KeyCode::Down => {
                form.focus_next();
                Ok(Mode::EditingSearch(form))
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.focus_previous();
                Ok(Mode::EditingSearch(form))
            }
            KeyCode::Backspace => {
                form.backspace();
                form.error = None;
                Ok(Mode::EditingSearch(form))
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
                Ok(Mode::EditingSearch(form))
            }
            _ => Ok(Mode::EditingSearch(form)),
        }
    }

    fn handle_confirm_remove(&mut self, code: KeyCode, confirm: ConfirmBookRemove) -> Result<Mode> {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.remove_book(&confirm);
                Ok(Mode::Normal)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Ok(Mode::Normal),
            _ => Ok(Mode::ConfirmRemove(confirm)),
        }
    }

    /// Submit the form against the catalog. The request blocks the event
    /// loop until it completes or fails; the UI issues one remote call at a
    /// time, the same way it issues one store operation at a time.
    fn run_search(&mut self, mut form: SearchForm) -> Result<Mode> {
        let query = match form.parse_inputs() {
            Ok(query) => query,
            Err(err) => {
                form.error = Some(surface_error(&err));
                return Ok(Mode::EditingSearch(form));
            }
        };

        let outcome = self.client.search(&query);
        self.saved_form = Some(form);

        match outcome {
            Ok(results) if results.books.is_empty() => {
                self.search = SearchScreen::default();
                self.set_status("No books found!", StatusKind::Error);
            }
            Ok(results) => {
                let (in_library, membership_error) = match self.library_keys() {
                    Ok(keys) => (keys, None),
                    Err(err) => (HashSet::new(), Some(err)),
                };

                let shown = results.books.len();
                self.search = SearchScreen::new(results.books, in_library);
                self.view = View::Search;

                match membership_error {
                    Some(err) => self.set_status(
                        format!("Results shown, but the library could not be read: {err}"),
                        StatusKind::Error,
                    ),
                    None => self.set_status(
                        format!("Showing {shown} of {} matches.", results.num_found),
                        StatusKind::Info,
                    ),
                }
            }
            Err(err) => {
                // Single attempt, no retry. The previous results stay up.
                self.set_status(format!("Failed to fetch books: {err}"), StatusKind::Error);
            }
        }

        Ok(Mode::Normal)
    }

    fn add_selected_book(&mut self) {
        let Some(book) = self.search.current_book().cloned() else {
            self.set_status("No search result selected.", StatusKind::Error);
            return;
        };

        let existing = match self.store.as_ref() {
            Some(store) => store.fetch_book(&book.key),
            None => {
                self.set_status(
                    "The library is unavailable; books cannot be added.",
                    StatusKind::Error,
                );
                return;
            }
        };

        match existing {
            Ok(Some(_)) => {
                self.search.mark_in_library(book.key);
                self.set_status(
                    format!("\"{}\" is already in your library.", book.title),
                    StatusKind::Info,
                );
                return;
            }
            Ok(None) => {}
            Err(err) => {
                self.set_status(format!("Failed to check the library: {err}"), StatusKind::Error);
                return;
            }
        }

        // Persist an unread copy; read state belongs to the library, not to
        // the search result.
        let record = BookRecord {
            is_read: false,
            ..book
        };

        let write = match self.store.as_ref() {
            Some(store) => store.upsert_book(&record),
            None => return,
        };

        match write {
            Ok(()) => {
                self.search.mark_in_library(record.key.clone());
                self.set_status(
                    format!("Added \"{}\" to your library.", record.title),
                    StatusKind::Info,
                );
                self.reload_library(Some(&record.key));
            }
            Err(err) => self.set_status(
                format!("Failed to add \"{}\": {err}", record.title),
                StatusKind::Error,
            ),
        }
    }

    fn toggle_read_status(&mut self) {
        let Some(book) = self.library.current_book().cloned() else {
            self.set_status("No book selected.", StatusKind::Error);
            return;
        };

        // Full-record rewrite: the store has no partial update.
        let mut updated = book;
        updated.is_read = !updated.is_read;

        let write = match self.store.as_ref() {
            Some(store) => store.upsert_book(&updated),
            None => {
                self.set_status("The library is unavailable.", StatusKind::Error);
                return;
            }
        };

        match write {
            Ok(()) => {
                let state = if updated.is_read { "read" } else { "unread" };
                self.set_status(
                    format!("Marked \"{}\" as {state}.", updated.title),
                    StatusKind::Info,
                );
                self.reload_library(Some(&updated.key));
            }
            Err(err) => self.set_status(
                format!("Failed to update \"{}\": {err}", updated.title),
                StatusKind::Error,
            ),
        }
    }

    fn remove_book(&mut self, confirm: &ConfirmBookRemove) {
        let write = match self.store.as_ref() {
            Some(store) => store.remove_book(&confirm.key),
            None => {
                self.set_status("The library is unavailable.", StatusKind::Error);
                return;
            }
        };

        match write {
            Ok(()) => {
                self.search.unmark_in_library(&confirm.key);
                self.set_status(
                    format!("Removed \"{}\" from your library.", confirm.title),
                    StatusKind::Info,
                );
                self.reload_library(None);
            }
            Err(err) => self.set_status(
                format!("Failed to remove \"{}\": {err}", confirm.title),
                StatusKind::Error,
            ),
        }
    }

    fn open_selected_cover(&mut self) {
        let book = match self.view {
            View::Search => self.search.current_book(),
            View::Library => self.library.current_book(),
        };
        let Some(book) = book.cloned() else {
            self.set_status("No book selected.", StatusKind::Error);
            return;
        };
        let Some(cover_id) = book.cover_id else {
            self.set_status(
                format!("\"{}\" has no cover image.", book.title),
                StatusKind::Info,
            );
            return;
        };

        // Covers are only ever requested on this action, and the download
        // itself happens in the browser.
        let url = cover_url(cover_id, CoverSize::Medium);
        match open_link(&url) {
            Ok(()) => self.set_status(
                format!("Opened cover of \"{}\".", book.title),
                StatusKind::Info,
            ),
            Err(err) => self.set_status(format!("Failed to open cover: {err}"), StatusKind::Error),
        }
    }

    fn open_library_view(&mut self) {
        self.clear_status();
        self.reload_library(None);
        self.view = View::Library;
    }

    /// Re-query the library and refresh the list, keeping the selection on
    /// `focus_key` where possible. A read failure lands in the footer and the
    /// previous rows stay up.
    fn reload_library(&mut self, focus_key: Option<&str>) {
        let fetched = match self.store.as_ref() {
            Some(store) => store.fetch_books(),
            None => return,
        };

        match fetched {
            Ok(books) => self.library.set_books(books, focus_key),
            Err(err) => self.set_status(
                format!("Failed to load the library: {err}"),
                StatusKind::Error,
            ),
        }
    }

    fn library_keys(&self) -> Result<HashSet<String>, StoreError> {
        match self.store.as_ref() {
            Some(store) => Ok(store
                .fetch_books()?
                .into_iter()
                .map(|book| book.key)
                .collect()),
            None => Ok(HashSet::new()),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match self.view {
            View::Search => self.draw_search_view(frame, content_area),
            View::Library => self.draw_library_view(frame, content_area),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::EditingSearch(form) => self.draw_search_form(frame, area, form),
            Mode::ConfirmRemove(confirm) => self.draw_confirm_remove(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_search_view(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let summary = match &self.saved_form {
            Some(form) => form.summary(),
            None => "No search yet.".to_string(),
        };
        let header = Paragraph::new(Line::from(vec![
            Span::styled("Catalog", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  {summary}")),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Search"));
        frame.render_widget(header, chunks[0]);

        if self.search.results.is_empty() {
            let message = Paragraph::new("No results. Press '/' to search the catalog.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Results"));
            frame.render_widget(message, chunks[1]);
            return;
        }

        let width = chunks[1].width.saturating_sub(3) as usize;
        let items: Vec<ListItem> = self
            .search
            .results
            .iter()
            .map(|book| {
                let badge = if self.search.is_in_library(book) {
                    Some(Span::styled("[in library]", Style::default().fg(Color::Green)))
                } else {
                    None
                };
                ListItem::new(book_lines(book, badge, width))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Results ({})",
                self.search.results.len()
            )))
            .highlight_style(Style::default().fg(Color::Yellow));
        let mut state = ListState::default().with_selected(Some(self.search.selected));
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_library_view(&self, frame: &mut Frame, area: Rect) {
        if self.store.is_none() {
            let message = Paragraph::new(
                "The library is unavailable this session. Searching still works.",
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("My Library"));
            frame.render_widget(message, area);
            return;
        }

        if self.library.books.is_empty() {
            let message = Paragraph::new("Your library is empty. Add books from the search view.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("My Library"));
            frame.render_widget(message, area);
            return;
        }

        let read_count = self
            .library
            .books
            .iter()
            .filter(|book| book.is_read)
            .count();
        let title = format!(
            "My Library ({} books, {read_count} read)",
            self.library.books.len()
        );

        let width = area.width.saturating_sub(3) as usize;
        let items: Vec<ListItem> = self
            .library
            .books
            .iter()
            .map(|book| {
                let badge = if book.is_read {
                    Span::styled("[Read]", Style::default().fg(Color::Green))
                } else {
                    Span::styled("[Unread]", Style::default().fg(Color::DarkGray))
                };
                ListItem::new(book_lines(book, Some(badge), width))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().fg(Color::Yellow));
        let mut state = ListState::default().with_selected(Some(self.library.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        match (&self.view, &self.mode) {
            (_, Mode::EditingSearch(_)) => Line::from(vec![
                Span::styled("[Tab/↓]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[Shift-Tab/↑]", key_style),
                Span::raw(" Previous   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Search   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (_, Mode::ConfirmRemove(_)) => Line::from(vec![
                Span::styled("[y]", key_style),
                Span::raw(" Remove   "),
                Span::styled("[n]", key_style),
                Span::raw(" Keep"),
            ]),
            (View::Search, _) => Line::from(vec![
                Span::styled("[/]", key_style),
                Span::raw(" Search   "),
                Span::styled("[↑↓]", key_style),
                Span::raw(" Select   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Add to Library   "),
                Span::styled("[c]", key_style),
                Span::raw(" Cover   "),
                Span::styled("[Tab]", key_style),
                Span::raw(" Library   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
            (View::Library, _) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Select   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Toggle Read   "),
                Span::styled("[-]", key_style),
                Span::raw(" Remove   "),
                Span::styled("[c]", key_style),
                Span::raw(" Cover   "),
                Span::styled("[Tab]", key_style),
                Span::raw(" Search   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_search_form(&self, frame: &mut Frame, area: Rect, form: &SearchForm) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Search Catalog").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = SearchField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to search • Tab to switch fields • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let row = SearchField::ALL
            .iter()
            .position(|field| *field == form.active)
            .unwrap_or(0) as u16;
        let prefix = form.active.label().len() as u16 + 2;
        let cursor_x = inner.x + prefix + form.value_len(form.active) as u16;
        let cursor_y = inner.y + row;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm_remove(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBookRemove) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Remove Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let lines = vec![
            Line::from(format!(
                "Remove \"{}\" from your library?",
                confirm.title
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("[y]", key_style),
                Span::raw(" Remove   "),
                Span::styled("[n]", key_style),
                Span::raw(" Keep"),
            ]),
        ];

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

/// Three-line card for one book plus a trailing spacer, shared by both list
/// views. `badge` carries the view-specific marker (library membership or
/// read state).
fn book_lines(book: &BookRecord, badge: Option<Span<'static>>, width: usize) -> Vec<Line<'static>> {
    let mut title_spans = vec![Span::styled(
        ellipsize(&book.title, width),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(badge) = badge {
        title_spans.push(Span::raw("  "));
        title_spans.push(badge);
    }

    let meta = format!(
        "Author: {}  Year: {}  Pages: {}",
        book.display_author(),
        book.display_year(),
        book.display_pages()
    );

    vec![
        Line::from(title_spans),
        Line::from(Span::raw(ellipsize(&meta, width))),
        Line::from(Span::styled(
            ellipsize(book.display_description(), width),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ]
}
