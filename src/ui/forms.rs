use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::api::SearchQuery;
use crate::models::BookRecord;

/// Fields of the search form, in focus order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum SearchField {
    #[default]
    Query,
    Author,
    Subject,
    Publisher,
    Language,
}

impl SearchField {
    pub(crate) const ALL: [SearchField; 5] = [
        SearchField::Query,
        SearchField::Author,
        SearchField::Subject,
        SearchField::Publisher,
        SearchField::Language,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            SearchField::Query => "Query",
            SearchField::Author => "Author",
            SearchField::Subject => "Subject",
            SearchField::Publisher => "Publisher",
            SearchField::Language => "Language",
        }
    }

    fn next(self) -> Self {
        match self {
            SearchField::Query => SearchField::Author,
            SearchField::Author => SearchField::Subject,
            SearchField::Subject => SearchField::Publisher,
            SearchField::Publisher => SearchField::Language,
            SearchField::Language => SearchField::Query,
        }
    }

    fn previous(self) -> Self {
        match self {
            SearchField::Query => SearchField::Language,
            SearchField::Author => SearchField::Query,
            SearchField::Subject => SearchField::Author,
            SearchField::Publisher => SearchField::Subject,
            SearchField::Language => SearchField::Publisher,
        }
    }
}

/// Editable state of the catalog search form. The query is required; every
/// filter is optional and a blank filter means "do not send it". The language
/// field starts at "eng" but belongs to the user: clearing it drops the
/// filter from the request entirely.
#[derive(Debug, Default, Clone)]
pub(crate) struct SearchForm {
    pub(crate) query: String,
    pub(crate) author: String,
    pub(crate) subject: String,
    pub(crate) publisher: String,
    pub(crate) language: String,
    pub(crate) active: SearchField,
    pub(crate) error: Option<String>,
}

impl SearchForm {
    /// Fresh form with the default language filter preselected.
    pub(crate) fn new() -> Self {
        Self {
            language: "eng".to_string(),
            ..Self::default()
        }
    }

    /// Move focus to the next field.
    pub(crate) fn focus_next(&mut self) {
        self.active = self.active.next();
    }

    /// Move focus to the previous field.
    pub(crate) fn focus_previous(&mut self) {
        self.active = self.active.previous();
    }

    /// Append a printable character to the focused field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.field_mut(self.active).push(ch);
        true
    }

    /// Remove the last character from the focused field.
    pub(crate) fn backspace(&mut self) {
        self.field_mut(self.active).pop();
    }

    /// Validate the form and produce the wire query. Only the free-text query
    /// is mandatory; filters come through as `None` when blank.
    pub(crate) fn parse_inputs(&self) -> Result<SearchQuery> {
        let text = self.query.trim();
        if text.is_empty() {
            return Err(anyhow!("Search query is required."));
        }

        let mut query = SearchQuery::new(text);
        query.author = optional(&self.author);
        query.subject = optional(&self.subject);
        query.publisher = optional(&self.publisher);
        query.language = optional(&self.language);
        Ok(query)
    }

    /// One-line summary of the submitted search for the results header.
    pub(crate) fn summary(&self) -> String {
        let mut parts = vec![format!("\"{}\"", self.query.trim())];
        for (label, value) in [
            ("author", &self.author),
            ("subject", &self.subject),
            ("publisher", &self.publisher),
            ("language", &self.language),
        ] {
            let value = value.trim();
            if !value.is_empty() {
                parts.push(format!("{label}={value}"));
            }
        }
        parts.join("  ")
    }

    /// Render a styled line for the modal form widget.
    pub(crate) fn build_line(&self, field: SearchField) -> Line<'static> {
        let value = self.field(field);
        let is_active = self.active == field;

        let placeholder = match field {
            SearchField::Query => "<required>",
            _ => "<optional>",
        };
        let display = if value.is_empty() {
            placeholder.to_string()
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }

    /// Character count of the requested field, for cursor placement.
    pub(crate) fn value_len(&self, field: SearchField) -> usize {
        self.field(field).chars().count()
    }

    fn field(&self, field: SearchField) -> &str {
        match field {
            SearchField::Query => &self.query,
            SearchField::Author => &self.author,
            SearchField::Subject => &self.subject,
            SearchField::Publisher => &self.publisher,
            SearchField::Language => &self.language,
        }
    }

    fn field_mut(&mut self, field: SearchField) -> &mut String {
        match field {
            SearchField::Query => &mut self.query,
            SearchField::Author => &mut self.author,
            SearchField::Subject => &mut self.subject,
            SearchField::Publisher => &mut self.publisher,
            SearchField::Language => &mut self.language,
        }
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// State for confirming removal of a book from the library.
pub(crate) struct ConfirmBookRemove {
    pub(crate) key: String,
    pub(crate) title: String,
}

impl ConfirmBookRemove {
    pub(crate) fn from_book(book: &BookRecord) -> Self {
        Self {
            key: book.key.clone(),
            title: book.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SearchField, SearchForm};

    #[test]
    fn focus_cycles_through_every_field_and_wraps() {
        let mut form = SearchForm::new();
        for expected in SearchField::ALL {
            assert_eq!(form.active, expected);
            form.focus_next();
        }
        assert_eq!(form.active, SearchField::Query);

        form.focus_previous();
        assert_eq!(form.active, SearchField::Language);
    }

    #[test]
    fn characters_land_in_the_focused_field() {
        let mut form = SearchForm::new();
        assert!(form.push_char('d'));
        form.focus_next();
        assert!(form.push_char('h'));
        form.backspace();

        assert_eq!(form.query, "d");
        assert!(form.author.is_empty());
        assert!(!form.push_char('\u{7}'), "control characters are rejected");
    }

    #[test]
    fn blank_query_fails_validation() {
        let mut form = SearchForm::new();
        form.query = "   ".to_string();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn parse_maps_blank_filters_to_none() {
        let mut form = SearchForm::new();
        form.query = " dune ".to_string();
        form.author = "Herbert".to_string();
        form.language.clear();

        let query = form.parse_inputs().expect("form should validate");
        assert_eq!(query.query, "dune");
        assert_eq!(query.author.as_deref(), Some("Herbert"));
        assert_eq!(query.subject, None);
        assert_eq!(query.publisher, None);
        assert_eq!(query.language, None, "cleared language sends no filter");
    }

    #[test]
    fn new_form_preselects_english_but_keeps_it_editable() {
        let mut form = SearchForm::new();
        form.query = "dune".to_string();
        let query = form.parse_inputs().expect("form should validate");
        assert_eq!(query.language.as_deref(), Some("eng"));

        form.language = "ger".to_string();
        let query = form.parse_inputs().expect("form should validate");
        assert_eq!(query.language.as_deref(), Some("ger"));
    }

    #[test]
    fn summary_lists_only_populated_filters() {
        let mut form = SearchForm::new();
        form.query = "dune".to_string();
        form.publisher = "Chilton".to_string();

        assert_eq!(form.summary(), "\"dune\"  publisher=Chilton  language=eng");
    }
}
