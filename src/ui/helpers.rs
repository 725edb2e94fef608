use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Truncate `text` to at most `width` characters, appending an ellipsis when
/// anything was cut. Counts characters, not bytes, so multi-byte titles do
/// not get sliced mid-codepoint.
pub(crate) fn ellipsize(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(width.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Produce a rectangle centered within `area` that spans the requested
/// percent of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant message from a chained error for the footer.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::ellipsize;

    #[test]
    fn short_text_passes_through_untouched() {
        assert_eq!(ellipsize("Dune", 10), "Dune");
        assert_eq!(ellipsize("Dune", 4), "Dune");
    }

    #[test]
    fn long_text_is_cut_with_an_ellipsis() {
        assert_eq!(ellipsize("Dune Messiah", 8), "Dune Me…");
    }

    #[test]
    fn multibyte_titles_truncate_on_character_boundaries() {
        assert_eq!(ellipsize("図書館戦争", 3), "図書…");
        assert_eq!(ellipsize("anything", 0), "");
    }
}
