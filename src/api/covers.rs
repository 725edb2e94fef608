/// Base URL of the catalog's cover image service.
const COVERS_API: &str = "https://covers.openlibrary.org/b";

/// Cover image variants offered by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverSize {
    Small,
    Medium,
    Large,
}

impl CoverSize {
    fn code(self) -> char {
        match self {
            CoverSize::Small => 'S',
            CoverSize::Medium => 'M',
            CoverSize::Large => 'L',
        }
    }
}

/// Build the image URL for a cover reference. Covers are fetched lazily: the
/// UI hands this URL to the platform browser on explicit user request, and
/// the image download itself happens there.
pub fn cover_url(cover_id: i64, size: CoverSize) -> String {
    format!("{COVERS_API}/id/{cover_id}-{}.jpg", size.code())
}

#[cfg(test)]
mod tests {
    use super::{cover_url, CoverSize};

    #[test]
    fn builds_the_catalog_cover_url_for_each_size() {
        assert_eq!(
            cover_url(11481354, CoverSize::Small),
            "https://covers.openlibrary.org/b/id/11481354-S.jpg"
        );
        assert_eq!(
            cover_url(11481354, CoverSize::Medium),
            "https://covers.openlibrary.org/b/id/11481354-M.jpg"
        );
        assert_eq!(
            cover_url(11481354, CoverSize::Large),
            "https://covers.openlibrary.org/b/id/11481354-L.jpg"
        );
    }
}
