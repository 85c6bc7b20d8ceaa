use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use tracing::warn;
use url::Url;

/// Books discovered on a listing page, keyed and ordered by identifier.
pub type Books = BTreeMap<String, Book>;

/// A single comic issue and the links to all its pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Book {
    pub identifier: String,
    pub title: String,
    pub issue: u32,
    pub publisher: String,
    pub pages: Vec<Url>,
}

impl Book {
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        publisher: impl Into<String>,
    ) -> Self {
        let identifier = identifier.into();

        Self {
            issue: issue_number(&identifier),
            identifier,
            title: title.into(),
            publisher: publisher.into(),
            pages: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_pages(mut self, pages: impl IntoIterator<Item = Url>) -> Self {
        self.pages.extend(pages);
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Parses the number following the last `-` of a book identifier,
/// `rick-and-morty-007` is issue 7. Identifiers without such suffix are issue 0.
pub fn issue_number(identifier: &str) -> u32 {
    let Some((_, suffix)) = identifier.rsplit_once('-') else {
        return 0;
    };
    let digits = suffix
        .find(|c: char| !c.is_ascii_digit())
        .map_or(suffix, |end| &suffix[..end]);

    match digits.parse() {
        Ok(issue) => issue,
        Err(err) => {
            warn!("failed to parse issue number of {identifier}: {err}");
            0
        }
    }
}

/// The publisher is the path segment following `comics` in a listing url,
/// with hyphens turned into spaces.
pub fn publisher(listing: &Url) -> String {
    listing
        .path_segments()
        .and_then(|mut segments| segments.nth(1))
        .map(|publisher| decode_segment(publisher).replace('-', " "))
        .unwrap_or_default()
}

/// The identifier of a book is the path segment preceding the page file name.
pub fn book_identifier(page: &Url) -> Option<String> {
    let segments = page.path_segments()?.collect::<Vec<_>>();
    let [.., identifier, _filename] = segments.as_slice() else {
        return None;
    };

    (!identifier.is_empty()).then(|| decode_segment(identifier))
}

/// Url path segments are percent-encoded, the site uses cyrillic names
pub(crate) fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_number_is_the_numeric_suffix() {
        assert_eq!(issue_number("rick-and-morty-007"), 7);
        assert_eq!(issue_number("rick-and-morty-12"), 12);
        assert_eq!(issue_number("rick-and-morty-3a"), 3);
    }

    #[test]
    fn issue_number_defaults_to_zero() {
        assert_eq!(issue_number("oneshot"), 0);
        assert_eq!(issue_number("rick-and-morty-special"), 0);
        assert_eq!(issue_number("rick-and-morty-"), 0);
    }

    #[test]
    fn publisher_from_listing_url() {
        let listing = Url::parse("https://drawnstories.ru/comics/Oni-press/rick-and-morty").unwrap();
        assert_eq!(publisher(&listing), "Oni press");

        let listing = Url::parse("https://drawnstories.ru/comics/").unwrap();
        assert_eq!(publisher(&listing), "");
    }

    #[test]
    fn identifier_is_the_parent_segment() {
        let page = Url::parse(
            "https://drawnstories.ru/comics/Oni-press/rick-and-morty/rick-and-morty-001/01.jpg",
        )
        .unwrap();
        assert_eq!(book_identifier(&page).as_deref(), Some("rick-and-morty-001"));

        let page = Url::parse("https://drawnstories.ru/01.jpg").unwrap();
        assert_eq!(book_identifier(&page), None);
    }

    #[test]
    fn cyrillic_segments_are_decoded() {
        let listing = Url::parse("https://drawnstories.ru/comics/Мир-комиксов/рик").unwrap();
        assert_eq!(publisher(&listing), "Мир комиксов");

        let page = listing.join("/comics/Мир-комиксов/рик/рик-002/01.jpg").unwrap();
        let identifier = book_identifier(&page).unwrap();
        assert_eq!(identifier, "рик-002");
        assert_eq!(issue_number(&identifier), 2);
    }

    #[test]
    fn new_book_resolves_issue_once() {
        let book = Book::new("rick-and-morty-003", "Rick and Morty #3", "Oni press");
        assert_eq!(book.issue, 3);
        assert_eq!(book.page_count(), 0);
    }
}
