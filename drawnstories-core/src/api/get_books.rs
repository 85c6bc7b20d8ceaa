use async_trait::async_trait;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use tl::{HTMLTag, ParserOptions, VDom};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    book::{book_identifier, publisher},
    site::PAGE_LINK_SELECTOR,
    Book, Books, Error, Fetch, Request, Result,
};

use super::get_bytes;

/// Get all the books, and the links to their pages, listed on a comics page.
#[derive(Debug)]
pub struct GetBooks<'a, F: ?Sized> {
    listing: Url,
    fetcher: &'a F,
}

impl<'a, F> GetBooks<'a, F>
where
    F: Fetch + ?Sized,
{
    pub fn new(listing: Url, fetcher: &'a F) -> Self {
        Self { listing, fetcher }
    }
}

#[async_trait]
impl<'a, F> Request for GetBooks<'a, F>
where
    F: Fetch + Sync + ?Sized,
{
    type Response = Books;

    async fn request(self) -> Result<Books> {
        let body = get_bytes(self.fetcher, &self.listing).await?;
        let html = String::from_utf8_lossy(&body);

        parse_listing(&self.listing, &html)
    }
}

/// Groups the page links of the listing by book, in document order.
///
/// ## Errors
///
/// Fails if the document can't be parsed or if it doesn't link to any page
pub fn parse_listing(listing: &Url, html: &str) -> Result<Books> {
    let dom = tl::parse(html, ParserOptions::default())?;
    let publisher = publisher(listing);
    let mut books = Books::new();

    for_each_tag(&dom, PAGE_LINK_SELECTOR, |tag| {
        let Some(href) = attribute(tag, "href") else {
            return;
        };
        if href.is_empty() {
            return;
        }
        let page = match listing.join(&href) {
            Ok(page) => page,
            Err(err) => {
                warn!("skipping invalid page link {href}: {err}");
                return;
            }
        };
        let Some(identifier) = book_identifier(&page) else {
            warn!("skipping page link {page}, no book found in its path");
            return;
        };

        books
            .entry(identifier)
            .or_insert_with_key(|identifier| {
                let title = attribute(tag, "title").unwrap_or_default();
                debug!("found book {identifier} {title:?}");

                Book::new(identifier.clone(), title, publisher.clone())
            })
            .pages
            .push(page);
    });

    if books.is_empty() {
        return Err(Error::NoBooksFound);
    }
    info!("found {} books on {listing}", books.len());

    Ok(books)
}

/// Attribute values are kept as written by `tl`, character references included
fn attribute(tag: &HTMLTag<'_>, name: &str) -> Option<String> {
    let raw = tag.attributes().get(name).flatten()?.as_utf8_str();

    match unescape_with(&raw, resolve_html5_entity) {
        Ok(value) => Some(value.into_owned()),
        Err(err) => {
            warn!("keeping {name} {raw:?} undecoded: {err}");
            Some(raw.into_owned())
        }
    }
}

fn for_each_tag<F>(dom: &VDom, selector: &str, mut f: F)
where
    F: FnMut(&HTMLTag<'_>),
{
    let Some(node_handles) = dom.query_selector(selector) else {
        debug!("invalid selector {selector}");
        return;
    };
    for node_handle in node_handles {
        let Some(node) = node_handle.get(dom.parser()) else {
            debug!("node not found {}", node_handle.get_inner());
            continue;
        };
        let Some(tag) = node.as_tag() else {
            debug!("node is not a tag {node:#?}");
            continue;
        };
        f(tag);
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;
    use crate::api::tests::MemorySite;

    static LISTING: &str = "https://drawnstories.ru/comics/Oni-press/rick-and-morty";

    static FIXTURE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <a class="logo" href="https://drawnstories.ru/">Drawn stories</a>
    <div class="gallery">
      <a class="fancybox" title="Rick and Morty #1" href="https://drawnstories.ru/comics/Oni-press/rick-and-morty/rick-and-morty-001/01.jpg"><img src="t1.jpg"></a>
      <a class="fancybox" title="Rick and Morty #1" href="https://drawnstories.ru/comics/Oni-press/rick-and-morty/rick-and-morty-001/02.jpg"><img src="t2.jpg"></a>
      <a class="fancybox" title="Rick and Morty #7" href="https://drawnstories.ru/comics/Oni-press/rick-and-morty/rick-and-morty-007/01.jpg"><img src="t3.jpg"></a>
      <a class="fancybox" href="https://drawnstories.ru/comics/Oni-press/rick-and-morty/rick-and-morty-001/03.jpg"><img src="t4.jpg"></a>
      <a class="fancybox gallery-item" href="/comics/Oni-press/rick-and-morty/rick-and-morty-special/01.jpg"><img src="t5.jpg"></a>
      <a class="fancybox" href=""><img src="t6.jpg"></a>
      <a class="fancybox"><img src="t7.jpg"></a>
    </div>
  </body>
</html>"#;

    fn listing() -> Url {
        Url::parse(LISTING).unwrap()
    }

    #[test]
    fn groups_pages_by_book_in_document_order() {
        let books = parse_listing(&listing(), FIXTURE).unwrap();

        assert_eq!(
            books.keys().collect::<Vec<_>>(),
            vec![
                "rick-and-morty-001",
                "rick-and-morty-007",
                "rick-and-morty-special"
            ]
        );

        let first = &books["rick-and-morty-001"];
        assert_eq!(first.title, "Rick and Morty #1");
        assert_eq!(first.issue, 1);
        assert_eq!(first.publisher, "Oni press");
        assert_eq!(
            first
                .pages
                .iter()
                .map(|page| page.path_segments().unwrap().last().unwrap())
                .collect::<Vec<_>>(),
            vec!["01.jpg", "02.jpg", "03.jpg"]
        );

        assert_eq!(books["rick-and-morty-007"].issue, 7);
        assert_eq!(books["rick-and-morty-007"].page_count(), 1);
    }

    #[test]
    fn relative_links_and_missing_issue() {
        let books = parse_listing(&listing(), FIXTURE).unwrap();

        let special = &books["rick-and-morty-special"];
        assert_eq!(special.issue, 0);
        assert_eq!(special.title, "");
        assert_eq!(
            special.pages[0].as_str(),
            "https://drawnstories.ru/comics/Oni-press/rick-and-morty/rick-and-morty-special/01.jpg"
        );
    }

    #[test]
    fn character_references_are_decoded() {
        let html = r#"<div>
          <a class="fancybox" title="Rick &amp; Morty &quot;1&quot; &ndash; &#x41;" href="/comics/Oni-press/rick-and-morty/rick-and-morty-001/01.jpg?w=1&amp;h=2"></a>
          <a class="fancybox" title="Rick &bogus; Morty" href="/comics/Oni-press/rick-and-morty/rick-and-morty-002/01.jpg"></a>
        </div>"#;

        let books = parse_listing(&listing(), html).unwrap();

        let first = &books["rick-and-morty-001"];
        assert_eq!(first.title, "Rick & Morty \"1\" \u{2013} A");
        assert_eq!(first.pages[0].query(), Some("w=1&h=2"));
        assert_eq!(books["rick-and-morty-002"].title, "Rick &bogus; Morty");
    }

    #[test]
    fn cyrillic_book_links() {
        let html = r#"<a class="fancybox" title="Рик и Морти" href="/comics/Oni-press/rick-and-morty/рик-002/01.jpg"></a>"#;

        let books = parse_listing(&listing(), html).unwrap();

        assert_eq!(books.keys().collect::<Vec<_>>(), vec!["рик-002"]);
        assert_eq!(books["рик-002"].issue, 2);
        assert_eq!(books["рик-002"].title, "Рик и Морти");
    }

    #[test]
    fn no_page_link_is_no_books_found() {
        let res = parse_listing(&listing(), r#"<html><body><a href="/comics/">comics</a></body></html>"#);

        assert!(matches!(res, Err(Error::NoBooksFound)));
    }

    #[tokio::test]
    async fn request_fetches_the_listing() {
        let site = MemorySite::default().with(LISTING, StatusCode::OK, FIXTURE);

        let books = GetBooks::new(listing(), &site).request().await.unwrap();

        assert_eq!(books.len(), 3);
    }

    #[tokio::test]
    async fn request_fails_on_error_status() {
        let site = MemorySite::default().with(LISTING, StatusCode::INTERNAL_SERVER_ERROR, "oops");

        let res = GetBooks::new(listing(), &site).request().await;

        assert!(matches!(res, Err(Error::Fetch { .. })));
    }

    #[tokio::test]
    async fn request_fails_on_empty_page() {
        let site = MemorySite::default().with(LISTING, StatusCode::OK, "");

        let res = GetBooks::new(listing(), &site).request().await;

        assert!(matches!(res, Err(Error::EmptyResponse(_))));
    }
}
