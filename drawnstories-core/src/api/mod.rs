pub use archive_book::ArchiveBook;
use async_trait::async_trait;
use bytes::Bytes;
pub use download::Download;
pub use get_books::GetBooks;
use reqwest::StatusCode;
use tracing::{debug, error};
use url::Url;

use crate::{Error, FetchError, Result};

pub mod archive_book;
pub mod download;
pub mod get_books;

/// Number of pages downloaded concurrently for a single book
pub static DEFAULT_MAX_PARALLEL_DOWNLOAD: usize = 5;

#[async_trait]
pub trait Request {
    type Response;

    async fn request(self) -> Result<Self::Response>;
}

/// Raw outcome of a get request, the status hasn't been checked yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Transport used to get the listing and the page images.
#[async_trait]
pub trait Fetch {
    /// ## Errors
    ///
    /// Fails only when the request itself couldn't be completed
    async fn fetch(&self, url: &Url) -> Result<Fetched>;
}

#[async_trait]
impl Fetch for reqwest::Client {
    async fn fetch(&self, url: &Url) -> Result<Fetched> {
        let response = self
            .get(url.clone())
            .send()
            .await
            .map_err(|err| Error::fetch(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(Fetched {
                status,
                body: Bytes::new(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| Error::fetch(url, err))?;

        Ok(Fetched { status, body })
    }
}

/// Send a get request to `url` and return the body of a successful, non empty response
pub(crate) async fn get_bytes<F>(fetcher: &F, url: &Url) -> Result<Bytes>
where
    F: Fetch + ?Sized,
{
    debug!("fetching {url}");

    let Fetched { status, body } = fetcher.fetch(url).await.map_err(|err| {
        error!("request to {url} failed: {err}");
        err
    })?;

    if !status.is_success() {
        error!("request to {url} failed with status {status}");
        return Err(Error::fetch(url, FetchError::Status(status)));
    }

    if body.is_empty() {
        return Err(Error::EmptyResponse(url.clone()));
    }

    Ok(body)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;

    /// In memory site, urls not registered answer with a 404
    #[derive(Debug, Default)]
    pub(crate) struct MemorySite(HashMap<Url, Fetched>);

    impl MemorySite {
        pub(crate) fn with(mut self, url: &str, status: StatusCode, body: impl Into<Bytes>) -> Self {
            self.0.insert(
                Url::parse(url).unwrap(),
                Fetched {
                    status,
                    body: body.into(),
                },
            );
            self
        }
    }

    #[async_trait]
    impl Fetch for MemorySite {
        async fn fetch(&self, url: &Url) -> Result<Fetched> {
            Ok(self.0.get(url).cloned().unwrap_or(Fetched {
                status: StatusCode::NOT_FOUND,
                body: Bytes::new(),
            }))
        }
    }

    #[tokio::test]
    async fn successful_response() {
        let site = MemorySite::default().with("https://drawnstories.ru/a.jpg", StatusCode::OK, "image");

        let body = get_bytes(&site, &Url::parse("https://drawnstories.ru/a.jpg").unwrap())
            .await
            .unwrap();

        assert_eq!(body.as_ref(), b"image");
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_error() {
        let site = MemorySite::default();

        let res = get_bytes(&site, &Url::parse("https://drawnstories.ru/a.jpg").unwrap()).await;

        assert!(matches!(
            res,
            Err(Error::Fetch {
                source: FetchError::Status(status),
                ..
            }) if status == StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn empty_body_is_an_empty_response() {
        let site = MemorySite::default().with("https://drawnstories.ru/a.jpg", StatusCode::OK, "");

        let res = get_bytes(&site, &Url::parse("https://drawnstories.ru/a.jpg").unwrap()).await;

        assert!(matches!(res, Err(Error::EmptyResponse(_))));
    }
}
