use async_trait::async_trait;
use camino::Utf8PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{
    events::{self, Event},
    select_books,
    site::comics_page,
    ArchiveBook, Fetch, GetBooks, Request, Result,
};

use super::DEFAULT_MAX_PARALLEL_DOWNLOAD;

/// Resolves a listing url, discovers its books, keeps the requested issues
/// and archives every selected book, one after another in identifier order.
///
/// The first error aborts the whole run, archives already written are kept.
#[derive(Debug)]
pub struct Download<F> {
    fetcher: F,
    url: Option<String>,
    issues: Vec<String>,
    outdir: Utf8PathBuf,
    staging_dir: Option<Utf8PathBuf>,
    max_parallel_download: usize,
    sender: Option<mpsc::UnboundedSender<Event>>,
}

impl<F> Download<F>
where
    F: Fetch,
{
    pub fn new(fetcher: F, url: Option<String>) -> Self {
        Self {
            fetcher,
            url,
            issues: Vec::new(),
            outdir: Utf8PathBuf::from("."),
            staging_dir: None,
            max_parallel_download: DEFAULT_MAX_PARALLEL_DOWNLOAD,
            sender: None,
        }
    }

    /// Only the books whose identifier ends with `-<issue>` will be archived
    #[must_use]
    pub fn set_issues(mut self, issues: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.issues = issues.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn set_outdir(mut self, outdir: impl Into<Utf8PathBuf>) -> Self {
        self.outdir = outdir.into();
        self
    }

    #[must_use]
    pub fn set_staging_dir(mut self, staging_dir: impl Into<Option<Utf8PathBuf>>) -> Self {
        self.staging_dir = staging_dir.into();
        self
    }

    #[must_use]
    pub fn set_max_parallel_download(mut self, max_parallel_download: usize) -> Self {
        self.max_parallel_download = max_parallel_download;
        self
    }

    #[must_use]
    pub fn set_sender(mut self, sender: mpsc::UnboundedSender<Event>) -> Self {
        self.sender = Some(sender);
        self
    }
}

impl<F> Download<F>
where
    F: Fetch + Sync,
{
    async fn archive_all(&self) -> Result<Vec<Utf8PathBuf>> {
        let listing = comics_page(self.url.as_deref())?;
        events::send(self.sender.as_ref(), Event::ListingResolved(listing.clone()));

        let books = GetBooks::new(listing, &self.fetcher).request().await?;
        let books = select_books(books, self.issues.as_slice());

        let mut archives = Vec::with_capacity(books.len());
        for book in books.values() {
            if book.pages.is_empty() {
                debug!("skipping {}, it has no pages", book.identifier);
                continue;
            }

            let archive = ArchiveBook::new(book, &self.fetcher)
                .set_outdir(self.outdir.clone())
                .set_staging_dir(self.staging_dir.clone())
                .set_max_parallel_download(self.max_parallel_download)
                .set_sender(self.sender.clone())
                .request()
                .await?;
            archives.push(archive);
        }

        Ok(archives)
    }
}

#[async_trait]
impl<F> Request for Download<F>
where
    F: Fetch + Send + Sync,
{
    type Response = Vec<Utf8PathBuf>;

    async fn request(self) -> Result<Self::Response> {
        let res = self.archive_all().await;

        match &res {
            Ok(archives) => {
                info!("{} books archived", archives.len());
                events::send(self.sender.as_ref(), Event::Finished);
            }
            Err(err) => {
                error!("download failed: {err}");
                events::send(self.sender.as_ref(), Event::Failed(err.to_string()));
            }
        }

        res
    }
}
