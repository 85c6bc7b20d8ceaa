use async_trait::async_trait;
use camino::Utf8PathBuf;
use cbz::COUNTER_SIZE;
use futures::{stream, StreamExt, TryStreamExt};
use tempfile::TempDir;
use tokio::{fs, sync::mpsc, task};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    book::decode_segment,
    events::{self, Event},
    metadata::write_metadata,
    Book, Error, Fetch, Request, Result,
};

use super::{get_bytes, DEFAULT_MAX_PARALLEL_DOWNLOAD};

/// Downloads all the pages of a book into a staging directory, describes the book,
/// and packs everything into `<identifier>.cbz`.
///
/// The staging directory is removed whether the archive could be created or not.
#[derive(Debug)]
pub struct ArchiveBook<'a, F: ?Sized> {
    book: &'a Book,
    fetcher: &'a F,
    outdir: Utf8PathBuf,
    staging_dir: Option<Utf8PathBuf>,
    max_parallel_download: usize,
    sender: Option<mpsc::UnboundedSender<Event>>,
}

impl<'a, F> ArchiveBook<'a, F>
where
    F: Fetch + ?Sized,
{
    pub fn new(book: &'a Book, fetcher: &'a F) -> Self {
        Self {
            book,
            fetcher,
            outdir: Utf8PathBuf::from("."),
            staging_dir: None,
            max_parallel_download: DEFAULT_MAX_PARALLEL_DOWNLOAD,
            sender: None,
        }
    }

    #[must_use]
    pub fn set_outdir(mut self, outdir: impl Into<Utf8PathBuf>) -> Self {
        self.outdir = outdir.into();
        self
    }

    /// Directory in which the staging directory is created, the system temp dir if unset
    #[must_use]
    pub fn set_staging_dir(mut self, staging_dir: impl Into<Option<Utf8PathBuf>>) -> Self {
        self.staging_dir = staging_dir.into();
        self
    }

    #[must_use]
    pub fn set_max_parallel_download(mut self, max_parallel_download: usize) -> Self {
        self.max_parallel_download = max_parallel_download.max(1);
        self
    }

    #[must_use]
    pub fn set_sender(mut self, sender: impl Into<Option<mpsc::UnboundedSender<Event>>>) -> Self {
        self.sender = sender.into();
        self
    }

    fn staging(&self) -> Result<TempDir> {
        let prefix = format!("{}-", self.book.identifier);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let staging = match &self.staging_dir {
            Some(staging_dir) => builder.tempdir_in(staging_dir),
            None => builder.tempdir(),
        }
        .map_err(|err| {
            error!("failed to create staging dir for {}: {err}", self.book.identifier);
            err
        })?;

        Ok(staging)
    }
}

#[async_trait]
impl<'a, F> Request for ArchiveBook<'a, F>
where
    F: Fetch + Sync + ?Sized,
{
    type Response = Utf8PathBuf;

    async fn request(self) -> Result<Self::Response> {
        let book = self.book;
        let sender = self.sender.as_ref();

        events::send(
            sender,
            Event::BookStarted {
                identifier: book.identifier.clone(),
                pages: book.page_count(),
            },
        );

        let staging = self.staging()?;
        let staging_path = staging.path();
        debug!("staging {} in {}", book.identifier, staging_path.display());

        let fetcher = self.fetcher;
        stream::iter(book.pages.clone().into_iter().enumerate())
            .map(move |(index, page)| async move {
                let bytes = get_bytes(fetcher, &page).await?;

                Ok::<_, Error>((page_filename(index, &page), bytes))
            })
            .buffered(self.max_parallel_download)
            .try_for_each(|(filename, bytes)| async move {
                fs::write(staging_path.join(&filename), &bytes)
                    .await
                    .map_err(|err| {
                        error!("failed to stage page {filename}: {err}");
                        err
                    })?;
                debug!("staged page {filename}");
                events::send(sender, Event::PageDownloaded(filename));

                Ok::<_, Error>(())
            })
            .await?;

        write_metadata(staging.path(), book).await?;

        let archive_path = self
            .outdir
            .join(sanitize_filename::sanitize(format!("{}.cbz", book.identifier)));
        let dest = archive_path.clone();
        let len = task::spawn_blocking(move || {
            let res = cbz::pack_dir(staging.path(), &dest);
            if let Err(err) = staging.close() {
                warn!("failed to remove staging dir: {err}");
            }
            res
        })
        .await??;

        info!("{len} files archived into {archive_path}");
        events::send(sender, Event::BookArchived(archive_path.clone()));

        Ok(archive_path)
    }
}

/// Pages are named after the last segment of their url,
/// falling back on their padded position in the book
fn page_filename(index: usize, page: &Url) -> String {
    let filename = page
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| sanitize_filename::sanitize(decode_segment(segment)))
        .unwrap_or_default();

    if filename.is_empty() {
        format!("{:0>COUNTER_SIZE$}", index + 1)
    } else {
        filename
    }
}
