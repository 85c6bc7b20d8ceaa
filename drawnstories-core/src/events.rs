use camino::Utf8PathBuf;
use tokio::sync::mpsc;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    /// The listing url passed validation and is about to be fetched
    ListingResolved(Url),
    BookStarted {
        identifier: String,
        pages: usize,
    },
    /// A page has been downloaded and staged, carries the page file name
    PageDownloaded(String),
    BookArchived(Utf8PathBuf),
    Finished,
    Failed(String),
}

pub(crate) fn send(sender: Option<&mpsc::UnboundedSender<Event>>, event: Event) {
    let Some(sender) = sender else {
        return;
    };
    if let Err(err) = sender.send(event) {
        warn!("event channel closed: {err}");
    }
}
