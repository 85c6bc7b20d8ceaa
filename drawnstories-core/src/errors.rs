use reqwest::StatusCode;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("URL to the comic book is required")]
    MissingArgument,

    #[error("invalid URL passed: {0}")]
    InvalidUrl(String),

    #[error("unsupported site: {0}")]
    UnsupportedSite(String),

    #[error("not a comic book page")]
    NotAComicPage,

    #[error("failed to get page {url}: {source}")]
    Fetch {
        url: Url,
        #[source]
        source: FetchError,
    },

    #[error("empty page {0}")]
    EmptyResponse(Url),

    #[error("no books found")]
    NoBooksFound,

    #[error("failed to parse page: {0}")]
    Parse(#[from] tl::ParseError),

    #[error("write error: {0}")]
    Write(#[from] std::io::Error),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::SeError),

    #[error("cbz error: {0}")]
    Cbz(#[from] cbz::Error),

    #[error("join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Status(StatusCode),
}

impl Error {
    pub(crate) fn fetch(url: &Url, source: impl Into<FetchError>) -> Self {
        Self::Fetch {
            url: url.clone(),
            source: source.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
