use url::Url;

use crate::{Error, Result};

/// The only supported host
pub static SITE_HOST: &str = "drawnstories.ru";

/// All listing pages live under this path
pub static LISTING_PREFIX: &str = "/comics/";

/// Anchors linking to the page images of a book
pub static PAGE_LINK_SELECTOR: &str = "a.fancybox";

/// Validates that `arg` points to a comic listing page of the supported site.
///
/// ## Errors
///
/// `MissingArgument` when no url is given, `InvalidUrl` when it can't be parsed or has no host,
/// `UnsupportedSite` for any other host and `NotAComicPage` when the path isn't a listing
pub fn comics_page(arg: Option<&str>) -> Result<Url> {
    let Some(arg) = arg else {
        return Err(Error::MissingArgument);
    };

    let url = Url::parse(arg).map_err(|err| Error::InvalidUrl(format!("{arg} ({err})")))?;

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host,
        _ => return Err(Error::InvalidUrl(arg.to_string())),
    };

    if host != SITE_HOST {
        return Err(Error::UnsupportedSite(host.to_string()));
    }

    if !url.path().starts_with(LISTING_PREFIX) {
        return Err(Error::NotAComicPage);
    }

    Ok(url)
}
