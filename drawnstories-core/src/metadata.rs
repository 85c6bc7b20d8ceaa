use std::path::Path;

use quick_xml::se::Serializer;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, error};

use crate::{Book, Result};

pub static COMET_FILENAME: &str = "CoMet.xml";
pub static COMIC_INFO_FILENAME: &str = "ComicInfo.xml";

static XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

// https://www.denvog.com/comet/comet-specification/
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "comet")]
pub struct Comet<'a> {
    #[serde(rename = "@xmlns:comet")]
    xmlns: &'static str,
    #[serde(rename = "@xmlns:xsi")]
    xsi: &'static str,
    #[serde(rename = "@xsi:schemaLocation")]
    schema_location: &'static str,
    title: &'a str,
    issue: u32,
    publisher: &'a str,
    pages: usize,
    format: &'static str,
}

impl<'a> From<&'a Book> for Comet<'a> {
    fn from(book: &'a Book) -> Self {
        Self {
            xmlns: "http://www.denvog.com/comet/",
            xsi: "http://www.w3.org/2001/XMLSchema-instance",
            schema_location: "http://www.denvog.com http://www.denvog.com/comet/comet.xsd",
            title: &book.title,
            issue: book.issue,
            publisher: &book.publisher,
            pages: book.page_count(),
            format: "Comic",
        }
    }
}

// https://wiki.mobileread.com/wiki/ComicRack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "ComicInfo")]
pub struct ComicInfo<'a> {
    #[serde(rename = "@xmlns:xsi")]
    xsi: &'static str,
    #[serde(rename = "@xmlns:xsd")]
    xsd: &'static str,
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Publisher")]
    publisher: &'a str,
    #[serde(rename = "Number")]
    number: u32,
    #[serde(rename = "PageCount")]
    page_count: usize,
}

impl<'a> From<&'a Book> for ComicInfo<'a> {
    fn from(book: &'a Book) -> Self {
        Self {
            xsi: "http://www.w3.org/2001/XMLSchema-instance",
            xsd: "http://www.w3.org/2001/XMLSchema",
            title: &book.title,
            publisher: &book.publisher,
            number: book.issue,
            page_count: book.page_count(),
        }
    }
}

/// Serializes `document` as an indented xml document, declaration included
///
/// ## Errors
///
/// Fails if `document` can't be represented as xml
pub fn to_xml(document: &impl Serialize) -> Result<String> {
    let mut xml = String::from(XML_DECLARATION);
    let mut serializer = Serializer::new(&mut xml);
    serializer.indent(' ', 2);
    document.serialize(serializer)?;
    xml.push('\n');

    Ok(xml)
}

/// Writes both the `CoMet.xml` and `ComicInfo.xml` descriptions of `book` into `dir`
///
/// ## Errors
///
/// Fails on serialization error or if the files can't be written
pub async fn write_metadata(dir: impl AsRef<Path>, book: &Book) -> Result<()> {
    let dir = dir.as_ref();

    for (filename, xml) in [
        (COMET_FILENAME, to_xml(&Comet::from(book))?),
        (COMIC_INFO_FILENAME, to_xml(&ComicInfo::from(book))?),
    ] {
        fs::write(dir.join(filename), xml).await.map_err(|err| {
            error!("failed to write {filename} for {}: {err}", book.identifier);
            err
        })?;
        debug!("{filename} written for {}", book.identifier);
    }

    Ok(())
}
