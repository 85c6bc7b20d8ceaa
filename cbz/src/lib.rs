#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::{
    fs::{self, File, Metadata},
    io::{self, Read, Seek, Write},
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
    result,
};

use bytes::Bytes;
use camino::Utf8Path;
use tempfile::NamedTempFile;
use time::OffsetDateTime;
use tracing::{debug, error};
use zip::{read::ZipFile, write::FileOptions, CompressionMethod, DateTime, ZipArchive, ZipWriter};

pub use crate::errors::{Error, Result};

pub mod errors;

/// We artificially limit the amount of accepted files to 65535 files per Cbz
/// First as it'd be rather impractical for the user to read such enormous Cbz
/// Also, this size has been chosen as it was the limit of the very first zip spec
pub static MAX_FILE_NUMBER: usize = u16::MAX as usize;

/// The length of 65535 used to name an inserted file with a proper padding
pub static COUNTER_SIZE: usize = 5;

pub trait Cbz {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait CbzRead: Cbz {
    fn file_names(&self) -> Vec<&str>;

    /// Lookup the file by `name` in Cbz and returns a `CbzFile`
    ///
    /// ## Errors
    ///
    /// Fails if the file doesn't exist or can't be read
    fn read_by_name(&mut self, name: &str) -> Result<CbzFile<'_>>;

    /// Iterate over files present in the Cbz, sorted by name.
    /// If the closure returns an error, this error is returned immediately.
    ///
    /// ## Errors
    ///
    /// Returns an error immediately if the provided closure returns an error
    fn try_for_each<F, E>(&mut self, mut f: F) -> result::Result<(), E>
    where
        F: FnMut(Result<CbzFile<'_>>) -> result::Result<(), E>,
    {
        let mut file_names = self
            .file_names()
            .into_iter()
            .map(Into::into)
            .collect::<Vec<String>>();
        file_names.sort();

        for file_name in file_names {
            f(self.read_by_name(&file_name))?;
        }

        Ok(())
    }
}

pub trait CbzWrite {
    /// Inserts the file located at `path` under its bare file name,
    /// using the options derived from its filesystem metadata
    ///
    /// ## Errors
    ///
    /// Fails if the file can't be read, if its name isn't valid utf-8,
    /// or with the same errors as `insert_from_reader_with_options`
    fn insert_from_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
            return Err(Error::CbzFileNameEmpty);
        };
        let metadata = fs::metadata(path)?;
        let file = File::open(path)?;

        self.insert_from_reader_with_options(filename, file, file_options(&metadata))
    }

    /// This is the method ultimately called to insert content into the Cbz
    ///
    /// ## Errors
    ///
    /// This fails if the Cbz writer can't be written or if it's full (i.e. its size equals `MAX_FILE_NUMBER`)
    fn insert_from_reader_with_options(
        &mut self,
        filename: impl Into<String>,
        reader: impl Read,
        file_options: FileOptions,
    ) -> Result<()>;
}

/// Deflate compressed entry options, carrying the modification time and
/// permissions of the source file when they can be represented in a zip header
#[must_use]
pub fn file_options(metadata: &Metadata) -> FileOptions {
    let mut options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    if let Some(modified) = metadata.modified().ok().and_then(zip_date_time) {
        options = options.last_modified_time(modified);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        options = options.unix_permissions(metadata.permissions().mode() & 0o777);
    }

    options
}

fn zip_date_time(time: std::time::SystemTime) -> Option<DateTime> {
    let time = OffsetDateTime::from(time);

    DateTime::from_date_and_time(
        u16::try_from(time.year()).ok()?,
        u8::from(time.month()),
        time.day(),
        time.hour(),
        time.minute(),
        time.second(),
    )
    .ok()
}

pub struct CbzFile<'a>(ZipFile<'a>);

impl<'a> CbzFile<'a> {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn size(&self) -> u64 {
        self.0.size()
    }

    pub fn compression(&self) -> CompressionMethod {
        self.0.compression()
    }

    /// Convert the file content to `Bytes`
    ///
    /// ## Errors
    ///
    /// Fails if file size is too large to fit a `usize` on host machine
    /// or if the content can't be read
    pub fn to_bytes(&mut self) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(
            self.size()
                .try_into()
                .map_err(|_| Error::CbzFileSizeConversion)?,
        );

        self.0.read_to_end(&mut buf)?;

        Ok(buf.into())
    }
}

impl<'a> Read for CbzFile<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<'a> From<ZipFile<'a>> for CbzFile<'a> {
    fn from(zip_file: ZipFile<'a>) -> Self {
        Self(zip_file)
    }
}

#[derive(Debug)]
pub struct CbzReader<R> {
    archive: ZipArchive<R>,
}

impl<R> CbzReader<R> {
    pub fn new(archive: ZipArchive<R>) -> Self {
        Self { archive }
    }
}

impl<R> CbzReader<R>
where
    R: Read + Seek,
{
    /// Creates `CbzReader` from a `Read`
    ///
    /// ## Errors
    ///
    /// Fails if the underlying `ZipArchive` can't be created
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;

        Ok(Self::new(archive))
    }
}

impl CbzReader<File> {
    /// Creates `CbzReader` from a path
    ///
    /// ## Errors
    ///
    /// Fails if the underlying `ZipArchive` can't be created
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;

        Self::from_reader(file)
    }
}

impl<R> Cbz for CbzReader<R>
where
    R: Read + Seek,
{
    fn len(&self) -> usize {
        self.archive.len()
    }
}

impl<R> CbzRead for CbzReader<R>
where
    R: Read + Seek,
{
    fn file_names(&self) -> Vec<&str> {
        self.archive.file_names().collect()
    }

    fn read_by_name(&mut self, name: &str) -> Result<CbzFile<'_>> {
        let archive_file = self.archive.by_name(name)?;

        Ok(archive_file.into())
    }
}

impl<R> Deref for CbzReader<R> {
    type Target = ZipArchive<R>;

    fn deref(&self) -> &Self::Target {
        &self.archive
    }
}

impl<R> DerefMut for CbzReader<R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.archive
    }
}

pub struct CbzWriter<W: Write + Seek> {
    archive: ZipWriter<W>,
    size: usize,
}

impl<W> CbzWriter<W>
where
    W: Write + Seek,
{
    pub fn new(archive: ZipWriter<W>) -> Self {
        Self { archive, size: 0 }
    }

    /// Creates a `CbzWriter` from a `Write`
    pub fn from_writer(writer: W) -> Self {
        Self::new(ZipWriter::new(writer))
    }

    /// Terminates the Cbz archiving, called on drop anyway but error can't be handled
    ///
    /// ## Errors
    ///
    /// Same errors as the underlying `ZipWriter::finish` method
    pub fn finish(mut self) -> Result<CbzWriterFinished<W>> {
        let writer = self.archive.finish()?;

        Ok(CbzWriterFinished::new(writer))
    }
}

impl<W> Cbz for CbzWriter<W>
where
    W: Write + Seek,
{
    fn len(&self) -> usize {
        self.size
    }
}

impl<W> CbzWrite for CbzWriter<W>
where
    W: Write + Seek,
{
    fn insert_from_reader_with_options(
        &mut self,
        filename: impl Into<String>,
        mut reader: impl Read,
        file_options: FileOptions,
    ) -> Result<()> {
        if self.size >= MAX_FILE_NUMBER {
            return Err(Error::CbzTooLarge(MAX_FILE_NUMBER));
        }

        self.archive.start_file(filename, file_options)?;

        io::copy(&mut reader, &mut self.archive)?;

        self.size += 1;

        Ok(())
    }
}

pub struct CbzWriterFinished<W> {
    writer: W,
}

impl<W> CbzWriterFinished<W> {
    fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl CbzWriterFinished<NamedTempFile> {
    /// Moves the finished archive to `path`, replacing any existing file
    ///
    /// ## Errors
    ///
    /// Fails if the rename fails
    pub fn persist(self, path: impl AsRef<Utf8Path>) -> Result<File> {
        Ok(self.writer.persist(path.as_ref())?)
    }
}

/// Packs every regular file of `dir` into a new Cbz located at `dest`.
///
/// Entries are inserted sorted by file name. The archive is written to a
/// temporary file next to `dest` and only renamed once complete, so `dest`
/// never holds a partial archive.
///
/// ## Errors
///
/// Fails if the directory can't be listed, a file can't be read,
/// or the archive can't be written or moved to `dest`
pub fn pack_dir(dir: impl AsRef<Path>, dest: impl AsRef<Utf8Path>) -> Result<usize> {
    let dest = dest.as_ref();
    let outdir = match dest.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    let mut paths = fs::read_dir(dir.as_ref())?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<Vec<PathBuf>>>()?;
    paths.sort();

    let mut cbz_writer = CbzWriter::from_writer(archive_file(outdir)?);
    for path in paths {
        if !path.is_file() {
            debug!("skipping {path:?}, not a regular file");
            continue;
        }
        cbz_writer.insert_from_path(&path).map_err(|err| {
            error!("failed to write {path:?} to archive {dest}");
            err
        })?;
    }

    let len = cbz_writer.len();
    cbz_writer.finish()?.persist(dest)?;
    debug!("packed {len} files into {dest}");

    Ok(len)
}

/// Temporary files are private to their owner, the archive gets the
/// default mode of a new file instead, the umask applies
fn archive_file(outdir: &Utf8Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    builder.tempfile_in(outdir)
}
