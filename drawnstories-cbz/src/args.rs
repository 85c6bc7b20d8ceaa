use camino::Utf8PathBuf;
use clap::Parser;
use drawnstories_core::DEFAULT_MAX_PARALLEL_DOWNLOAD;

#[derive(Parser, Debug)]
#[clap(about, author, version)]
pub struct Args {
    /// Comic book page to download, e.g. https://drawnstories.ru/comics/Oni-press/rick-and-morty
    pub url: Option<String>,
    /// Only download the books with these numbers (e.g. 001 003), all the books otherwise
    pub issues: Vec<String>,
    /// Destination directory, defaults to the current directory
    #[clap(long, default_value = ".")]
    pub outdir: Utf8PathBuf,
    /// Directory in which the pages are staged before packing, defaults to the system temp dir
    #[clap(long)]
    pub tmpdir: Option<Utf8PathBuf>,
    /// How many pages of a book are downloaded at the same time
    #[clap(long, default_value_t = DEFAULT_MAX_PARALLEL_DOWNLOAD)]
    pub max_parallel_download: usize,
}
