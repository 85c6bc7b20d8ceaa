use std::{io, result};

use zip::result::ZipError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error {0}")]
    IO(#[from] io::Error),

    #[error("Zip error {0}")]
    Zip(#[from] ZipError),

    #[error("Cbz file size couldn't be converted")]
    CbzFileSizeConversion,

    #[error("Cbz file name is empty or not valid utf-8")]
    CbzFileNameEmpty,

    #[error("Cbz is too large, it can contain a maximum of {0} files")]
    CbzTooLarge(usize),

    #[error("Cbz couldn't be moved to its destination: {0}")]
    CbzPersist(#[from] tempfile::PersistError),
}

pub type Result<T, E = Error> = result::Result<T, E>;
