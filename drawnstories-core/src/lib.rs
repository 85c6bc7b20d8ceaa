#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub use crate::api::*;
pub use crate::book::{Book, Books};
pub use crate::errors::{Error, FetchError, Result};
pub use crate::events::Event;
pub use crate::select::select_books;
pub use crate::site::comics_page;

pub mod api;
pub mod book;
mod errors;
mod events;
pub mod metadata;
mod select;
pub mod site;
