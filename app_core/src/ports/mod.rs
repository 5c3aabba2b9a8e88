// trait definitions for ports

mod database;
mod scraper;

pub use database::*;
pub use scraper::*;
