//! Scrape orchestration
//!
//! [`Scraper`] validates a request, paces it per origin, walks the source's
//! strategy chain and turns the first usable page into a [`ScrapeResult`].

mod errors;
mod orchestrator;
mod pacing;
mod types;

pub use errors::{AttemptContext, ScrapeError};
pub use orchestrator::{ScrapeState, Scraper, next_state};
pub use pacing::OriginPacer;
pub use types::{ScrapeRequest, ScrapeResult, coerce_page};
