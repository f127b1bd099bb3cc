pub mod browser_session;
pub mod browser_setup;
pub mod config;
pub mod extraction;
pub mod fetch;
pub mod media_url;
pub mod scrape_engine;
pub mod sources;
pub mod stealth;
pub mod utils;

pub use browser_session::{BrowserSessionManager, PageLease, PageSlots};
pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use config::{ScrapeConfig, ScrapeConfigBuilder};
pub use extraction::{Dimensions, ExtractionSchema, Field, FieldSpec, Record, SourceMeta, extract};
pub use fetch::{
    BlockSignal, BrowserChallengeSolver, ChallengeBypass, ChallengeSolver, Clearance, DirectHttp,
    FetchError, FetchOutcome, FetchRequest, FetchStrategy, HeadlessBrowser, RawPage, Solved,
    StrategyKind,
};
pub use media_url::normalize as normalize_media_url;
pub use scrape_engine::{
    AttemptContext, OriginPacer, ScrapeError, ScrapeRequest, ScrapeResult, ScrapeState, Scraper,
    coerce_page,
};
pub use sources::{SourceProfile, SourceRegistry};
