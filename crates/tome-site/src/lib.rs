//! Static site builder for Tome.
//!
//! Turns a [`SiteConfig`](tome_config::SiteConfig) and a content directory
//! into a static site:
//!
//! 1. [`resolve`] maps every navigation leaf to a file, failing with all
//!    missing paths at once.
//! 2. Each page is loaded, its front-matter parsed and its body rendered, in
//!    parallel ([`ContentPage`]).
//! 3. Pages are wrapped in the theme template and written in navigation
//!    order, followed by the search index and theme assets.
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use tome_config::SiteConfig;
//! use tome_site::SiteBuilder;
//!
//! let config = SiteConfig::load(None, None)?;
//! let report = SiteBuilder::new(config)?.build(false)?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod assets;
mod builder;
mod debouncer;
mod error;
mod front_matter;
mod markdown;
mod nav;
mod page;
mod plugins;
mod resolver;
mod search;
mod tags;
mod template;
mod watch;

pub use builder::{BuildReport, SiteBuilder};
pub use debouncer::{ChangeKind, FileChange};
pub use error::{BuildError, WriteError};
pub use front_matter::{Document, FrontMatter, FrontMatterError, parse_document};
pub use markdown::markdown_options;
pub use nav::{NavItem, Navigation, PageLink, PageSummary};
pub use page::{ContentPage, PageStage, RenderError, RenderErrorKind};
pub use plugins::Plugins;
pub use resolver::{MissingContentError, ResolvedPage, discover_nav, orphans, resolve};
pub use search::{SEARCH_INDEX_PATH, SearchDoc, SearchIndex, SearchOptions};
pub use tags::TagIndex;
pub use template::{PageView, SiteTemplate};
pub use watch::{ChangeReceiver, RebuildPlan, WatchError, WatchHandle, plan, watch};
