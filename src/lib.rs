//! csspack - merge, dedupe and minify the stylesheets of a built site.
//!
//! Every html page's `<link rel="stylesheet">` and `<style>` declarations are
//! collected per media, resolved once per run, concatenated in document order,
//! minified, and handed back as one external stylesheet (or one inline block)
//! per page and media. Pages with the same ordered styles share one bundle.
//!
//! ```ignore
//! let packer = Packer::new(PackConfig::default(), Arc::new(HttpFetcher::new()?));
//! let report = packer.run(&mut files).await?;
//! ```

pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod files;
pub mod hash;
pub mod html;
pub mod logger;
pub mod minify;
pub mod output;
pub mod pack;
pub mod registry;
pub mod resolve;
pub mod scan;

pub use cli::Cli;
pub use config::PackConfig;
pub use error::{FetchError, PackError};
pub use fetch::{Fetcher, HttpFetcher};
pub use files::FileSet;
pub use html::{StyleDocument, TlDocument};
pub use output::OutputMode;
pub use pack::{PackReport, Packer};
