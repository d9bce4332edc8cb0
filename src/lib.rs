//! `csv-feed` fetches CSV feeds and turns them into plain records.
//!
//! Two sources are supported, selected by [`config::InputMode`]:
//!
//! - **Server URL**: the configured URL is fetched over HTTP. The header is found among
//!   `#`-comment lines or a fully quoted first line (see [`feeds::header`]).
//! - **Attachment / File IRI**: a platform file is resolved and downloaded through an
//!   [`collaborators::AttachmentService`]. Header presence is sniffed from the first 2KB (see
//!   [`feeds::sniff`]).
//!
//! Records can be returned to the caller or forwarded to an
//! [`collaborators::IngestionTrigger`].
//!
//! ## Quick example: fetch from a server
//!
//! ```no_run
//! use csv_feed::{FeedConfig, FeedConnector, InputMode, RequestParams};
//!
//! # fn main() -> Result<(), csv_feed::FeedError> {
//! let config: FeedConfig = serde_json::from_str(
//!     r#"{"server_url": "feeds.example.com/blocklist.csv", "verify_ssl": true, "input": "Server URL"}"#,
//! )?;
//! let params: RequestParams = serde_json::from_str(r#"{"col_name": "ip,reason", "delimiter": ","}"#)?;
//!
//! for record in FeedConnector::new(config).get_feeds_from_url(params)? {
//!     println!("{:?}", record.get("ip"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`connector`]: entry operations and observer reporting
//! - [`client`]: blocking HTTP client with error classification
//! - [`payload`]: parameter normalization
//! - [`feeds`]: source resolvers, CSV parsing, header detection, formatting
//! - [`collaborators`]: host platform interfaces
//! - [`config`], [`types`], [`error`]

pub mod client;
pub mod collaborators;
pub mod config;
pub mod connector;
pub mod error;
pub mod feeds;
pub mod payload;
pub mod types;

pub use config::{FeedConfig, InputMode};
pub use connector::{FeedConnector, FeedOptions};
pub use error::{FeedError, FeedResult, TransportFailure};
pub use types::{FeedResponse, ParamValue, ParsedTable, Record, RequestParams};
