//! CSV source resolvers and their building blocks.
//!
//! - [`server`]: CSV text fetched over HTTP, with header discovery in [`header`]
//! - [`attachment`]: CSV files resolved through the platform, with header sniffing in [`sniff`]
//! - [`csv`]: delimited-text parsing shared by both
//! - [`format`]: table-to-record conversion
//! - [`observability`]: observer hooks for operation outcomes

pub mod attachment;
pub mod csv;
pub mod format;
pub mod header;
pub mod observability;
pub mod server;
pub mod sniff;

pub use format::format_result;
pub use observability::{
    CompositeObserver, FeedContext, FeedObserver, FeedOperation, FeedSeverity, FeedStats, FileObserver,
    TracingObserver,
};
pub use sniff::{HeaderSniffer, StructuralSniffer};
