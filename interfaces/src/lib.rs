//! Types exchanged with the collaborators around the aggregator: the feed list
//! it reads, the curated links it merges in, and the records both share with
//! aggregated entries.

pub mod defs;
pub mod priority;
pub mod source_list;

pub use defs::{Discussion, PlatformSource, SourceDescriptor};
pub use priority::{PriorityLink, PriorityLinks};
pub use source_list::{Outline, SourceList};
