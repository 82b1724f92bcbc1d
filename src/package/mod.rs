//! Package management module
//!
//! Naming and versioning of libraries, their metadata records, the on-disk
//! store and the index scanned from it.

mod index;
mod meta;
mod resolver;
mod store;
mod version;

pub use index::{Index, IndexEntry, parse_entry_name};
pub use meta::Meta;
pub use resolver::{
    DEFAULT_VERSION, Hint, NameVersionResolver, Resolved, from_filename, from_header,
    normalize_name, normalize_version, sanitize_name, strip_known_extension,
};
pub use store::Store;
pub use version::VersionComparator;
