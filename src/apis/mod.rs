pub mod export;
pub mod tmdb;

use crate::error::Result;
use crate::types::RawRecord;

pub use export::ExportFile;
pub use tmdb::{TmdbClient, TmdbSource};

/// Anything that can hand the pipeline a batch of raw movie records
pub trait MovieSource {
    /// Short identifier used in logs
    fn source_name(&self) -> &'static str;

    fn fetch_records(&self) -> Result<Vec<RawRecord>>;
}
