use serde_json::{Map, Value};

/// Raw movie record as returned from the catalog API or a bulk export
pub type RawRecord = Value;

/// One movie table row rendered for JSON output, keyed in column order
pub type Row = Map<String, Value>;
