mod json;

pub use json::to_pretty_json;
pub use json::write_atomic;
