//! SQL query modules, one per table family.

pub mod kv;
