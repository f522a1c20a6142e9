//! Connection plumbing: pragma application and the serialized write handle.

pub mod pragmas;
pub mod write_connection;

pub use write_connection::WriteConnection;
