//! Replay transports. The trait lives in tether-core; the HTTP
//! implementation ships here.

pub mod http;

pub use http::HttpReplayTransport;
