//! Memory service HTTP client for the PAGI agent planner.
//!
//! The episodic (keyed) side of the memory service speaks plain HTTP/JSON;
//! the retrieval side speaks gRPC and lives in `pagi-rpc`.

mod http;

pub use http::HttpEpisodicStore;
