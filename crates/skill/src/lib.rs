//! Voice skill request handling for river levels.
//!
//! - **Envelope** (`envelope`) - platform request/response JSON shapes
//! - **Router** (`router`) - classifies a request and picks the answer
//! - **Fetcher** (`fetcher`) - live river state from the provider API
//! - **Response** (`response`) - speech text and session flag
//!
//! # Architecture
//!
//! ```text
//! SkillRequest → IntentRouter → LocaleCatalog lookup
//!                    ↓                ↓
//!              SkillResponse ← RiverStateFetcher (GET {base}/river/{id})
//! ```

pub mod envelope;
pub mod fetcher;
pub mod response;
pub mod router;

pub use envelope::{SkillRequest, SkillResponse};
pub use fetcher::{HttpRiverStateFetcher, RiverStateFetcher};
pub use router::{IntentRouter, IntentTable, RequestContext, RouteError, RoutingPolicy};
