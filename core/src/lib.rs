//! Synchronous client for the Kaiten project-management REST API.
//!
//! # Overview
//! A `Session` turns JSON payloads from `/api/v1` into a graph of typed
//! entities (spaces, boards, cards, ...). Each entity can issue further
//! requests relative to its own location in the graph, so
//! `space.get_boards()` lists `/spaces/{id}/boards` and `card.add_comment`
//! posts to `/cards/{id}/comments`.
//!
//! # Design
//! - `Engine` splits every call into `build_request` and `parse_response`
//!   around a `Transport`; the default transport is ureq, tests plug in
//!   their own.
//! - `Registry` is an immutable table mapping each `Kind` to its path
//!   template and the nested fields promoted to child nodes.
//! - Nodes share the engine and registry through `Arc` and remember only
//!   their parent's path and ancestor ids, never the parent object.
//! - Every failure is an `ApiError`; nothing is retried.

pub mod config;
pub mod engine;
pub mod entities;
pub mod error;
pub mod http;
pub mod node;
pub mod registry;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::SessionConfig;
pub use engine::{Engine, Params, API_PREFIX, USER_AGENT};
pub use entities::{
    Board, Card, CardBlocker, CardChild, CardDefinitionOfDone, CardFile, CardTimeLog, CardType,
    Checklist, ChecklistItem, Column, Comment, Entity, ExternalLink, Lane, Space, Tag, User,
};
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use node::{Ancestor, Location, Node, NodeContext, Promoted, Resource};
pub use registry::{Kind, KindSpec, PathTemplate, Promotion, Registry};
pub use session::Session;
pub use transport::UreqTransport;
