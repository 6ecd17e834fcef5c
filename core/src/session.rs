//! The root of every entity graph.

use std::sync::Arc;

use crate::config::SessionConfig;
use crate::engine::{Engine, Params};
use crate::entities::{self, Card, CardType, Space, Tag, User};
use crate::error::ApiError;
use crate::http::Transport;
use crate::node::{NodeContext, Resource};
use crate::registry::Registry;
use crate::transport::UreqTransport;

/// Connection to one Kaiten installation.
///
/// Owns the engine (credentials plus transport) and the kind table; every
/// node it hands out shares both through its `NodeContext`.
#[derive(Debug, Clone)]
pub struct Session {
    root: NodeContext,
}

impl Session {
    /// Session over HTTPS using the default ureq transport.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    pub fn with_transport(config: SessionConfig, transport: impl Transport + 'static) -> Self {
        Self::with_registry(config, transport, Registry::standard())
    }

    pub fn with_registry(
        config: SessionConfig,
        transport: impl Transport + 'static,
        registry: Registry,
    ) -> Self {
        let engine = Engine::new(config, transport);
        Self {
            root: NodeContext::root(Arc::new(engine), Arc::new(registry)),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        self.root.engine().config()
    }

    pub fn get_spaces(&self) -> Result<Vec<Space>, ApiError> {
        entities::fetch_many(self, "/spaces", Params::new())
    }

    pub fn get_space(&self, id: i64) -> Result<Space, ApiError> {
        entities::fetch_one(self, "/spaces", id, Params::new())
    }

    pub fn create_space(&self, title: &str) -> Result<Space, ApiError> {
        entities::create(self, "/spaces", entities::with(Params::new(), "title", title))
    }

    /// Cards matching `params`, e.g. `board_id`, `state`, `query`.
    pub fn get_cards(&self, params: Params) -> Result<Vec<Card>, ApiError> {
        entities::fetch_many(self, "/cards", params)
    }

    pub fn get_card(&self, id: i64) -> Result<Card, ApiError> {
        entities::fetch_one(self, "/cards", id, Params::new())
    }

    pub fn get_users(&self) -> Result<Vec<User>, ApiError> {
        entities::fetch_many(self, "/users", Params::new())
    }

    pub fn get_user(&self, id: i64) -> Result<User, ApiError> {
        entities::fetch_one(self, "/users", id, Params::new())
    }

    pub fn get_tags(&self) -> Result<Vec<Tag>, ApiError> {
        entities::fetch_many(self, "/tags", Params::new())
    }

    pub fn get_card_types(&self) -> Result<Vec<CardType>, ApiError> {
        entities::fetch_many(self, "/card-types", Params::new())
    }

    pub fn create_card_type(&self, letter: &str, name: &str, color: i64) -> Result<CardType, ApiError> {
        let params = entities::with(Params::new(), "letter", letter);
        let params = entities::with(params, "name", name);
        let params = entities::with(params, "color", color);
        entities::create(self, "/card-types", params)
    }
}

impl Resource for Session {
    fn resolve_path(&self) -> Result<String, ApiError> {
        Ok(String::new())
    }

    fn child_context(&self) -> NodeContext {
        self.root.clone()
    }

    fn engine(&self) -> &Engine {
        self.root.engine()
    }
}
