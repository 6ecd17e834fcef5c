//! Generic in-memory representatives of remote resources.
//!
//! # Overview
//! A `Node` is one hydrated JSON record: its plain attributes, the child
//! nodes promoted out of nested fields, and (for cards) the board → column →
//! lane location chain. Nodes know their own REST path and expose the
//! generic verbs through the `Resource` trait.
//!
//! # Design
//! - Nodes never hold their parent. They are created with a `NodeContext`
//!   carrying the shared engine, the kind table, the parent's resolved path
//!   and the kinds/ids of the ancestors they were reached through.
//! - Every node talks to the engine directly through that context; nothing
//!   walks up a chain of owners at call time.
//! - Which fields are promoted, and into what, comes from the `Registry`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::engine::{Engine, Params};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::registry::{Kind, Promotion, Registry};

/// One step of the path a node was reached through.
#[derive(Debug, Clone, PartialEq)]
pub struct Ancestor {
    pub kind: Kind,
    pub id: Value,
}

/// What a node is born with: engine handle, kind table and where its
/// parent lives.
#[derive(Clone)]
pub struct NodeContext {
    engine: Arc<Engine>,
    registry: Arc<Registry>,
    parent_path: Option<String>,
    lineage: Vec<Ancestor>,
}

impl NodeContext {
    /// Context for nodes hanging directly off the session.
    pub fn root(engine: Arc<Engine>, registry: Arc<Registry>) -> Self {
        Self {
            engine,
            registry,
            parent_path: Some(String::new()),
            lineage: Vec::new(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolved path of the parent, `""` for the session, `None` when the
    /// parent itself has no path.
    pub fn parent_path(&self) -> Option<&str> {
        self.parent_path.as_deref()
    }

    pub fn lineage(&self) -> &[Ancestor] {
        &self.lineage
    }

    fn child(&self, parent_path: Option<String>, ancestor: Ancestor) -> Self {
        let mut lineage = self.lineage.clone();
        lineage.push(ancestor);
        Self {
            engine: Arc::clone(&self.engine),
            registry: Arc::clone(&self.registry),
            parent_path,
            lineage,
        }
    }
}

impl fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeContext")
            .field("parent_path", &self.parent_path)
            .field("lineage", &self.lineage)
            .finish_non_exhaustive()
    }
}

/// Anything that can issue requests on behalf of its children: the session
/// and every node.
pub trait Resource {
    /// This resource's own path below the API prefix (`""` for the session).
    fn resolve_path(&self) -> Result<String, ApiError>;

    /// Context handed to nodes created from this resource's responses.
    fn child_context(&self) -> NodeContext;

    fn engine(&self) -> &Engine;

    /// Absolute paths pass through; relative ones hang below `resolve_path`.
    fn resolve(&self, path: &str) -> Result<String, ApiError> {
        if path.starts_with('/') {
            Ok(path.to_string())
        } else {
            Ok(format!("{}/{path}", self.resolve_path()?))
        }
    }

    /// GET `{collection}/{id}` and hydrate the record as `kind`.
    fn fetch_one(
        &self,
        collection: &str,
        kind: Kind,
        id: impl fmt::Display,
        params: Params,
    ) -> Result<Node, ApiError> {
        let path = format!("{}/{id}", self.resolve(collection)?);
        let value = self.engine().request(HttpMethod::Get, &path, &params)?;
        let record = expect_object(value, &path, HttpMethod::Get)?;
        Node::hydrate(kind, self.child_context(), record)
    }

    /// GET `collection` and hydrate every element, in response order.
    fn fetch_many(
        &self,
        collection: &str,
        kind: Kind,
        params: Params,
    ) -> Result<Vec<Node>, ApiError> {
        let path = self.resolve(collection)?;
        let value = self.engine().request(HttpMethod::Get, &path, &params)?;
        let Value::Array(items) = value else {
            return Err(ApiError::UnexpectedShape {
                path,
                method: HttpMethod::Get,
                expected: "an array",
            });
        };

        let context = self.child_context();
        items
            .into_iter()
            .map(|item| {
                let record = expect_object(item, &path, HttpMethod::Get)?;
                Node::hydrate(kind, context.clone(), record)
            })
            .collect()
    }

    /// POST `params` to `collection` and hydrate the created record.
    fn create_item(&self, collection: &str, kind: Kind, params: Params) -> Result<Node, ApiError> {
        let path = self.resolve(collection)?;
        let value = self.engine().request(HttpMethod::Post, &path, &params)?;
        let record = expect_object(value, &path, HttpMethod::Post)?;
        Node::hydrate(kind, self.child_context(), record)
    }
}

/// Child nodes promoted out of one field.
#[derive(Debug, Clone)]
pub enum Promoted {
    One(Node),
    Many(Vec<Node>),
}

/// Where a card sits: a board, optionally wrapped by a column, optionally
/// wrapped by a lane.
#[derive(Debug, Clone)]
pub enum Location {
    Board(Node),
    Column { column: Node, within: Box<Location> },
    Lane { lane: Node, within: Box<Location> },
}

impl Location {
    /// The outermost wrapper: lane if present, else column, else board.
    pub fn head(&self) -> &Node {
        match self {
            Location::Board(board) => board,
            Location::Column { column, .. } => column,
            Location::Lane { lane, .. } => lane,
        }
    }

    pub fn within(&self) -> Option<&Location> {
        match self {
            Location::Board(_) => None,
            Location::Column { within, .. } | Location::Lane { within, .. } => Some(within),
        }
    }

    pub fn board(&self) -> &Node {
        match self {
            Location::Board(board) => board,
            Location::Column { within, .. } | Location::Lane { within, .. } => within.board(),
        }
    }

    pub fn column(&self) -> Option<&Node> {
        match self {
            Location::Board(_) => None,
            Location::Column { column, .. } => Some(column),
            Location::Lane { within, .. } => within.column(),
        }
    }

    pub fn lane(&self) -> Option<&Node> {
        match self {
            Location::Lane { lane, .. } => Some(lane),
            _ => None,
        }
    }

    /// Number of levels in the chain, 1 to 3.
    pub fn depth(&self) -> usize {
        1 + self.within().map_or(0, Location::depth)
    }

    /// Pull `board`, `column` and `lane` out of `record` and chain them.
    ///
    /// `column` and `lane` are dropped when there is no board to hang them on.
    fn take(owner: Kind, context: &NodeContext, record: &mut Map<String, Value>) -> Result<Option<Self>, ApiError> {
        let board = record.remove("board");
        let column = record.remove("column");
        let lane = record.remove("lane");

        let Some(board) = optional_object(owner, "board", board)? else {
            return Ok(None);
        };
        let mut location = Location::Board(Node::hydrate(Kind::Board, context.clone(), board)?);

        if let Some(column) = optional_object(owner, "column", column)? {
            let column = Node::hydrate(Kind::Column, location.head().child_context(), column)?;
            location = Location::Column {
                column,
                within: Box::new(location),
            };
        }
        if let Some(lane) = optional_object(owner, "lane", lane)? {
            // Lanes are addressed below the board, not the column.
            let lane = Node::hydrate(Kind::Lane, location.board().child_context(), lane)?;
            location = Location::Lane {
                lane,
                within: Box::new(location),
            };
        }

        Ok(Some(location))
    }
}

/// A hydrated remote resource.
#[derive(Debug, Clone)]
pub struct Node {
    kind: Kind,
    context: NodeContext,
    attributes: Map<String, Value>,
    promoted: BTreeMap<&'static str, Promoted>,
    location: Option<Box<Location>>,
}

impl Node {
    /// Build a node of `kind` from one decoded record.
    ///
    /// Promoted fields become child nodes (list fields always exist, empty
    /// when absent); everything else is kept verbatim as an attribute.
    pub fn hydrate(kind: Kind, context: NodeContext, record: Map<String, Value>) -> Result<Self, ApiError> {
        let mut node = Self {
            kind,
            context,
            attributes: Map::new(),
            promoted: BTreeMap::new(),
            location: None,
        };
        node.absorb(record, true)?;
        Ok(node)
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn context(&self) -> &NodeContext {
        &self.context
    }

    pub fn id(&self) -> Option<&Value> {
        self.attributes.get("id")
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Attribute `name` decoded as `T`; `None` if absent or of another type.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.attributes
            .get(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Plain attributes, promoted fields excluded.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Child promoted from single-object field `field`.
    pub fn child(&self, field: &str) -> Option<&Node> {
        match self.promoted.get(field) {
            Some(Promoted::One(node)) => Some(node),
            _ => None,
        }
    }

    /// Children promoted from list field `field`; empty if never promoted.
    pub fn children(&self, field: &str) -> &[Node] {
        match self.promoted.get(field) {
            Some(Promoted::Many(nodes)) => nodes,
            _ => &[],
        }
    }

    pub fn promoted(&self) -> impl Iterator<Item = (&'static str, &Promoted)> {
        self.promoted.iter().map(|(field, promoted)| (*field, promoted))
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_deref()
    }

    /// PATCH this node and merge the response into it.
    ///
    /// Keys missing from the response keep their current values.
    pub fn apply_update(&mut self, params: Params) -> Result<(), ApiError> {
        let path = Resource::resolve_path(self)?;
        let value = self.context.engine().request(HttpMethod::Patch, &path, &params)?;
        let record = expect_object(value, &path, HttpMethod::Patch)?;
        self.absorb(record, false)
    }

    /// DELETE this node on the server. The local value is left to the caller.
    pub fn remove(&self, params: Params) -> Result<(), ApiError> {
        let path = Resource::resolve_path(self)?;
        self.context.engine().request(HttpMethod::Delete, &path, &params)?;
        Ok(())
    }

    /// Card filters implied by where this node was reached: `space_id`,
    /// `board_id`, ... for every scoped ancestor and for the node itself.
    pub fn scope_params(&self) -> Params {
        let registry = self.context.registry();
        let own = self.id().map(|id| Ancestor {
            kind: self.kind,
            id: id.clone(),
        });

        let mut params = Params::new();
        for ancestor in self.context.lineage().iter().chain(own.as_ref()) {
            if let Some(param) = registry.spec(ancestor.kind).scope_param {
                params.insert(param.to_string(), ancestor.id.clone());
            }
        }
        params
    }

    fn absorb(&mut self, mut record: Map<String, Value>, fresh: bool) -> Result<(), ApiError> {
        if let Some(id) = record.get("id") {
            self.attributes.insert("id".to_string(), id.clone());
        }

        let owner = self.kind;
        let spec = *self.context.registry().spec(owner);
        let children = self.child_context();

        for promotion in spec.promotions {
            match *promotion {
                Promotion::One { field, kind } => match record.remove(field) {
                    None => {}
                    Some(Value::Null) => {
                        self.promoted.remove(field);
                    }
                    Some(Value::Object(sub)) => {
                        let child = Node::hydrate(kind, children.clone(), sub)?;
                        self.promoted.insert(field, Promoted::One(child));
                    }
                    Some(_) => return Err(malformed(owner, field.to_string(), "an object")),
                },
                Promotion::Many { field, kind } => {
                    let nodes = match record.remove(field) {
                        None if !fresh => continue,
                        None | Some(Value::Null) => Vec::new(),
                        Some(Value::Array(items)) => items
                            .into_iter()
                            .enumerate()
                            .map(|(index, item)| match item {
                                Value::Object(sub) => Node::hydrate(kind, children.clone(), sub),
                                _ => Err(malformed(owner, format!("{field}[{index}]"), "an object")),
                            })
                            .collect::<Result<Vec<_>, _>>()?,
                        Some(_) => return Err(malformed(owner, field.to_string(), "an array")),
                    };
                    self.promoted.insert(field, Promoted::Many(nodes));
                }
            }
        }

        if spec.composite_location {
            if let Some(location) = Location::take(owner, &children, &mut record)? {
                self.location = Some(Box::new(location));
            }
        }

        self.attributes.extend(record);
        Ok(())
    }
}

impl Resource for Node {
    fn resolve_path(&self) -> Result<String, ApiError> {
        let not_addressable = || ApiError::NotAddressable { kind: self.kind };
        let id = self.id().map(path_segment).ok_or_else(not_addressable)?;
        self.context
            .registry()
            .spec(self.kind)
            .path
            .render(self.context.parent_path(), &id)
            .ok_or_else(not_addressable)
    }

    fn child_context(&self) -> NodeContext {
        let ancestor = Ancestor {
            kind: self.kind,
            id: self.id().cloned().unwrap_or(Value::Null),
        };
        self.context.child(Resource::resolve_path(self).ok(), ancestor)
    }

    fn engine(&self) -> &Engine {
        self.context.engine()
    }
}

fn path_segment(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn expect_object(value: Value, path: &str, method: HttpMethod) -> Result<Map<String, Value>, ApiError> {
    match value {
        Value::Object(record) => Ok(record),
        _ => Err(ApiError::UnexpectedShape {
            path: path.to_string(),
            method,
            expected: "an object",
        }),
    }
}

fn optional_object(
    owner: Kind,
    field: &str,
    value: Option<Value>,
) -> Result<Option<Map<String, Value>>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(record)) => Ok(Some(record)),
        Some(_) => Err(malformed(owner, field.to_string(), "an object")),
    }
}

fn malformed(kind: Kind, field: String, expected: &'static str) -> ApiError {
    ApiError::MalformedRecord {
        kind,
        field,
        expected,
    }
}
