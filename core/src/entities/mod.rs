//! Typed views over `Node` for every kind the Kaiten API exposes.
//!
//! # Design
//! Each entity is a newtype around a hydrated `Node`. Its declared fields get
//! typed accessors; anything else the server sends stays reachable through
//! `Entity::extra` and the underlying node. Entity-specific calls package
//! their parameters and hand off to the generic verbs in `node`.

use std::fmt;

use serde_json::{Map, Value};

use crate::engine::Params;
use crate::error::ApiError;
use crate::node::{Node, Resource};
use crate::registry::Kind;

/// Declare an entity wrapper: the struct, its `Entity` impl and one typed
/// accessor per declared field.
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $name:ident => $kind:ident { $($field:ident: $ty:ty),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            node: $crate::node::Node,
        }

        impl $crate::entities::Entity for $name {
            const KIND: $crate::registry::Kind = $crate::registry::Kind::$kind;
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];
        }

        impl From<$crate::node::Node> for $name {
            fn from(node: $crate::node::Node) -> Self {
                Self { node }
            }
        }

        impl AsRef<$crate::node::Node> for $name {
            fn as_ref(&self) -> &$crate::node::Node {
                &self.node
            }
        }

        impl $name {
            pub fn node(&self) -> &$crate::node::Node {
                &self.node
            }

            pub fn into_node(self) -> $crate::node::Node {
                self.node
            }

            $(
                pub fn $field(&self) -> Option<$ty> {
                    self.node.field(stringify!($field))
                }
            )*
        }
    };
}

/// `update` (PATCH + merge) and `delete` for kinds that support both.
macro_rules! editable {
    ($($name:ident),* $(,)?) => {
        $(
            impl $name {
                pub fn update(&mut self, params: $crate::engine::Params) -> Result<(), $crate::error::ApiError> {
                    self.node.apply_update(params)
                }

                pub fn delete(self) -> Result<(), $crate::error::ApiError> {
                    self.node.remove($crate::engine::Params::new())
                }
            }
        )*
    };
}

mod board;
mod card;
mod card_items;
mod people;
mod space;

pub use board::{Board, Column, Lane};
pub use card::Card;
pub use card_items::{
    CardBlocker, CardChild, CardDefinitionOfDone, CardFile, CardTimeLog, Checklist, ChecklistItem,
    Comment, ExternalLink, Tag,
};
pub use people::{CardType, User};
pub use space::Space;

/// A typed wrapper around a node of one fixed kind.
pub trait Entity: From<Node> + AsRef<Node> {
    const KIND: Kind;
    /// Fields with typed accessors.
    const FIELDS: &'static [&'static str];

    /// Attributes the server sent that are not declared fields.
    fn extra(&self) -> Map<String, Value> {
        self.as_ref()
            .attributes()
            .iter()
            .filter(|(key, _)| !Self::FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

pub(crate) fn fetch_one<E: Entity>(
    from: &impl Resource,
    collection: &str,
    id: impl fmt::Display,
    params: Params,
) -> Result<E, ApiError> {
    from.fetch_one(collection, E::KIND, id, params).map(E::from)
}

pub(crate) fn fetch_many<E: Entity>(
    from: &impl Resource,
    collection: &str,
    params: Params,
) -> Result<Vec<E>, ApiError> {
    from.fetch_many(collection, E::KIND, params)
        .map(|nodes| nodes.into_iter().map(E::from).collect())
}

pub(crate) fn create<E: Entity>(
    from: &impl Resource,
    collection: &str,
    params: Params,
) -> Result<E, ApiError> {
    from.create_item(collection, E::KIND, params).map(E::from)
}

pub(crate) fn child<E: Entity>(node: &Node, field: &str) -> Option<E> {
    node.child(field).cloned().map(E::from)
}

pub(crate) fn children<E: Entity>(node: &Node, field: &str) -> Vec<E> {
    node.children(field).iter().cloned().map(E::from).collect()
}

/// `params` with `key` set to `value`, replacing any caller-supplied value.
pub(crate) fn with(mut params: Params, key: &str, value: impl Into<Value>) -> Params {
    params.insert(key.to_string(), value.into());
    params
}

/// `params` with the card filters implied by `node` layered on top.
///
/// Apply before any explicit ids so those always reach the request.
pub(crate) fn scoped(mut params: Params, node: &Node) -> Params {
    params.extend(node.scope_params());
    params
}
