//! The table of entity kinds: how each one is addressed and which of its
//! JSON fields become child nodes.
//!
//! # Design
//! The table is plain data built once, shared behind an `Arc`, and never
//! mutated. Hydration looks a kind up here instead of dispatching on type
//! names, so adding a kind is a new row, not new control flow.

use std::collections::HashMap;
use std::fmt;

/// Tag for every kind of remote resource the client knows how to hydrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Space,
    Board,
    Column,
    Lane,
    Card,
    User,
    Tag,
    Comment,
    ExternalLink,
    CardType,
    CardChild,
    CardBlocker,
    CardFile,
    CardTimeLog,
    CardDefinitionOfDone,
    Checklist,
    ChecklistItem,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Space => "space",
            Kind::Board => "board",
            Kind::Column => "column",
            Kind::Lane => "lane",
            Kind::Card => "card",
            Kind::User => "user",
            Kind::Tag => "tag",
            Kind::Comment => "comment",
            Kind::ExternalLink => "external link",
            Kind::CardType => "card type",
            Kind::CardChild => "card child",
            Kind::CardBlocker => "card blocker",
            Kind::CardFile => "card file",
            Kind::CardTimeLog => "card time log",
            Kind::CardDefinitionOfDone => "definition of done",
            Kind::Checklist => "checklist",
            Kind::ChecklistItem => "checklist item",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a node of some kind lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTemplate {
    /// `/{segment}/{id}`, independent of the parent.
    Absolute(&'static str),
    /// `{parent path}/{segment}/{id}`.
    Relative(&'static str),
    /// Only reachable through a parent's payload.
    Unaddressable,
}

impl PathTemplate {
    /// Render the template for `id` below `parent_path`.
    ///
    /// Returns `None` when the kind is unaddressable, or when a relative
    /// template has no parent path to hang from.
    pub fn render(&self, parent_path: Option<&str>, id: &str) -> Option<String> {
        match self {
            PathTemplate::Absolute(segment) => Some(format!("/{segment}/{id}")),
            PathTemplate::Relative(segment) => {
                parent_path.map(|parent| format!("{parent}/{segment}/{id}"))
            }
            PathTemplate::Unaddressable => None,
        }
    }
}

/// A JSON field that is turned into child nodes instead of a plain attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// The field holds one object.
    One { field: &'static str, kind: Kind },
    /// The field holds an array of objects.
    Many { field: &'static str, kind: Kind },
}

impl Promotion {
    pub fn field(&self) -> &'static str {
        match self {
            Promotion::One { field, .. } | Promotion::Many { field, .. } => field,
        }
    }
}

/// Everything the mapper needs to know about one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSpec {
    pub path: PathTemplate,
    pub promotions: &'static [Promotion],
    /// `board`/`column`/`lane` fields chain into one `Location`.
    pub composite_location: bool,
    /// Card filter parameter this kind contributes, e.g. `board_id`.
    pub scope_param: Option<&'static str>,
}

impl KindSpec {
    pub const OPAQUE: KindSpec = KindSpec::new(PathTemplate::Unaddressable);

    pub const fn new(path: PathTemplate) -> Self {
        Self {
            path,
            promotions: &[],
            composite_location: false,
            scope_param: None,
        }
    }

    pub const fn promoting(mut self, promotions: &'static [Promotion]) -> Self {
        self.promotions = promotions;
        self
    }

    pub const fn with_location(mut self) -> Self {
        self.composite_location = true;
        self
    }

    pub const fn scoped_by(mut self, param: &'static str) -> Self {
        self.scope_param = Some(param);
        self
    }
}

const SPACE_PROMOTIONS: &[Promotion] = &[Promotion::Many {
    field: "boards",
    kind: Kind::Board,
}];

const BOARD_PROMOTIONS: &[Promotion] = &[
    Promotion::Many { field: "columns", kind: Kind::Column },
    Promotion::Many { field: "lanes", kind: Kind::Lane },
    Promotion::Many { field: "cards", kind: Kind::Card },
];

const CARD_PROMOTIONS: &[Promotion] = &[
    Promotion::One { field: "type", kind: Kind::CardType },
    Promotion::Many { field: "tags", kind: Kind::Tag },
    Promotion::Many { field: "members", kind: Kind::User },
    Promotion::One { field: "owner", kind: Kind::User },
    Promotion::Many { field: "parents", kind: Kind::Card },
    Promotion::Many { field: "children", kind: Kind::Card },
    Promotion::Many { field: "checklists", kind: Kind::Checklist },
    Promotion::Many { field: "files", kind: Kind::CardFile },
];

const CARD_FILE_PROMOTIONS: &[Promotion] = &[Promotion::One {
    field: "author",
    kind: Kind::User,
}];

const CHECKLIST_PROMOTIONS: &[Promotion] = &[Promotion::Many {
    field: "items",
    kind: Kind::ChecklistItem,
}];

/// Immutable kind → spec table, injected into every node context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    specs: HashMap<Kind, KindSpec>,
}

impl Registry {
    /// The table for the Kaiten v1 API.
    pub fn standard() -> Self {
        use PathTemplate::{Absolute, Relative, Unaddressable};

        let specs = HashMap::from([
            (
                Kind::Space,
                KindSpec::new(Absolute("spaces"))
                    .promoting(SPACE_PROMOTIONS)
                    .scoped_by("space_id"),
            ),
            (
                Kind::Board,
                KindSpec::new(Absolute("boards"))
                    .promoting(BOARD_PROMOTIONS)
                    .scoped_by("board_id"),
            ),
            (Kind::Column, KindSpec::new(Relative("columns")).scoped_by("column_id")),
            (Kind::Lane, KindSpec::new(Relative("lanes")).scoped_by("lane_id")),
            (
                Kind::Card,
                KindSpec::new(Absolute("cards"))
                    .promoting(CARD_PROMOTIONS)
                    .with_location(),
            ),
            (Kind::User, KindSpec::new(Unaddressable)),
            (Kind::Tag, KindSpec::new(Relative("tags"))),
            (Kind::Comment, KindSpec::new(Relative("comments"))),
            (Kind::ExternalLink, KindSpec::new(Relative("external-links"))),
            (Kind::CardType, KindSpec::new(Absolute("card-types"))),
            (Kind::CardChild, KindSpec::new(Relative("children"))),
            (Kind::CardBlocker, KindSpec::new(Relative("blockers"))),
            (
                Kind::CardFile,
                KindSpec::new(Unaddressable).promoting(CARD_FILE_PROMOTIONS),
            ),
            (Kind::CardTimeLog, KindSpec::new(Relative("time-logs"))),
            (
                Kind::CardDefinitionOfDone,
                KindSpec::new(Relative("definition-of-done")),
            ),
            (
                Kind::Checklist,
                KindSpec::new(Relative("checklists")).promoting(CHECKLIST_PROMOTIONS),
            ),
            (Kind::ChecklistItem, KindSpec::new(Relative("items"))),
        ]);

        Self { specs }
    }

    /// A table with no kinds at all; every lookup yields `KindSpec::OPAQUE`.
    pub fn empty() -> Self {
        Self {
            specs: HashMap::new(),
        }
    }

    /// A copy of this table with `kind` described by `spec`.
    pub fn with(mut self, kind: Kind, spec: KindSpec) -> Self {
        self.specs.insert(kind, spec);
        self
    }

    pub fn spec(&self, kind: Kind) -> &KindSpec {
        self.specs.get(&kind).unwrap_or(&KindSpec::OPAQUE)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
