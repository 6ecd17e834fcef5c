use crate::engine::Params;
use crate::error::ApiError;

use super::{child, children, create, with, User};

entity! {
    Tag => Tag {
        id: i64,
        name: String,
        color: i64,
    }
}

entity! {
    Comment => Comment {
        id: i64,
        text: String,
        author_id: i64,
        created: String,
        updated: String,
    }
}

entity! {
    ExternalLink => ExternalLink {
        id: i64,
        url: String,
        description: String,
    }
}

entity! {
    /// Parent/child link between two cards.
    CardChild => CardChild {
        id: i64,
        card_id: i64,
        title: String,
    }
}

entity! {
    CardBlocker => CardBlocker {
        id: i64,
        reason: String,
        blocker_card_id: i64,
        released: bool,
    }
}

entity! {
    /// An attachment; only reachable through its card.
    CardFile => CardFile {
        id: i64,
        name: String,
        url: String,
        size: i64,
    }
}

entity! {
    CardTimeLog => CardTimeLog {
        id: i64,
        role_id: i64,
        time_spent: i64,
        for_date: String,
        comment: String,
    }
}

entity! {
    /// One acceptance criterion of a card.
    CardDefinitionOfDone => CardDefinitionOfDone {
        id: i64,
        text: String,
        checked: bool,
    }
}

entity! {
    Checklist => Checklist {
        id: i64,
        name: String,
        sort_order: f64,
    }
}

entity! {
    ChecklistItem => ChecklistItem {
        id: i64,
        text: String,
        checked: bool,
        sort_order: f64,
    }
}

editable!(
    Comment,
    ExternalLink,
    CardBlocker,
    CardTimeLog,
    CardDefinitionOfDone,
    Checklist,
    ChecklistItem,
);

impl Tag {
    /// Detach the tag from the card it was reached through.
    pub fn delete(self) -> Result<(), ApiError> {
        self.node.remove(Params::new())
    }
}

impl CardChild {
    pub fn delete(self) -> Result<(), ApiError> {
        self.node.remove(Params::new())
    }
}

impl CardFile {
    pub fn author(&self) -> Option<User> {
        child(&self.node, "author")
    }
}

impl Checklist {
    pub fn items(&self) -> Vec<ChecklistItem> {
        children(&self.node, "items")
    }

    pub fn add_item(&self, text: &str, params: Params) -> Result<ChecklistItem, ApiError> {
        create(&self.node, "items", with(params, "text", text))
    }
}
