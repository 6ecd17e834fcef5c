//! In-memory tables behind the mock API.

use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Map, Value};

pub type Record = Map<String, Value>;

/// One table per resource collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Spaces,
    Boards,
    Columns,
    Lanes,
    Cards,
    Users,
    Tags,
    CardTypes,
    CardTags,
    CardChildren,
    Comments,
    ExternalLinks,
    Blockers,
    TimeLogs,
    DefinitionOfDone,
    Checklists,
    ChecklistItems,
}

impl Table {
    /// Fields a create request must carry.
    pub fn required(self) -> &'static [&'static str] {
        match self {
            Table::Comments | Table::DefinitionOfDone | Table::ChecklistItems => &["text"],
            Table::ExternalLinks => &["url"],
            Table::TimeLogs => &["role_id", "time_spent", "for_date"],
            Table::Checklists => &["name"],
            Table::Spaces | Table::Boards | Table::Columns | Table::Lanes | Table::Cards => &["title"],
            Table::CardTypes => &["letter", "name"],
            _ => &[],
        }
    }
}

/// A login known to the mock. `user_id` points into `Table::Users`.
#[derive(Debug)]
pub struct Account {
    pub username: &'static str,
    pub password: &'static str,
    pub full_name: &'static str,
    pub user_id: i64,
    pub can_write: bool,
}

pub const ACCOUNTS: &[Account] = &[
    Account {
        username: "admin",
        password: "secret",
        full_name: "Admin",
        user_id: 1,
        can_write: true,
    },
    Account {
        username: "viewer",
        password: "viewer",
        full_name: "Read Only",
        user_id: 2,
        can_write: false,
    },
];

#[derive(Debug, Default)]
pub struct Store {
    next_id: i64,
    tables: HashMap<Table, BTreeMap<i64, Record>>,
}

impl Store {
    /// Users for every account plus the default card type.
    pub fn seeded() -> Self {
        let mut store = Store {
            next_id: 100,
            tables: HashMap::new(),
        };
        for account in ACCOUNTS {
            store.put(
                Table::Users,
                account.user_id,
                object(json!({
                    "id": account.user_id,
                    "username": account.username,
                    "full_name": account.full_name,
                    "email": format!("{}@example.com", account.username),
                    "activated": true,
                })),
            );
        }
        store.put(
            Table::CardTypes,
            1,
            object(json!({"id": 1, "letter": "C", "name": "Card", "color": 1, "archived": false})),
        );
        store
    }

    fn put(&mut self, table: Table, id: i64, record: Record) {
        self.tables.entry(table).or_default().insert(id, record);
    }

    /// Store `record` under a fresh id and return the stored copy.
    pub fn insert(&mut self, table: Table, mut record: Record) -> Record {
        self.next_id += 1;
        let id = self.next_id;
        record.insert("id".to_string(), json!(id));
        self.put(table, id, record.clone());
        record
    }

    pub fn get(&self, table: Table, id: i64) -> Option<&Record> {
        self.tables.get(&table).and_then(|rows| rows.get(&id))
    }

    /// `id` in `table`, only if its `field` equals `owner`.
    pub fn owned(&self, table: Table, id: i64, field: &str, owner: i64) -> Option<&Record> {
        self.get(table, id).filter(|record| int(record, field) == Some(owner))
    }

    /// Rows matching `filter`, in id order.
    pub fn find(&self, table: Table, filter: impl Fn(&Record) -> bool) -> Vec<&Record> {
        self.tables
            .get(&table)
            .map(|rows| rows.values().filter(|record| filter(record)).collect())
            .unwrap_or_default()
    }

    /// Overwrite fields of `id` with `patch`; the id itself is kept.
    pub fn merge(&mut self, table: Table, id: i64, patch: Record) -> Option<Record> {
        let record = self.tables.get_mut(&table)?.get_mut(&id)?;
        for (key, value) in patch {
            if key != "id" {
                record.insert(key, value);
            }
        }
        Some(record.clone())
    }

    pub fn remove(&mut self, table: Table, id: i64) -> Option<Record> {
        self.tables.get_mut(&table)?.remove(&id)
    }

    /// Drop every row of `table` matching `filter`.
    pub fn remove_where(&mut self, table: Table, filter: impl Fn(&Record) -> bool) {
        if let Some(rows) = self.tables.get_mut(&table) {
            rows.retain(|_, record| !filter(record));
        }
    }

    fn lookup(&self, table: Table, id: Option<i64>) -> Option<Value> {
        id.and_then(|id| self.get(table, id))
            .map(|record| Value::Object(record.clone()))
    }

    fn embed(&self, table: Table, id: Option<i64>) -> Value {
        self.lookup(table, id).unwrap_or(Value::Null)
    }

    fn rows(&self, table: Table, field: &str, owner: i64) -> Vec<Value> {
        self.find(table, |record| int(record, field) == Some(owner))
            .into_iter()
            .map(|record| Value::Object(record.clone()))
            .collect()
    }

    pub fn space_view(&self, space: &Record) -> Value {
        let mut view = space.clone();
        let boards = self
            .find(Table::Boards, |board| int(board, "space_id") == int(space, "id"))
            .into_iter()
            .map(|board| self.board_view(board))
            .collect();
        view.insert("boards".to_string(), Value::Array(boards));
        Value::Object(view)
    }

    pub fn board_view(&self, board: &Record) -> Value {
        let mut view = board.clone();
        let Some(id) = int(board, "id") else {
            return Value::Object(view);
        };
        view.insert("columns".to_string(), Value::Array(self.rows(Table::Columns, "board_id", id)));
        view.insert("lanes".to_string(), Value::Array(self.rows(Table::Lanes, "board_id", id)));
        view.insert("cards".to_string(), Value::Array(self.rows(Table::Cards, "board_id", id)));
        Value::Object(view)
    }

    /// A card with its location, people, type, tags, links and checklists.
    pub fn card_view(&self, card: &Record) -> Value {
        let mut view = card.clone();
        let Some(id) = int(card, "id") else {
            return Value::Object(view);
        };

        view.insert("board".to_string(), self.embed(Table::Boards, int(card, "board_id")));
        view.insert("column".to_string(), self.embed(Table::Columns, int(card, "column_id")));
        view.insert("lane".to_string(), self.embed(Table::Lanes, int(card, "lane_id")));
        let owner = self.embed(Table::Users, int(card, "owner_id"));
        let members = if owner.is_null() { vec![] } else { vec![owner.clone()] };
        view.insert("owner".to_string(), owner);
        view.insert("members".to_string(), Value::Array(members));
        view.insert("type".to_string(), self.embed(Table::CardTypes, int(card, "type_id")));

        let tags = self
            .find(Table::CardTags, |link| int(link, "card_id") == Some(id))
            .into_iter()
            .filter_map(|link| self.lookup(Table::Tags, int(link, "tag_id")))
            .collect();
        view.insert("tags".to_string(), Value::Array(tags));

        let children = self
            .find(Table::CardChildren, |link| int(link, "parent_id") == Some(id))
            .into_iter()
            .filter_map(|link| self.lookup(Table::Cards, int(link, "card_id")))
            .collect();
        view.insert("children".to_string(), Value::Array(children));
        let parents = self
            .find(Table::CardChildren, |link| int(link, "card_id") == Some(id))
            .into_iter()
            .filter_map(|link| self.lookup(Table::Cards, int(link, "parent_id")))
            .collect();
        view.insert("parents".to_string(), Value::Array(parents));

        let checklists = self
            .find(Table::Checklists, |checklist| int(checklist, "card_id") == Some(id))
            .into_iter()
            .map(|checklist| self.item_view(Table::Checklists, checklist))
            .collect();
        view.insert("checklists".to_string(), Value::Array(checklists));
        view.insert("files".to_string(), Value::Array(vec![]));
        Value::Object(view)
    }

    /// Card sub-resources as returned to clients; checklists embed their items.
    pub fn item_view(&self, table: Table, record: &Record) -> Value {
        let mut view = record.clone();
        if let (Table::Checklists, Some(id)) = (table, int(record, "id")) {
            view.insert(
                "items".to_string(),
                Value::Array(self.rows(Table::ChecklistItems, "checklist_id", id)),
            );
        }
        Value::Object(view)
    }
}

pub fn int(record: &Record, field: &str) -> Option<i64> {
    record.get(field).and_then(Value::as_i64)
}

pub fn object(value: Value) -> Record {
    match value {
        Value::Object(record) => record,
        _ => Record::new(),
    }
}
