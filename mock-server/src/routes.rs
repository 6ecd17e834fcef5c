//! Request handlers, one per route.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::store::{int, object, Record, Store, Table};
use crate::{Caller, Db};

pub type Reply = Result<Json<Value>, StatusCode>;

const CONDITION_ARCHIVED: i64 = 2;

/// Query parameters `GET /cards` filters on by exact match.
const CARD_FILTERS: &[&str] = &[
    "space_id", "board_id", "column_id", "lane_id", "condition", "state", "type_id", "owner_id",
];

fn list(values: impl IntoIterator<Item = Value>) -> Json<Value> {
    Json(Value::Array(values.into_iter().collect()))
}

fn require(table: Table, body: &Record) -> Result<(), StatusCode> {
    match table.required().iter().find(|field| !body.contains_key(**field)) {
        Some(field) => {
            tracing::debug!(?table, field, "missing required field");
            Err(StatusCode::BAD_REQUEST)
        }
        None => Ok(()),
    }
}

fn found<T>(value: Option<T>) -> Result<T, StatusCode> {
    value.ok_or(StatusCode::NOT_FOUND)
}

fn matches(value: Option<&Value>, expected: &str) -> bool {
    match value {
        Some(Value::String(s)) => s == expected,
        Some(other) => other.to_string() == expected,
        None => false,
    }
}

pub async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::OK, "<html>maintenance</html>")
}

// --- spaces ---

pub async fn list_spaces(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    list(store.find(Table::Spaces, |_| true).into_iter().map(|space| store.space_view(space)))
}

pub async fn create_space(State(db): State<Db>, Json(body): Json<Record>) -> Reply {
    require(Table::Spaces, &body)?;
    let mut store = db.write().await;
    let space = store.insert(Table::Spaces, body);
    tracing::info!(id = ?space["id"], "space created");
    Ok(Json(store.space_view(&space)))
}

pub async fn get_space(State(db): State<Db>, Path(id): Path<i64>) -> Reply {
    let store = db.read().await;
    let space = found(store.get(Table::Spaces, id))?;
    Ok(Json(store.space_view(space)))
}

pub async fn update_space(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(patch): Json<Record>,
) -> Reply {
    let mut store = db.write().await;
    let space = found(store.merge(Table::Spaces, id, patch))?;
    Ok(Json(store.space_view(&space)))
}

pub async fn list_space_boards(State(db): State<Db>, Path(space_id): Path<i64>) -> Reply {
    let store = db.read().await;
    found(store.get(Table::Spaces, space_id))?;
    let boards = store.find(Table::Boards, |board| int(board, "space_id") == Some(space_id));
    Ok(list(boards.into_iter().map(|board| store.board_view(board))))
}

pub async fn get_space_board(
    State(db): State<Db>,
    Path((space_id, board_id)): Path<(i64, i64)>,
) -> Reply {
    let store = db.read().await;
    let board = found(store.owned(Table::Boards, board_id, "space_id", space_id))?;
    Ok(Json(store.board_view(board)))
}

pub async fn create_board(
    State(db): State<Db>,
    Path(space_id): Path<i64>,
    Json(mut body): Json<Record>,
) -> Reply {
    require(Table::Boards, &body)?;
    let mut store = db.write().await;
    found(store.get(Table::Spaces, space_id))?;
    body.insert("space_id".to_string(), json!(space_id));
    let board = store.insert(Table::Boards, body);
    tracing::info!(id = ?board["id"], space_id, "board created");
    Ok(Json(store.board_view(&board)))
}

pub async fn list_space_users(State(db): State<Db>, Path(space_id): Path<i64>) -> Reply {
    let store = db.read().await;
    found(store.get(Table::Spaces, space_id))?;
    Ok(list(store.find(Table::Users, |_| true).into_iter().cloned().map(Value::Object)))
}

pub async fn get_space_user(
    State(db): State<Db>,
    Path((space_id, user_id)): Path<(i64, i64)>,
) -> Reply {
    let store = db.read().await;
    found(store.get(Table::Spaces, space_id))?;
    let user = found(store.get(Table::Users, user_id))?;
    Ok(Json(Value::Object(user.clone())))
}

// --- boards, columns, lanes ---

pub async fn get_board(State(db): State<Db>, Path(id): Path<i64>) -> Reply {
    let store = db.read().await;
    let board = found(store.get(Table::Boards, id))?;
    Ok(Json(store.board_view(board)))
}

pub async fn update_board(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(patch): Json<Record>,
) -> Reply {
    let mut store = db.write().await;
    let board = found(store.merge(Table::Boards, id, patch))?;
    Ok(Json(store.board_view(&board)))
}

pub async fn delete_board(State(db): State<Db>, Path(id): Path<i64>) -> Reply {
    let mut store = db.write().await;
    let view = store.board_view(found(store.get(Table::Boards, id))?);
    store.remove(Table::Boards, id);
    store.remove_where(Table::Columns, |column| int(column, "board_id") == Some(id));
    store.remove_where(Table::Lanes, |lane| int(lane, "board_id") == Some(id));
    tracing::info!(id, "board deleted");
    Ok(Json(view))
}

pub async fn create_board_part(
    db: Db,
    table: Table,
    board_id: i64,
    mut body: Record,
) -> Reply {
    require(table, &body)?;
    let mut store = db.write().await;
    found(store.get(Table::Boards, board_id))?;
    body.insert("board_id".to_string(), json!(board_id));
    Ok(Json(Value::Object(store.insert(table, body))))
}

pub async fn update_board_part(
    db: Db,
    table: Table,
    (board_id, id): (i64, i64),
    patch: Record,
) -> Reply {
    let mut store = db.write().await;
    found(store.owned(table, id, "board_id", board_id))?;
    let record = found(store.merge(table, id, patch))?;
    Ok(Json(Value::Object(record)))
}

pub async fn delete_board_part(db: Db, table: Table, (board_id, id): (i64, i64)) -> Reply {
    let mut store = db.write().await;
    found(store.owned(table, id, "board_id", board_id))?;
    let record = found(store.remove(table, id))?;
    Ok(Json(Value::Object(record)))
}

// --- cards ---

pub async fn list_cards(
    State(db): State<Db>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let store = db.read().await;
    let text = query.get("query").map(|q| q.to_lowercase());
    let cards = store.find(Table::Cards, |card| {
        let filtered = CARD_FILTERS.iter().all(|name| match query.get(*name) {
            Some(expected) => matches(card.get(*name), expected),
            None => true,
        });
        let searched = match &text {
            Some(text) => card
                .get("title")
                .and_then(Value::as_str)
                .is_some_and(|title| title.to_lowercase().contains(text.as_str())),
            None => true,
        };
        filtered && searched
    });
    list(cards.into_iter().map(|card| store.card_view(card)))
}

#[derive(Deserialize)]
pub struct NewCard {
    pub board_id: i64,
    pub column_id: i64,
    pub lane_id: i64,
    #[serde(flatten)]
    pub rest: Record,
}

pub async fn create_card(
    State(db): State<Db>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<NewCard>,
) -> Reply {
    require(Table::Cards, &input.rest)?;
    let mut store = db.write().await;
    let board = found(store.get(Table::Boards, input.board_id))?;
    let space_id = board.get("space_id").cloned().unwrap_or(Value::Null);
    if store.owned(Table::Columns, input.column_id, "board_id", input.board_id).is_none()
        || store.owned(Table::Lanes, input.lane_id, "board_id", input.board_id).is_none()
    {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut card = Record::new();
    for (key, value) in [
        ("description", json!("")),
        ("asap", json!(false)),
        ("type_id", json!(1)),
        ("state", json!(1)),
        ("size", Value::Null),
    ] {
        card.insert(key.to_string(), value);
    }
    card.extend(input.rest);
    for (key, value) in [
        ("board_id", json!(input.board_id)),
        ("column_id", json!(input.column_id)),
        ("lane_id", json!(input.lane_id)),
        ("space_id", space_id),
        ("owner_id", json!(caller.user_id)),
        ("condition", json!(1)),
        ("blocked", json!(false)),
        ("archived", json!(false)),
    ] {
        card.insert(key.to_string(), value);
    }

    let card = store.insert(Table::Cards, card);
    tracing::info!(id = ?card["id"], board_id = input.board_id, "card created");
    Ok(Json(store.card_view(&card)))
}

pub async fn get_card(State(db): State<Db>, Path(id): Path<i64>) -> Reply {
    let store = db.read().await;
    let card = found(store.get(Table::Cards, id))?;
    Ok(Json(store.card_view(card)))
}

pub async fn update_card(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(mut patch): Json<Record>,
) -> Reply {
    let mut store = db.write().await;
    found(store.get(Table::Cards, id))?;
    if let Some(condition) = patch.get("condition").and_then(Value::as_i64) {
        patch.insert("archived".to_string(), json!(condition == CONDITION_ARCHIVED));
    }
    if patch.get("blocked") == Some(&json!(false)) {
        let open: Vec<i64> = store
            .find(Table::Blockers, |blocker| int(blocker, "card_id") == Some(id))
            .into_iter()
            .filter_map(|blocker| int(blocker, "id"))
            .collect();
        for blocker in open {
            let mut released = Record::new();
            released.insert("released".to_string(), json!(true));
            store.merge(Table::Blockers, blocker, released);
        }
    }
    let card = found(store.merge(Table::Cards, id, patch))?;
    Ok(Json(store.card_view(&card)))
}

// --- card tags and children ---

#[derive(Deserialize)]
pub struct NewTag {
    pub name: String,
}

/// Attach the company tag called `name`, creating it on first use.
pub async fn add_card_tag(
    State(db): State<Db>,
    Path(card_id): Path<i64>,
    Json(input): Json<NewTag>,
) -> Reply {
    let mut store = db.write().await;
    found(store.get(Table::Cards, card_id))?;
    let existing = store
        .find(Table::Tags, |tag| tag.get("name").and_then(Value::as_str) == Some(input.name.as_str()))
        .first()
        .map(|tag| (*tag).clone());
    let tag = match existing {
        Some(tag) => tag,
        None => store.insert(Table::Tags, object(json!({"name": input.name, "color": 1}))),
    };
    let tag_id = int(&tag, "id");
    let linked = !store
        .find(Table::CardTags, |link| int(link, "card_id") == Some(card_id) && int(link, "tag_id") == tag_id)
        .is_empty();
    if !linked {
        store.insert(Table::CardTags, object(json!({"card_id": card_id, "tag_id": tag_id})));
    }
    Ok(Json(Value::Object(tag)))
}

pub async fn remove_card_tag(
    State(db): State<Db>,
    Path((card_id, tag_id)): Path<(i64, i64)>,
) -> Reply {
    let mut store = db.write().await;
    let is_link = |link: &Record| int(link, "card_id") == Some(card_id) && int(link, "tag_id") == Some(tag_id);
    if store.find(Table::CardTags, is_link).is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }
    store.remove_where(Table::CardTags, is_link);
    let tag = found(store.get(Table::Tags, tag_id))?;
    Ok(Json(Value::Object(tag.clone())))
}

#[derive(Deserialize)]
pub struct NewChild {
    pub card_id: i64,
}

pub async fn add_card_child(
    State(db): State<Db>,
    Path(parent_id): Path<i64>,
    Json(input): Json<NewChild>,
) -> Reply {
    let mut store = db.write().await;
    found(store.get(Table::Cards, parent_id))?;
    let child = found(store.get(Table::Cards, input.card_id))?;
    let title = child.get("title").cloned().unwrap_or(Value::Null);
    if input.card_id == parent_id {
        return Err(StatusCode::BAD_REQUEST);
    }
    store.insert(
        Table::CardChildren,
        object(json!({"parent_id": parent_id, "card_id": input.card_id})),
    );
    Ok(Json(json!({"id": input.card_id, "card_id": input.card_id, "title": title})))
}

pub async fn remove_card_child(
    State(db): State<Db>,
    Path((parent_id, child_id)): Path<(i64, i64)>,
) -> Reply {
    let mut store = db.write().await;
    let is_link =
        |link: &Record| int(link, "parent_id") == Some(parent_id) && int(link, "card_id") == Some(child_id);
    if store.find(Table::CardChildren, is_link).is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }
    store.remove_where(Table::CardChildren, is_link);
    Ok(Json(json!({"id": child_id, "card_id": child_id})))
}

// --- card sub-resources (comments, links, blockers, time logs, ...) ---

pub async fn list_card_items(db: Db, table: Table, card_id: i64) -> Reply {
    let store = db.read().await;
    found(store.get(Table::Cards, card_id))?;
    let items = store.find(table, |item| int(item, "card_id") == Some(card_id));
    Ok(list(items.into_iter().map(|item| store.item_view(table, item))))
}

pub async fn create_card_item(
    db: Db,
    caller: Caller,
    table: Table,
    card_id: i64,
    mut body: Record,
) -> Reply {
    require(table, &body)?;
    let mut store = db.write().await;
    found(store.get(Table::Cards, card_id))?;
    body.insert("card_id".to_string(), json!(card_id));
    match table {
        Table::Comments => {
            body.insert("author_id".to_string(), json!(caller.user_id));
        }
        Table::TimeLogs => {
            body.insert("user_id".to_string(), json!(caller.user_id));
        }
        Table::DefinitionOfDone => {
            body.entry("checked").or_insert(json!(false));
        }
        Table::Blockers => {
            body.insert("released".to_string(), json!(false));
            let mut blocked = Record::new();
            blocked.insert("blocked".to_string(), json!(true));
            store.merge(Table::Cards, card_id, blocked);
        }
        _ => {}
    }
    let item = store.insert(table, body);
    Ok(Json(store.item_view(table, &item)))
}

pub async fn update_card_item(
    db: Db,
    table: Table,
    (card_id, id): (i64, i64),
    patch: Record,
) -> Reply {
    let mut store = db.write().await;
    found(store.owned(table, id, "card_id", card_id))?;
    let item = found(store.merge(table, id, patch))?;
    Ok(Json(store.item_view(table, &item)))
}

pub async fn delete_card_item(db: Db, table: Table, (card_id, id): (i64, i64)) -> Reply {
    let mut store = db.write().await;
    let view = store.item_view(table, found(store.owned(table, id, "card_id", card_id))?);
    store.remove(table, id);
    if table == Table::Checklists {
        store.remove_where(Table::ChecklistItems, |item| int(item, "checklist_id") == Some(id));
    }
    Ok(Json(view))
}

// --- checklist items ---

fn checklist_of(store: &Store, card_id: i64, checklist_id: i64) -> Result<(), StatusCode> {
    found(store.owned(Table::Checklists, checklist_id, "card_id", card_id)).map(|_| ())
}

pub async fn create_checklist_item(
    State(db): State<Db>,
    Path((card_id, checklist_id)): Path<(i64, i64)>,
    Json(mut body): Json<Record>,
) -> Reply {
    require(Table::ChecklistItems, &body)?;
    let mut store = db.write().await;
    checklist_of(&store, card_id, checklist_id)?;
    body.insert("checklist_id".to_string(), json!(checklist_id));
    body.entry("checked").or_insert(json!(false));
    Ok(Json(Value::Object(store.insert(Table::ChecklistItems, body))))
}

pub async fn update_checklist_item(
    State(db): State<Db>,
    Path((card_id, checklist_id, id)): Path<(i64, i64, i64)>,
    Json(patch): Json<Record>,
) -> Reply {
    let mut store = db.write().await;
    checklist_of(&store, card_id, checklist_id)?;
    found(store.owned(Table::ChecklistItems, id, "checklist_id", checklist_id))?;
    let item = found(store.merge(Table::ChecklistItems, id, patch))?;
    Ok(Json(Value::Object(item)))
}

pub async fn delete_checklist_item(
    State(db): State<Db>,
    Path((card_id, checklist_id, id)): Path<(i64, i64, i64)>,
) -> Reply {
    let mut store = db.write().await;
    checklist_of(&store, card_id, checklist_id)?;
    found(store.owned(Table::ChecklistItems, id, "checklist_id", checklist_id))?;
    let item = found(store.remove(Table::ChecklistItems, id))?;
    Ok(Json(Value::Object(item)))
}

// --- company-wide collections ---

pub async fn list_users(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    list(store.find(Table::Users, |_| true).into_iter().cloned().map(Value::Object))
}

pub async fn get_user(State(db): State<Db>, Path(id): Path<i64>) -> Reply {
    let store = db.read().await;
    let user = found(store.get(Table::Users, id))?;
    Ok(Json(Value::Object(user.clone())))
}

pub async fn list_tags(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    list(store.find(Table::Tags, |_| true).into_iter().cloned().map(Value::Object))
}

pub async fn list_card_types(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    list(store.find(Table::CardTypes, |_| true).into_iter().cloned().map(Value::Object))
}

pub async fn create_card_type(State(db): State<Db>, Json(mut body): Json<Record>) -> Reply {
    require(Table::CardTypes, &body)?;
    body.entry("archived").or_insert(json!(false));
    let mut store = db.write().await;
    Ok(Json(Value::Object(store.insert(Table::CardTypes, body))))
}

pub async fn update_card_type(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(patch): Json<Record>,
) -> Reply {
    let mut store = db.write().await;
    let card_type = found(store.merge(Table::CardTypes, id, patch))?;
    Ok(Json(Value::Object(card_type)))
}

pub async fn delete_card_type(State(db): State<Db>, Path(id): Path<i64>) -> Reply {
    let mut store = db.write().await;
    let card_type = found(store.remove(Table::CardTypes, id))?;
    Ok(Json(Value::Object(card_type)))
}
