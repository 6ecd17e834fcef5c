//! In-memory stand-in for the Kaiten REST API, used by the client's
//! integration tests.
//!
//! # Overview
//! Everything lives under `/api/v1` behind HTTP Basic auth. `admin:secret`
//! may read and write; `viewer:viewer` may only read (writes get 403); any
//! other credentials get 401. Successful calls answer 200 with JSON, and
//! DELETE returns the removed record. `GET /api/v1/broken` answers 200 with
//! a body that is not JSON.

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::{net::TcpListener, sync::RwLock};

pub mod routes;
pub mod store;

use routes::*;
use store::{Account, Record, Store, Table, ACCOUNTS};

pub type Db = Arc<RwLock<Store>>;

/// The authenticated account, available to handlers as an extension.
#[derive(Clone, Copy, Debug)]
pub struct Caller {
    pub user_id: i64,
}

/// A fresh router over a seeded store.
pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(Store::seeded())))
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .nest("/api/v1", api())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn api() -> Router<Db> {
    let mut router = Router::new()
        .route("/broken", get(broken))
        .route("/spaces", get(list_spaces).post(create_space))
        .route("/spaces/{id}", get(get_space).patch(update_space))
        .route("/spaces/{id}/boards", get(list_space_boards).post(create_board))
        .route("/spaces/{id}/boards/{board_id}", get(get_space_board))
        .route("/spaces/{id}/users", get(list_space_users))
        .route("/spaces/{id}/users/{user_id}", get(get_space_user))
        .route("/boards/{id}", get(get_board).patch(update_board).delete(delete_board))
        .route("/cards", get(list_cards).post(create_card))
        .route("/cards/{id}", get(get_card).patch(update_card))
        .route("/cards/{id}/tags", post(add_card_tag))
        .route("/cards/{id}/tags/{tag_id}", axum::routing::delete(remove_card_tag))
        .route("/cards/{id}/children", post(add_card_child))
        .route("/cards/{id}/children/{child_id}", axum::routing::delete(remove_card_child))
        .route(
            "/cards/{id}/checklists/{item_id}/items",
            post(create_checklist_item),
        )
        .route(
            "/cards/{id}/checklists/{item_id}/items/{entry_id}",
            patch(update_checklist_item).delete(delete_checklist_item),
        )
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/tags", get(list_tags))
        .route("/card-types", get(list_card_types).post(create_card_type))
        .route("/card-types/{id}", patch(update_card_type).delete(delete_card_type));

    for (segment, table) in [("columns", Table::Columns), ("lanes", Table::Lanes)] {
        router = router
            .route(
                &format!("/boards/{{id}}/{segment}"),
                post(move |State(db): State<Db>, Path(board_id): Path<i64>, Json(body): Json<Record>| {
                    create_board_part(db, table, board_id, body)
                }),
            )
            .route(
                &format!("/boards/{{id}}/{segment}/{{part_id}}"),
                patch(
                    move |State(db): State<Db>, Path(ids): Path<(i64, i64)>, Json(body): Json<Record>| {
                        update_board_part(db, table, ids, body)
                    },
                )
                .delete(move |State(db): State<Db>, Path(ids): Path<(i64, i64)>| {
                    delete_board_part(db, table, ids)
                }),
            );
    }

    for (segment, table) in [
        ("comments", Table::Comments),
        ("external-links", Table::ExternalLinks),
        ("blockers", Table::Blockers),
        ("time-logs", Table::TimeLogs),
        ("definition-of-done", Table::DefinitionOfDone),
        ("checklists", Table::Checklists),
    ] {
        router = router
            .route(
                &format!("/cards/{{id}}/{segment}"),
                get(move |State(db): State<Db>, Path(card_id): Path<i64>| {
                    list_card_items(db, table, card_id)
                })
                .post(
                    move |State(db): State<Db>,
                          Extension(caller): Extension<Caller>,
                          Path(card_id): Path<i64>,
                          Json(body): Json<Record>| {
                        create_card_item(db, caller, table, card_id, body)
                    },
                ),
            )
            .route(
                &format!("/cards/{{id}}/{segment}/{{item_id}}"),
                patch(
                    move |State(db): State<Db>, Path(ids): Path<(i64, i64)>, Json(body): Json<Record>| {
                        update_card_item(db, table, ids, body)
                    },
                )
                .delete(move |State(db): State<Db>, Path(ids): Path<(i64, i64)>| {
                    delete_card_item(db, table, ids)
                }),
            );
    }

    router.route_layer(middleware::from_fn(authenticate))
}

fn account_for(header: &str) -> Option<&'static Account> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    ACCOUNTS
        .iter()
        .find(|account| account.username == username && account.password == password)
}

async fn authenticate(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let account = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(account_for)
        .ok_or_else(|| {
            tracing::debug!(path = %request.uri().path(), "rejected credentials");
            StatusCode::UNAUTHORIZED
        })?;

    if !account.can_write && request.method() != Method::GET {
        tracing::debug!(username = account.username, method = %request.method(), "write denied");
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(Caller {
        user_id: account.user_id,
    });
    Ok(next.run(request).await)
}
