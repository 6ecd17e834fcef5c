use crate::engine::Params;
use crate::error::ApiError;

use super::{children, create, fetch_many, fetch_one, scoped, with, Board, Card, User};

entity! {
    /// A workspace grouping boards and their members.
    Space => Space {
        id: i64,
        uid: String,
        title: String,
        archived: bool,
        created: String,
        updated: String,
    }
}

impl Space {
    /// Boards embedded in the space payload.
    pub fn boards(&self) -> Vec<Board> {
        children(&self.node, "boards")
    }

    pub fn update(&mut self, params: Params) -> Result<(), ApiError> {
        self.node.apply_update(params)
    }

    pub fn get_boards(&self) -> Result<Vec<Board>, ApiError> {
        fetch_many(&self.node, "boards", Params::new())
    }

    pub fn get_board(&self, id: i64) -> Result<Board, ApiError> {
        fetch_one(&self.node, "boards", id, Params::new())
    }

    pub fn create_board(&self, title: &str, params: Params) -> Result<Board, ApiError> {
        create(&self.node, "boards", with(params, "title", title))
    }

    /// Cards of this space matching `params`.
    pub fn get_cards(&self, params: Params) -> Result<Vec<Card>, ApiError> {
        fetch_many(&self.node, "/cards", scoped(params, &self.node))
    }

    pub fn get_users(&self) -> Result<Vec<User>, ApiError> {
        fetch_many(&self.node, "users", Params::new())
    }

    pub fn get_user(&self, id: i64) -> Result<User, ApiError> {
        fetch_one(&self.node, "users", id, Params::new())
    }

    pub fn create_card(
        &self,
        board_id: i64,
        column_id: i64,
        lane_id: i64,
        title: &str,
        params: Params,
    ) -> Result<Card, ApiError> {
        let params = scoped(params, &self.node);
        let params = with(params, "board_id", board_id);
        let params = with(params, "column_id", column_id);
        let params = with(params, "lane_id", lane_id);
        let params = with(params, "title", title);
        create(&self.node, "/cards", params)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::http::HttpMethod;
    use crate::session::Session;
    use crate::testing::ScriptedTransport;
    use crate::SessionConfig;

    fn space(transport: &ScriptedTransport) -> super::Space {
        transport.push_json(json!({"id": 5, "title": "Ops", "boards": [{"id": 8, "title": "Infra"}]}));
        let session = Session::with_transport(SessionConfig::new("team.kaiten.io", "u", "p"), transport.clone());
        session.get_space(5).unwrap()
    }

    #[test]
    fn embedded_boards_are_promoted() {
        let transport = ScriptedTransport::new();
        let space = space(&transport);
        assert_eq!(space.title().as_deref(), Some("Ops"));
        let boards = space.boards();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].title().as_deref(), Some("Infra"));
        assert!(space.node().get("boards").is_none());
    }

    #[test]
    fn create_board_posts_below_space() {
        let transport = ScriptedTransport::new();
        let space = space(&transport);
        transport.push_json(json!({"id": 9, "title": "New"}));

        let board = space.create_board("New", Default::default()).unwrap();

        let sent = transport.last_request();
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.path, "/spaces/5/boards");
        let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"title": "New"}));
        assert_eq!(board.id(), Some(9));
    }

    #[test]
    fn get_cards_filters_by_space() {
        let transport = ScriptedTransport::new();
        let space = space(&transport);
        transport.push_json(json!([{"id": 1}, {"id": 2}]));

        let mut params = crate::Params::new();
        params.insert("space_id".to_string(), json!(999));
        params.insert("state".to_string(), json!(2));
        let cards = space.get_cards(params).unwrap();

        assert_eq!(cards.len(), 2);
        assert_eq!(transport.last_request().path, "/cards?space_id=5&state=2");
    }

    #[test]
    fn create_card_sends_full_location() {
        let transport = ScriptedTransport::new();
        let space = space(&transport);
        transport.push_json(json!({"id": 77, "title": "Fix"}));

        space.create_card(8, 2, 3, "Fix", Default::default()).unwrap();

        let sent = transport.last_request();
        assert_eq!(sent.path, "/cards");
        let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"space_id": 5, "board_id": 8, "column_id": 2, "lane_id": 3, "title": "Fix"})
        );
    }
}
