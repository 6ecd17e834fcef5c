use crate::engine::Params;
use crate::error::ApiError;
use crate::node::Location;

use super::{
    child, children, create, fetch_many, with, Board, CardBlocker, CardChild,
    CardDefinitionOfDone, CardFile, CardTimeLog, CardType, Checklist, Column, Comment,
    ExternalLink, Lane, Tag, User,
};

/// `condition` value of a card on the board.
const CONDITION_ACTIVE: i64 = 1;
/// `condition` value of an archived card.
const CONDITION_ARCHIVED: i64 = 2;

entity! {
    /// A unit of work placed on a board, in a column and a lane.
    Card => Card {
        id: i64,
        title: String,
        description: String,
        asap: bool,
        blocked: bool,
        condition: i64,
        state: i64,
        size: f64,
        sort_order: f64,
        due_date: String,
        board_id: i64,
        column_id: i64,
        lane_id: i64,
        owner_id: i64,
        type_id: i64,
        archived: bool,
        created: String,
        updated: String,
    }
}

impl Card {
    pub fn card_type(&self) -> Option<CardType> {
        child(&self.node, "type")
    }

    pub fn tags(&self) -> Vec<Tag> {
        children(&self.node, "tags")
    }

    pub fn members(&self) -> Vec<User> {
        children(&self.node, "members")
    }

    pub fn owner(&self) -> Option<User> {
        child(&self.node, "owner")
    }

    pub fn parents(&self) -> Vec<Card> {
        children(&self.node, "parents")
    }

    pub fn children(&self) -> Vec<Card> {
        children(&self.node, "children")
    }

    pub fn checklists(&self) -> Vec<Checklist> {
        children(&self.node, "checklists")
    }

    pub fn files(&self) -> Vec<CardFile> {
        children(&self.node, "files")
    }

    /// The board → column → lane chain the card was delivered with.
    pub fn location(&self) -> Option<&Location> {
        self.node.location()
    }

    pub fn board(&self) -> Option<Board> {
        self.location().map(|location| Board::from(location.board().clone()))
    }

    pub fn column(&self) -> Option<Column> {
        self.location()
            .and_then(Location::column)
            .map(|column| Column::from(column.clone()))
    }

    pub fn lane(&self) -> Option<Lane> {
        self.location()
            .and_then(Location::lane)
            .map(|lane| Lane::from(lane.clone()))
    }

    pub fn update(&mut self, params: Params) -> Result<(), ApiError> {
        self.node.apply_update(params)
    }

    pub fn archive(&mut self) -> Result<(), ApiError> {
        self.update(with(Params::new(), "condition", CONDITION_ARCHIVED))
    }

    pub fn unarchive(&mut self) -> Result<(), ApiError> {
        self.update(with(Params::new(), "condition", CONDITION_ACTIVE))
    }

    /// Create a blocker; `params` carries `reason` and/or `blocker_card_id`.
    pub fn block(&self, params: Params) -> Result<CardBlocker, ApiError> {
        create(&self.node, "blockers", params)
    }

    pub fn unblock(&mut self) -> Result<(), ApiError> {
        self.update(with(Params::new(), "blocked", false))
    }

    pub fn add_tag(&self, name: &str) -> Result<Tag, ApiError> {
        create(&self.node, "tags", with(Params::new(), "name", name))
    }

    pub fn add_comment(&self, text: &str, params: Params) -> Result<Comment, ApiError> {
        create(&self.node, "comments", with(params, "text", text))
    }

    pub fn add_external_link(&self, url: &str, params: Params) -> Result<ExternalLink, ApiError> {
        create(&self.node, "external-links", with(params, "url", url))
    }

    /// Make card `card_id` a child of this card.
    pub fn add_child(&self, card_id: i64) -> Result<CardChild, ApiError> {
        create(&self.node, "children", with(Params::new(), "card_id", card_id))
    }

    pub fn get_time_logs(&self) -> Result<Vec<CardTimeLog>, ApiError> {
        fetch_many(&self.node, "time-logs", Params::new())
    }

    /// Log `time_spent` minutes for `for_date` (`YYYY-MM-DD`); role `-1` is
    /// the predefined employee role.
    pub fn add_time_log(
        &self,
        role_id: i64,
        time_spent: i64,
        for_date: &str,
        params: Params,
    ) -> Result<CardTimeLog, ApiError> {
        let params = with(params, "role_id", role_id);
        let params = with(params, "time_spent", time_spent);
        let params = with(params, "for_date", for_date);
        create(&self.node, "time-logs", params)
    }

    pub fn add_checklist(&self, name: &str, params: Params) -> Result<Checklist, ApiError> {
        create(&self.node, "checklists", with(params, "name", name))
    }

    pub fn add_definition_of_done(
        &self,
        text: &str,
        params: Params,
    ) -> Result<CardDefinitionOfDone, ApiError> {
        create(&self.node, "definition-of-done", with(params, "text", text))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::http::HttpMethod;
    use crate::node::Resource;
    use crate::session::Session;
    use crate::testing::ScriptedTransport;
    use crate::SessionConfig;

    fn card(transport: &ScriptedTransport, payload: Value) -> Card {
        transport.push_json(payload);
        let session = Session::with_transport(SessionConfig::new("team.kaiten.io", "u", "p"), transport.clone());
        session.get_card(42).unwrap()
    }

    fn body(transport: &ScriptedTransport) -> Value {
        serde_json::from_str(transport.last_request().body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn full_payload_is_promoted() {
        let transport = ScriptedTransport::new();
        let card = card(
            &transport,
            json!({
                "id": 42,
                "title": "Ship",
                "type": {"id": 1, "letter": "B", "name": "Bug"},
                "owner": {"id": 7, "full_name": "Alice"},
                "members": [{"id": 7}, {"id": 8}],
                "tags": [{"id": 10, "name": "urgent"}],
                "children": [{"id": 43}],
                "files": [{"id": 5, "name": "log.txt", "author": {"id": 8}}],
                "board": {"id": 1},
                "column": {"id": 2},
                "lane": {"id": 3},
                "custom_flag": true,
            }),
        );

        assert_eq!(transport.last_request().path, "/cards/42");
        assert_eq!(card.title().as_deref(), Some("Ship"));
        assert_eq!(card.card_type().unwrap().letter().as_deref(), Some("B"));
        assert_eq!(card.owner().unwrap().full_name().as_deref(), Some("Alice"));
        assert_eq!(card.members().len(), 2);
        assert_eq!(card.tags()[0].name().as_deref(), Some("urgent"));
        assert_eq!(card.children()[0].id(), Some(43));
        assert!(card.parents().is_empty());
        assert_eq!(card.files()[0].author().unwrap().id(), Some(8));
        assert_eq!(card.board().unwrap().id(), Some(1));
        assert_eq!(card.column().unwrap().id(), Some(2));
        assert_eq!(card.lane().unwrap().id(), Some(3));
        assert_eq!(card.location().unwrap().depth(), 3);

        let mut attributes: Vec<_> = card.node().attributes().keys().cloned().collect();
        attributes.sort();
        assert_eq!(attributes, vec!["custom_flag", "id", "title"]);
    }

    #[test]
    fn location_lane_is_addressed_below_board() {
        let transport = ScriptedTransport::new();
        let card = card(
            &transport,
            json!({"id": 42, "board": {"id": 1}, "column": {"id": 2}, "lane": {"id": 3}}),
        );
        let mut lane = card.lane().unwrap();

        transport.push_json(json!({"id": 3, "title": "Renamed"}));
        lane.update(with(Params::new(), "title", "Renamed")).unwrap();

        assert_eq!(transport.last_request().method, HttpMethod::Patch);
        assert_eq!(transport.last_request().path, "/boards/1/lanes/3");
        assert_eq!(lane.title().as_deref(), Some("Renamed"));
    }

    #[test]
    fn location_lane_create_card_keeps_explicit_column() {
        let transport = ScriptedTransport::new();
        let card = card(
            &transport,
            json!({"id": 42, "board": {"id": 1}, "column": {"id": 2}, "lane": {"id": 3}}),
        );
        transport.push_json(json!({"id": 50}));

        card.lane()
            .unwrap()
            .create_card(7, "Other column", Params::new())
            .unwrap();

        let sent = body(&transport);
        assert_eq!(sent["column_id"], json!(7));
        assert_eq!(sent["board_id"], json!(1));
        assert_eq!(sent["lane_id"], json!(3));
    }

    #[test]
    fn archive_patches_condition() {
        let transport = ScriptedTransport::new();
        let mut card = card(&transport, json!({"id": 42, "condition": 1}));
        transport.push_json(json!({"id": 42, "condition": 2}));

        card.archive().unwrap();

        assert_eq!(transport.last_request().method, HttpMethod::Patch);
        assert_eq!(body(&transport), json!({"condition": 2}));
        assert_eq!(card.condition(), Some(2));
    }

    #[test]
    fn unblock_patches_blocked_flag() {
        let transport = ScriptedTransport::new();
        let mut card = card(&transport, json!({"id": 42, "blocked": true}));
        transport.push_json(json!({"id": 42, "blocked": false}));

        card.unblock().unwrap();

        assert_eq!(body(&transport), json!({"blocked": false}));
        assert_eq!(card.blocked(), Some(false));
    }

    #[test]
    fn add_comment_posts_to_card_comments() {
        let transport = ScriptedTransport::new();
        let card = card(&transport, json!({"id": 42}));
        transport.push_json(json!({"id": 3, "text": "LGTM"}));

        let comment = card.add_comment("LGTM", Params::new()).unwrap();

        assert_eq!(transport.last_request().url, "https://team.kaiten.io/api/v1/cards/42/comments");
        assert_eq!(body(&transport), json!({"text": "LGTM"}));
        assert_eq!(Resource::resolve_path(comment.node()).unwrap(), "/cards/42/comments/3");
    }

    #[test]
    fn add_child_posts_card_id_to_children() {
        let transport = ScriptedTransport::new();
        let card = card(&transport, json!({"id": 42}));
        transport.push_json(json!({"id": 1, "card_id": 43}));

        let child = card.add_child(43).unwrap();

        assert_eq!(transport.last_request().path, "/cards/42/children");
        assert_eq!(body(&transport), json!({"card_id": 43}));
        assert_eq!(child.card_id(), Some(43));
    }

    #[test]
    fn add_time_log_sends_required_fields() {
        let transport = ScriptedTransport::new();
        let card = card(&transport, json!({"id": 42}));
        transport.push_json(json!({"id": 6, "time_spent": 30}));

        card.add_time_log(-1, 30, "2025-12-24", with(Params::new(), "comment", "review"))
            .unwrap();

        assert_eq!(transport.last_request().path, "/cards/42/time-logs");
        assert_eq!(
            body(&transport),
            json!({"role_id": -1, "time_spent": 30, "for_date": "2025-12-24", "comment": "review"})
        );
    }

    #[test]
    fn get_time_logs_lists_card_logs() {
        let transport = ScriptedTransport::new();
        let card = card(&transport, json!({"id": 42}));
        transport.push_json(json!([{"id": 1}, {"id": 2}]));

        let logs = card.get_time_logs().unwrap();

        assert_eq!(transport.last_request().method, HttpMethod::Get);
        assert_eq!(transport.last_request().path, "/cards/42/time-logs");
        assert_eq!(logs.len(), 2);
    }

    #[test]
    fn block_and_definition_of_done_post_below_card() {
        let transport = ScriptedTransport::new();
        let card = card(&transport, json!({"id": 42}));

        transport.push_json(json!({"id": 4, "reason": "waiting"}));
        let blocker = card.block(with(Params::new(), "reason", "waiting")).unwrap();
        assert_eq!(transport.last_request().path, "/cards/42/blockers");
        assert_eq!(blocker.reason().as_deref(), Some("waiting"));

        transport.push_json(json!({"id": 5, "text": "tests green"}));
        card.add_definition_of_done("tests green", Params::new()).unwrap();
        assert_eq!(transport.last_request().path, "/cards/42/definition-of-done");
    }

    #[test]
    fn external_link_and_checklist_post_below_card() {
        let transport = ScriptedTransport::new();
        let card = card(&transport, json!({"id": 42}));

        transport.push_json(json!({"id": 1, "url": "https://example.com"}));
        card.add_external_link("https://example.com", with(Params::new(), "description", "docs"))
            .unwrap();
        assert_eq!(transport.last_request().path, "/cards/42/external-links");
        assert_eq!(body(&transport), json!({"url": "https://example.com", "description": "docs"}));

        transport.push_json(json!({"id": 2, "name": "Release", "items": []}));
        let checklist = card.add_checklist("Release", Params::new()).unwrap();
        assert_eq!(transport.last_request().path, "/cards/42/checklists");
        assert!(checklist.items().is_empty());
    }
}
