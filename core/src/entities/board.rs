use crate::engine::Params;
use crate::error::ApiError;

use super::{children, create, fetch_many, scoped, with, Card};

entity! {
    /// A kanban board.
    Board => Board {
        id: i64,
        title: String,
        description: String,
        external_id: String,
        created: String,
        updated: String,
    }
}

entity! {
    /// A vertical stage of a board.
    Column => Column {
        id: i64,
        title: String,
        board_id: i64,
        sort_order: f64,
        col_count: i64,
        wip_limit: i64,
    }
}

entity! {
    /// A horizontal swimlane of a board.
    Lane => Lane {
        id: i64,
        title: String,
        board_id: i64,
        sort_order: f64,
        wip_limit: i64,
    }
}

impl Board {
    pub fn columns(&self) -> Vec<Column> {
        children(&self.node, "columns")
    }

    pub fn lanes(&self) -> Vec<Lane> {
        children(&self.node, "lanes")
    }

    pub fn cards(&self) -> Vec<Card> {
        children(&self.node, "cards")
    }

    pub fn update(&mut self, params: Params) -> Result<(), ApiError> {
        self.node.apply_update(params)
    }

    pub fn delete(self) -> Result<(), ApiError> {
        self.node.remove(Params::new())
    }

    pub fn create_column(&self, title: &str, params: Params) -> Result<Column, ApiError> {
        create(&self.node, "columns", with(params, "title", title))
    }

    pub fn create_lane(&self, title: &str, params: Params) -> Result<Lane, ApiError> {
        create(&self.node, "lanes", with(params, "title", title))
    }

    pub fn get_cards(&self, params: Params) -> Result<Vec<Card>, ApiError> {
        fetch_many(&self.node, "/cards", scoped(params, &self.node))
    }

    pub fn create_card(
        &self,
        column_id: i64,
        lane_id: i64,
        title: &str,
        params: Params,
    ) -> Result<Card, ApiError> {
        let params = scoped(params, &self.node);
        let params = with(params, "column_id", column_id);
        let params = with(params, "lane_id", lane_id);
        let params = with(params, "title", title);
        create(&self.node, "/cards", params)
    }
}

impl Column {
    pub fn update(&mut self, params: Params) -> Result<(), ApiError> {
        self.node.apply_update(params)
    }

    pub fn delete(self, params: Params) -> Result<(), ApiError> {
        self.node.remove(params)
    }

    pub fn get_cards(&self, params: Params) -> Result<Vec<Card>, ApiError> {
        fetch_many(&self.node, "/cards", scoped(params, &self.node))
    }

    pub fn create_card(&self, lane_id: i64, title: &str, params: Params) -> Result<Card, ApiError> {
        let params = scoped(params, &self.node);
        let params = with(params, "lane_id", lane_id);
        let params = with(params, "title", title);
        create(&self.node, "/cards", params)
    }
}

impl Lane {
    pub fn update(&mut self, params: Params) -> Result<(), ApiError> {
        self.node.apply_update(params)
    }

    pub fn delete(self, params: Params) -> Result<(), ApiError> {
        self.node.remove(params)
    }

    pub fn get_cards(&self, params: Params) -> Result<Vec<Card>, ApiError> {
        fetch_many(&self.node, "/cards", scoped(params, &self.node))
    }

    pub fn create_card(&self, column_id: i64, title: &str, params: Params) -> Result<Card, ApiError> {
        let params = scoped(params, &self.node);
        let params = with(params, "column_id", column_id);
        let params = with(params, "title", title);
        create(&self.node, "/cards", params)
    }
}
