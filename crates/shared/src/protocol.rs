use serde::{Deserialize, Serialize};

use crate::domain::LessonId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "lessonId")]
    pub lesson_id: LessonId,
    pub qty: u32,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub name: String,
    pub phone: String,
    pub items: Vec<OrderItem>,
}

/// Body of `PUT /lessons/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceUpdate {
    pub space: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}
