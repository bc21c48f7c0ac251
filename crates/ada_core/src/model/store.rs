//! Points store catalog and exchange log.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type ItemId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreItem {
    pub id: ItemId,
    pub name: String,
    pub info: Option<String>,
    /// Cost in points.
    pub price: i64,
    /// Remaining units. `None` means the item is not stock-tracked.
    pub stock: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStoreItem {
    pub name: String,
    pub info: Option<String>,
    pub price: i64,
    pub stock: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub id: i64,
    pub user_id: UserId,
    pub item_id: Option<ItemId>,
    pub item_name: String,
    pub points: i64,
    pub exchanged_at: i64,
}
