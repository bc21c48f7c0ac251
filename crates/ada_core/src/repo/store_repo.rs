//! Points-store catalog and exchange log persistence.
//!
//! # Invariants
//! - Tracked stock never goes below zero.
//! - Exchange rows keep the item name and price at exchange time, so they
//!   survive catalog edits and deletions.

use crate::model::page::{Page, PageRequest};
use crate::model::store::{Exchange, ItemId, NewStoreItem, StoreItem};
use crate::model::user::UserId;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait StoreRepository {
    fn create_item(&self, item: &NewStoreItem) -> RepoResult<StoreItem>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<StoreItem>>;
    /// Whole catalog ordered by price then id.
    fn list_items(&self) -> RepoResult<Vec<StoreItem>>;
    fn count_items(&self) -> RepoResult<i64>;
    /// Takes one unit from a stock-tracked item.
    ///
    /// Returns `false` when tracked stock is already zero. Untracked items
    /// always succeed.
    fn take_one(&self, id: ItemId) -> RepoResult<bool>;
    fn record_exchange(
        &self,
        user_id: UserId,
        item: &StoreItem,
        now_ms: i64,
    ) -> RepoResult<Exchange>;
    /// Exchange history of `user_id`, newest first.
    fn list_exchanges(&self, user_id: UserId, page: PageRequest) -> RepoResult<Page<Exchange>>;
}

pub struct SqliteStoreRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStoreRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StoreRepository for SqliteStoreRepository<'_> {
    fn create_item(&self, item: &NewStoreItem) -> RepoResult<StoreItem> {
        self.conn.execute(
            "INSERT INTO store_items (name, info, price, stock, image)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                item.name.as_str(),
                item.info.as_deref(),
                item.price,
                item.stock,
                item.image.as_deref(),
            ],
        )?;
        Ok(StoreItem {
            id: self.conn.last_insert_rowid(),
            name: item.name.clone(),
            info: item.info.clone(),
            price: item.price,
            stock: item.stock,
            image: item.image.clone(),
        })
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<StoreItem>> {
        let item = self
            .conn
            .query_row(
                "SELECT id, name, info, price, stock, image FROM store_items WHERE id = ?1;",
                [id],
                parse_item_row,
            )
            .optional()?;
        Ok(item)
    }

    fn list_items(&self) -> RepoResult<Vec<StoreItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, info, price, stock, image
             FROM store_items
             ORDER BY price ASC, id ASC;",
        )?;
        let items = stmt
            .query_map([], parse_item_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn count_items(&self) -> RepoResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM store_items;", [], |row| row.get(0))?)
    }

    fn take_one(&self, id: ItemId) -> RepoResult<bool> {
        let stock: Option<Option<i64>> = self
            .conn
            .query_row("SELECT stock FROM store_items WHERE id = ?1;", [id], |row| {
                row.get(0)
            })
            .optional()?;
        match stock {
            None => Err(RepoError::NotFound {
                entity: "store item",
                id,
            }),
            Some(None) => Ok(true),
            Some(Some(_)) => {
                let changed = self.conn.execute(
                    "UPDATE store_items SET stock = stock - 1 WHERE id = ?1 AND stock > 0;",
                    [id],
                )?;
                Ok(changed > 0)
            }
        }
    }

    fn record_exchange(
        &self,
        user_id: UserId,
        item: &StoreItem,
        now_ms: i64,
    ) -> RepoResult<Exchange> {
        self.conn.execute(
            "INSERT INTO exchanges (user_id, item_id, item_name, points, exchanged_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![user_id, item.id, item.name.as_str(), item.price, now_ms],
        )?;
        Ok(Exchange {
            id: self.conn.last_insert_rowid(),
            user_id,
            item_id: Some(item.id),
            item_name: item.name.clone(),
            points: item.price,
            exchanged_at: now_ms,
        })
    }

    fn list_exchanges(&self, user_id: UserId, page: PageRequest) -> RepoResult<Page<Exchange>> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM exchanges WHERE user_id = ?1;",
            [user_id],
            |row| row.get(0),
        )?;
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, item_id, item_name, points, exchanged_at
             FROM exchanges
             WHERE user_id = ?1
             ORDER BY exchanged_at DESC, id DESC
             LIMIT ?2 OFFSET ?3;",
        )?;
        let records = stmt
            .query_map(params![user_id, page.limit(), page.offset()], |row| {
                Ok(Exchange {
                    id: row.get("id")?,
                    user_id: row.get("user_id")?,
                    item_id: row.get("item_id")?,
                    item_name: row.get("item_name")?,
                    points: row.get("points")?,
                    exchanged_at: row.get("exchanged_at")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(records, total, page))
    }
}

fn parse_item_row(row: &Row<'_>) -> rusqlite::Result<StoreItem> {
    Ok(StoreItem {
        id: row.get("id")?,
        name: row.get("name")?,
        info: row.get("info")?,
        price: row.get("price")?,
        stock: row.get("stock")?,
        image: row.get("image")?,
    })
}
