//! Points-store use-case service.
//!
//! # Responsibility
//! - Expose the catalog to volunteers.
//! - Turn points into exchanges atomically.
//!
//! # Invariants
//! - An exchange either debits points, takes stock and logs the exchange,
//!   or changes nothing.
//! - Balances never go negative.

use crate::model::page::{Page, PageRequest};
use crate::model::store::{Exchange, ItemId, NewStoreItem, StoreItem};
use crate::model::user::{User, UserId};
use crate::model::validation::{require_text, ValidationError};
use crate::repo::store_repo::{SqliteStoreRepository, StoreRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::RepoError;
use crate::service::{begin_immediate, ErrorKind};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    /// Only volunteers can browse and redeem.
    VolunteersOnly,
    ItemNotFound(ItemId),
    InsufficientPoints { balance: i64, price: i64 },
    OutOfStock(ItemId),
    UserNotFound(UserId),
    Repo(RepoError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::VolunteersOnly => ErrorKind::Forbidden,
            Self::ItemNotFound(_) | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::InsufficientPoints { .. } | Self::OutOfStock(_) => ErrorKind::Conflict,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::VolunteersOnly => write!(f, "only volunteers can use the points store"),
            Self::ItemNotFound(id) => write!(f, "store item not found: {id}"),
            Self::InsufficientPoints { balance, price } => {
                write!(f, "insufficient points: have {balance}, need {price}")
            }
            Self::OutOfStock(id) => write!(f, "store item {id} is out of stock"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "store item",
                id,
            } => Self::ItemNotFound(id),
            RepoError::NotFound { entity: "user", id } => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub struct StoreService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> StoreService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn list_items(&self, viewer: &User) -> StoreResult<Vec<StoreItem>> {
        if !viewer.is_volunteer() {
            return Err(StoreError::VolunteersOnly);
        }
        Ok(SqliteStoreRepository::new(self.conn).list_items()?)
    }

    /// Redeems one unit of `item_id` for the caller's points.
    pub fn exchange(&self, buyer: &User, item_id: ItemId, now_ms: i64) -> StoreResult<Exchange> {
        if !buyer.is_volunteer() {
            return Err(StoreError::VolunteersOnly);
        }

        let tx = begin_immediate(self.conn)?;
        let store = SqliteStoreRepository::new(&tx);
        let users = SqliteUserRepository::new(&tx);

        let item = store
            .get_item(item_id)?
            .ok_or(StoreError::ItemNotFound(item_id))?;
        let Some(balance) = users.adjust_score(buyer.id, -item.price)? else {
            let balance = users
                .get_user(buyer.id)?
                .map(|user| user.score)
                .unwrap_or_default();
            return Err(StoreError::InsufficientPoints {
                balance,
                price: item.price,
            });
        };
        if !store.take_one(item.id)? {
            return Err(StoreError::OutOfStock(item.id));
        }
        let exchange = store.record_exchange(buyer.id, &item, now_ms)?;
        tx.commit()?;

        info!(
            "event=store_exchange module=store status=ok user_id={} item_id={} points={} balance={}",
            buyer.id, item.id, item.price, balance
        );
        Ok(exchange)
    }

    pub fn exchange_history(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> StoreResult<Page<Exchange>> {
        Ok(SqliteStoreRepository::new(self.conn).list_exchanges(user_id, page)?)
    }

    pub fn add_item(&self, item: &NewStoreItem) -> StoreResult<StoreItem> {
        require_text("name", Some(item.name.as_str()))?;
        if item.price < 0 {
            return Err(ValidationError::OutOfRange {
                field: "price",
                value: item.price,
                min: 0,
                max: i64::MAX,
            }
            .into());
        }
        if let Some(stock) = item.stock.filter(|stock| *stock < 0) {
            return Err(ValidationError::OutOfRange {
                field: "stock",
                value: stock,
                min: 0,
                max: i64::MAX,
            }
            .into());
        }
        Ok(SqliteStoreRepository::new(self.conn).create_item(item)?)
    }

    /// Inserts `items` only when the catalog is empty. Returns how many
    /// were inserted.
    pub fn seed_if_empty(&self, items: &[NewStoreItem]) -> StoreResult<usize> {
        let tx = begin_immediate(self.conn)?;
        if SqliteStoreRepository::new(&tx).count_items()? > 0 {
            return Ok(0);
        }
        for item in items {
            StoreService::new(&tx).add_item(item)?;
        }
        tx.commit()?;

        info!(
            "event=store_seed module=store status=ok inserted={}",
            items.len()
        );
        Ok(items.len())
    }
}
