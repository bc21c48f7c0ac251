//! Forum post and reply persistence.
//!
//! # Invariants
//! - Like counters only change through single `UPDATE ... + 1` statements.
//! - Deleting a post removes its replies (FK cascade).
//! - Post lists are newest first; reply lists are oldest first.

use crate::model::forum::{Post, PostId, PostSummary, Reply, ReplyId, ReplyView};
use crate::model::page::{Page, PageRequest};
use crate::model::user::UserId;
use crate::repo::{expect_changed, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait ForumRepository {
    fn create_post(
        &self,
        author_id: UserId,
        kind: i64,
        title: &str,
        content: &str,
        now_ms: i64,
    ) -> RepoResult<Post>;
    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>>;
    /// Lists posts, optionally restricted to one `kind`.
    fn list_posts(&self, kind: Option<i64>, page: PageRequest) -> RepoResult<Page<PostSummary>>;
    fn delete_post(&self, id: PostId) -> RepoResult<()>;
    /// Increments the like counter and returns the new value.
    fn like_post(&self, id: PostId) -> RepoResult<i64>;

    fn create_reply(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: &str,
        now_ms: i64,
    ) -> RepoResult<Reply>;
    fn get_reply(&self, id: ReplyId) -> RepoResult<Option<Reply>>;
    fn list_replies(&self, post_id: PostId, page: PageRequest) -> RepoResult<Page<ReplyView>>;
    fn delete_reply(&self, id: ReplyId) -> RepoResult<()>;
    fn like_reply(&self, id: ReplyId) -> RepoResult<i64>;
}

pub struct SqliteForumRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteForumRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn bump_likes(&self, table: &'static str, entity: &'static str, id: i64) -> RepoResult<i64> {
        let likes = self
            .conn
            .query_row(
                &format!("UPDATE {table} SET likes = likes + 1 WHERE id = ?1 RETURNING likes;"),
                [id],
                |row| row.get(0),
            )
            .optional()?;
        likes.ok_or(RepoError::NotFound { entity, id })
    }
}

impl ForumRepository for SqliteForumRepository<'_> {
    fn create_post(
        &self,
        author_id: UserId,
        kind: i64,
        title: &str,
        content: &str,
        now_ms: i64,
    ) -> RepoResult<Post> {
        self.conn.execute(
            "INSERT INTO posts (kind, title, content, author_id, created_at, likes)
             VALUES (?1, ?2, ?3, ?4, ?5, 0);",
            params![kind, title, content, author_id, now_ms],
        )?;
        Ok(Post {
            id: self.conn.last_insert_rowid(),
            kind,
            title: title.to_string(),
            content: content.to_string(),
            author_id,
            created_at: now_ms,
            likes: 0,
        })
    }

    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>> {
        let post = self
            .conn
            .query_row(
                "SELECT id, kind, title, content, author_id, created_at, likes
                 FROM posts WHERE id = ?1;",
                [id],
                parse_post_row,
            )
            .optional()?;
        Ok(post)
    }

    fn list_posts(&self, kind: Option<i64>, page: PageRequest) -> RepoResult<Page<PostSummary>> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE (?1 IS NULL OR kind = ?1);",
            [kind],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT
                p.id AS id,
                p.kind AS kind,
                p.title AS title,
                p.content AS content,
                p.author_id AS author_id,
                p.created_at AS created_at,
                p.likes AS likes,
                (SELECT COUNT(*) FROM replies WHERE replies.post_id = p.id) AS reply_count,
                COALESCE(u.name, '') AS author_name
             FROM posts p
             LEFT JOIN users u ON u.id = p.author_id
             WHERE (?1 IS NULL OR p.kind = ?1)
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT ?2 OFFSET ?3;",
        )?;
        let records = stmt
            .query_map(params![kind, page.limit(), page.offset()], |row| {
                Ok(PostSummary {
                    post: parse_post_row(row)?,
                    reply_count: row.get("reply_count")?,
                    author_name: row.get("author_name")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(records, total, page))
    }

    fn delete_post(&self, id: PostId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM posts WHERE id = ?1;", [id])?;
        expect_changed(changed, "post", id)
    }

    fn like_post(&self, id: PostId) -> RepoResult<i64> {
        self.bump_likes("posts", "post", id)
    }

    fn create_reply(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: &str,
        now_ms: i64,
    ) -> RepoResult<Reply> {
        self.conn.execute(
            "INSERT INTO replies (post_id, author_id, content, created_at, likes)
             VALUES (?1, ?2, ?3, ?4, 0);",
            params![post_id, author_id, content, now_ms],
        )?;
        Ok(Reply {
            id: self.conn.last_insert_rowid(),
            post_id,
            author_id,
            content: content.to_string(),
            created_at: now_ms,
            likes: 0,
        })
    }

    fn get_reply(&self, id: ReplyId) -> RepoResult<Option<Reply>> {
        let reply = self
            .conn
            .query_row(
                "SELECT id, post_id, author_id, content, created_at, likes
                 FROM replies WHERE id = ?1;",
                [id],
                parse_reply_row,
            )
            .optional()?;
        Ok(reply)
    }

    fn list_replies(&self, post_id: PostId, page: PageRequest) -> RepoResult<Page<ReplyView>> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM replies WHERE post_id = ?1;",
            [post_id],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT
                r.id AS id,
                r.post_id AS post_id,
                r.author_id AS author_id,
                r.content AS content,
                r.created_at AS created_at,
                r.likes AS likes,
                COALESCE(u.name, '') AS author_name
             FROM replies r
             LEFT JOIN users u ON u.id = r.author_id
             WHERE r.post_id = ?1
             ORDER BY r.created_at ASC, r.id ASC
             LIMIT ?2 OFFSET ?3;",
        )?;
        let records = stmt
            .query_map(params![post_id, page.limit(), page.offset()], |row| {
                Ok(ReplyView {
                    reply: parse_reply_row(row)?,
                    author_name: row.get("author_name")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(records, total, page))
    }

    fn delete_reply(&self, id: ReplyId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM replies WHERE id = ?1;", [id])?;
        expect_changed(changed, "reply", id)
    }

    fn like_reply(&self, id: ReplyId) -> RepoResult<i64> {
        self.bump_likes("replies", "reply", id)
    }
}

fn parse_post_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get("id")?,
        kind: row.get("kind")?,
        title: row.get("title")?,
        content: row.get("content")?,
        author_id: row.get("author_id")?,
        created_at: row.get("created_at")?,
        likes: row.get("likes")?,
    })
}

fn parse_reply_row(row: &Row<'_>) -> rusqlite::Result<Reply> {
    Ok(Reply {
        id: row.get("id")?,
        post_id: row.get("post_id")?,
        author_id: row.get("author_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        likes: row.get("likes")?,
    })
}
