//! # PostgreSQL entity store
//!
//! Maps the document-shaped entities onto rows whose reference lists are
//! `UUID[]` columns.
//!
//! Every counter update is a single `UPDATE ... SET x = x + n ... RETURNING`
//! statement, so concurrent votes serialize on the row lock instead of racing
//! on a read-then-write.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domains::{
    Comment, CommentId, CommentRepository, Community, CommunityId, CommunityRepository,
    DomainError, LinkFlair, LinkFlairId, LinkFlairRepository, Post, PostId, PostRepository,
    Repositories, Result, User, UserId, UserRepository, VoteDirection, VoteTally,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, display_name, reputation, is_admin, created_date";
const COMMUNITY_COLUMNS: &str =
    "id, name, description, post_ids, members, member_count, start_date";
const POST_COLUMNS: &str = "id, title, content, link_flair_id, posted_by, posted_date, \
     comment_ids, views, upvotes, downvotes, vote_count";
const COMMENT_COLUMNS: &str =
    "id, content, commented_by, commented_date, comment_ids, upvotes, downvotes, vote_count";

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects and applies the embedded migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(db_error)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DomainError::internal)?;

        info!(max_connections, "postgres store ready");
        Ok(Self { pool })
    }

    pub fn into_repositories(self: Arc<Self>) -> Repositories {
        Repositories {
            users: self.clone(),
            communities: self.clone(),
            posts: self.clone(),
            comments: self.clone(),
            flairs: self,
        }
    }
}

fn db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return DomainError::Conflict(db.message().to_string());
        }
    }
    DomainError::internal(err)
}

/// `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn raw_ids<T: Copy + Into<Uuid>>(ids: &[T]) -> Vec<Uuid> {
    ids.iter().map(|id| (*id).into()).collect()
}

fn typed_ids<T: From<Uuid>>(ids: Vec<Uuid>) -> Vec<T> {
    ids.into_iter().map(T::from).collect()
}

/// Up/down increments for a single vote.
fn vote_increments(direction: VoteDirection) -> (i64, i64) {
    match direction {
        VoteDirection::Up => (1, 0),
        VoteDirection::Down => (0, 1),
    }
}

fn tally_from_row(row: &PgRow) -> std::result::Result<VoteTally, sqlx::Error> {
    Ok(VoteTally {
        upvotes: row.try_get("upvotes")?,
        downvotes: row.try_get("downvotes")?,
        vote_count: row.try_get("vote_count")?,
    })
}

fn user_from_row(row: PgRow) -> std::result::Result<User, sqlx::Error> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        reputation: row.try_get("reputation")?,
        is_admin: row.try_get("is_admin")?,
        created_date: row.try_get("created_date")?,
    })
}

fn community_from_row(row: PgRow) -> std::result::Result<Community, sqlx::Error> {
    Ok(Community {
        id: CommunityId(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        post_ids: typed_ids(row.try_get("post_ids")?),
        members: typed_ids(row.try_get("members")?),
        member_count: row.try_get("member_count")?,
        start_date: row.try_get("start_date")?,
    })
}

fn post_from_row(row: PgRow) -> std::result::Result<Post, sqlx::Error> {
    Ok(Post {
        id: PostId(row.try_get("id")?),
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        link_flair_id: row.try_get::<Option<Uuid>, _>("link_flair_id")?.map(LinkFlairId),
        posted_by: UserId(row.try_get("posted_by")?),
        posted_date: row.try_get("posted_date")?,
        comment_ids: typed_ids(row.try_get("comment_ids")?),
        views: row.try_get("views")?,
        votes: tally_from_row(&row)?,
    })
}

fn comment_from_row(row: PgRow) -> std::result::Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: CommentId(row.try_get("id")?),
        content: row.try_get("content")?,
        commented_by: UserId(row.try_get("commented_by")?),
        commented_date: row.try_get("commented_date")?,
        comment_ids: typed_ids(row.try_get("comment_ids")?),
        votes: tally_from_row(&row)?,
    })
}

fn flair_from_row(row: PgRow) -> std::result::Result<LinkFlair, sqlx::Error> {
    Ok(LinkFlair {
        id: LinkFlairId(row.try_get("id")?),
        content: row.try_get("content")?,
    })
}

fn map_rows<T>(
    rows: Vec<PgRow>,
    f: fn(PgRow) -> std::result::Result<T, sqlx::Error>,
) -> Result<Vec<T>> {
    rows.into_iter()
        .map(f)
        .collect::<std::result::Result<_, _>>()
        .map_err(db_error)
}

fn map_row<T>(
    row: Option<PgRow>,
    f: fn(PgRow) -> std::result::Result<T, sqlx::Error>,
) -> Result<Option<T>> {
    row.map(f).transpose().map_err(db_error)
}

/// Re-orders fetched rows to match the requested identifiers.
fn reorder<K, T>(ids: &[K], found: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T>
where
    K: Eq + std::hash::Hash + Copy,
{
    let mut by_id: HashMap<K, T> = found.into_iter().map(|item| (key(&item), item)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

#[async_trait]
impl UserRepository for PostgresStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        map_row(row, user_from_row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        map_row(row, user_from_row)
    }

    async fn find_by_display_name(&self, display_name: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE display_name = $1"
        ))
        .bind(display_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        map_row(row, user_from_row)
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        map_rows(rows, user_from_row)
    }

    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, display_name, reputation, is_admin, created_date) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id.0)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.reputation)
        .bind(user.is_admin)
        .bind(user.created_date)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn adjust_reputation(&self, id: UserId, delta: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "UPDATE users SET reputation = reputation + $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.0)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        map_row(row, user_from_row)
    }
}

#[async_trait]
impl CommunityRepository for PostgresStore {
    async fn find_by_id(&self, id: CommunityId) -> Result<Option<Community>> {
        let row = sqlx::query(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        map_row(row, community_from_row)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Community>> {
        let row = sqlx::query(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        map_row(row, community_from_row)
    }

    async fn list(&self) -> Result<Vec<Community>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        map_rows(rows, community_from_row)
    }

    async fn insert(&self, community: &Community) -> Result<()> {
        sqlx::query(
            "INSERT INTO communities (id, name, description, post_ids, members, member_count, start_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(community.id.0)
        .bind(&community.name)
        .bind(&community.description)
        .bind(raw_ids(&community.post_ids))
        .bind(raw_ids(&community.members))
        .bind(community.member_count)
        .bind(community.start_date)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn push_post(&self, id: CommunityId, post_id: PostId) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE communities SET post_ids = array_append(post_ids, $2) WHERE id = $1",
        )
        .bind(id.0)
        .bind(post_id.0)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(done.rows_affected() == 1)
    }
}

#[async_trait]
impl PostRepository for PostgresStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        map_row(row, post_from_row)
    }

    async fn find_by_ids(&self, ids: &[PostId]) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ANY($1)"))
            .bind(raw_ids(ids))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(reorder(ids, map_rows(rows, post_from_row)?, |p| p.id))
    }

    async fn list(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        map_rows(rows, post_from_row)
    }

    async fn insert(&self, post: &Post) -> Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, title, content, link_flair_id, posted_by, posted_date, \
             comment_ids, views, upvotes, downvotes, vote_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(post.id.0)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.link_flair_id.map(|f| f.0))
        .bind(post.posted_by.0)
        .bind(post.posted_date)
        .bind(raw_ids(&post.comment_ids))
        .bind(post.views)
        .bind(post.votes.upvotes)
        .bind(post.votes.downvotes)
        .bind(post.votes.vote_count)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn search_text(&self, terms: &[String]) -> Result<Vec<Post>> {
        let patterns: Vec<String> = terms.iter().map(|t| like_pattern(t)).collect();
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE title ILIKE ANY($1) OR content ILIKE ANY($1) ORDER BY id"
        ))
        .bind(patterns)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        map_rows(rows, post_from_row)
    }

    async fn find_by_root_comment(&self, comment_id: CommentId) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE $1 = ANY(comment_ids) ORDER BY id LIMIT 1"
        ))
        .bind(comment_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        map_row(row, post_from_row)
    }

    async fn find_by_flairs(&self, flair_ids: &[LinkFlairId]) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE link_flair_id = ANY($1) ORDER BY id"
        ))
        .bind(raw_ids(flair_ids))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        map_rows(rows, post_from_row)
    }

    async fn apply_vote(&self, id: PostId, direction: VoteDirection) -> Result<Option<Post>> {
        let (up, down) = vote_increments(direction);
        let row = sqlx::query(&format!(
            "UPDATE posts SET upvotes = upvotes + $2, downvotes = downvotes + $3, \
             vote_count = vote_count + $4 WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id.0)
        .bind(up)
        .bind(down)
        .bind(direction.score_delta())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        map_row(row, post_from_row)
    }

    async fn increment_views(&self, id: PostId) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "UPDATE posts SET views = views + 1 WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        map_row(row, post_from_row)
    }

    async fn push_comment(&self, id: PostId, comment_id: CommentId) -> Result<bool> {
        let done =
            sqlx::query("UPDATE posts SET comment_ids = array_append(comment_ids, $2) WHERE id = $1")
                .bind(id.0)
                .bind(comment_id.0)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(done.rows_affected() == 1)
    }

    async fn remove_comment(&self, id: PostId, comment_id: CommentId) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE posts SET comment_ids = array_remove(comment_ids, $2) \
             WHERE id = $1 AND $2 = ANY(comment_ids)",
        )
        .bind(id.0)
        .bind(comment_id.0)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(done.rows_affected() == 1)
    }
}

#[async_trait]
impl CommentRepository for PostgresStore {
    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        map_row(row, comment_from_row)
    }

    async fn find_by_ids(&self, ids: &[CommentId]) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ANY($1)"
        ))
        .bind(raw_ids(ids))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(reorder(ids, map_rows(rows, comment_from_row)?, |c| c.id))
    }

    async fn list(&self) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        map_rows(rows, comment_from_row)
    }

    async fn insert(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, content, commented_by, commented_date, comment_ids, \
             upvotes, downvotes, vote_count) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(comment.id.0)
        .bind(&comment.content)
        .bind(comment.commented_by.0)
        .bind(comment.commented_date)
        .bind(raw_ids(&comment.comment_ids))
        .bind(comment.votes.upvotes)
        .bind(comment.votes.downvotes)
        .bind(comment.votes.vote_count)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn search_content(&self, needle: &str) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE content ILIKE $1 ORDER BY id"
        ))
        .bind(like_pattern(needle))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        map_rows(rows, comment_from_row)
    }

    async fn find_parent(&self, child: CommentId) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE $1 = ANY(comment_ids) ORDER BY id LIMIT 1"
        ))
        .bind(child.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        map_row(row, comment_from_row)
    }

    async fn apply_vote(&self, id: CommentId, direction: VoteDirection) -> Result<Option<Comment>> {
        let (up, down) = vote_increments(direction);
        let row = sqlx::query(&format!(
            "UPDATE comments SET upvotes = upvotes + $2, downvotes = downvotes + $3, \
             vote_count = vote_count + $4 WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id.0)
        .bind(up)
        .bind(down)
        .bind(direction.score_delta())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        map_row(row, comment_from_row)
    }

    async fn push_reply(&self, id: CommentId, reply_id: CommentId) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE comments SET comment_ids = array_append(comment_ids, $2) WHERE id = $1",
        )
        .bind(id.0)
        .bind(reply_id.0)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(done.rows_affected() == 1)
    }

    async fn remove_reply(&self, id: CommentId, reply_id: CommentId) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE comments SET comment_ids = array_remove(comment_ids, $2) \
             WHERE id = $1 AND $2 = ANY(comment_ids)",
        )
        .bind(id.0)
        .bind(reply_id.0)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(done.rows_affected() == 1)
    }

    async fn delete(&self, id: CommentId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(done.rows_affected() == 1)
    }
}

#[async_trait]
impl LinkFlairRepository for PostgresStore {
    async fn find_by_id(&self, id: LinkFlairId) -> Result<Option<LinkFlair>> {
        let row = sqlx::query("SELECT id, content FROM link_flairs WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        map_row(row, flair_from_row)
    }

    async fn list(&self) -> Result<Vec<LinkFlair>> {
        let rows = sqlx::query("SELECT id, content FROM link_flairs ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        map_rows(rows, flair_from_row)
    }

    async fn insert(&self, flair: &LinkFlair) -> Result<()> {
        sqlx::query("INSERT INTO link_flairs (id, content) VALUES ($1, $2)")
            .bind(flair.id.0)
            .bind(&flair.content)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn search_content(&self, needle: &str) -> Result<Vec<LinkFlair>> {
        let rows =
            sqlx::query("SELECT id, content FROM link_flairs WHERE content ILIKE $1 ORDER BY id")
                .bind(like_pattern(needle))
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
        map_rows(rows, flair_from_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%_\\"), "%100\\%\\_\\\\%");
    }

    #[test]
    fn reorder_follows_requested_ids() {
        let ids = [3, 1, 7, 2];
        let found = vec![1, 2, 3];
        assert_eq!(reorder(&ids, found, |x| *x), vec![3, 1, 2]);
    }

    #[test]
    fn votes_split_into_increments() {
        assert_eq!(vote_increments(VoteDirection::Up), (1, 0));
        assert_eq!(vote_increments(VoteDirection::Down), (0, 1));
    }
}
