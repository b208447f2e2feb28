//! Comment creation and removal.
//!
//! A new comment is attached to exactly one parent (a post or a comment) and
//! never moved afterwards. Removal is a best-effort cascade: there is no
//! multi-document transaction, so a crash midway can leave dangling
//! references that the read paths skip over.

use std::sync::Arc;

use domains::{
    Comment, CommentId, CommentParent, CommentRepository, DomainError, PostId, PostRepository,
    Result, UserId, MAX_COMMENT_LEN, MIN_CONTENT_LEN,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::comment_tree::CommentTreeService;
use crate::validation::require_length;

/// Input for a new comment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub parent: CommentParent,
    pub content: String,
    pub commented_by: UserId,
}

pub struct CommentService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    tree: CommentTreeService,
}

impl CommentService {
    pub fn new(posts: Arc<dyn PostRepository>, comments: Arc<dyn CommentRepository>) -> Self {
        Self {
            tree: CommentTreeService::new(posts.clone(), comments.clone()),
            posts,
            comments,
        }
    }

    #[instrument(skip(self, input), fields(parent = ?input.parent))]
    pub async fn create_comment(&self, input: NewComment) -> Result<Comment> {
        require_length("comment", &input.content, MIN_CONTENT_LEN, MAX_COMMENT_LEN)?;

        // 1. The parent must exist before anything is written
        match input.parent {
            CommentParent::Post(id) => {
                if self.posts.find_by_id(id).await?.is_none() {
                    return Err(DomainError::not_found(PostId::ENTITY, id));
                }
            }
            CommentParent::Comment(id) => {
                if self.comments.find_by_id(id).await?.is_none() {
                    return Err(DomainError::not_found(CommentId::ENTITY, id));
                }
            }
        }

        // 2. Persist, then append to the single parent
        let comment = Comment::new(input.content, input.commented_by);
        self.comments.insert(&comment).await?;

        let attached = match input.parent {
            CommentParent::Post(id) => self.posts.push_comment(id, comment.id).await?,
            CommentParent::Comment(id) => self.comments.push_reply(id, comment.id).await?,
        };

        if !attached {
            // Parent deleted between the check and the append.
            self.comments.delete(comment.id).await?;
            return Err(match input.parent {
                CommentParent::Post(id) => DomainError::not_found(PostId::ENTITY, id),
                CommentParent::Comment(id) => DomainError::not_found(CommentId::ENTITY, id),
            });
        }

        info!(comment = %comment.id, "comment created");
        Ok(comment)
    }

    pub async fn get_comment(&self, id: CommentId) -> Result<Comment> {
        self.comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(CommentId::ENTITY, id))
    }

    pub async fn list_comments(&self) -> Result<Vec<Comment>> {
        self.comments.list().await
    }

    /// Detaches the comment from its parent, then deletes it and every reply
    /// below it. Individual delete failures are logged and skipped.
    /// Returns the number of comments removed.
    #[instrument(skip(self))]
    pub async fn delete_comment(&self, id: CommentId) -> Result<usize> {
        if self.comments.find_by_id(id).await?.is_none() {
            return Err(DomainError::not_found(CommentId::ENTITY, id));
        }

        let subtree = self.tree.collect_subtree(&[id]).await?;

        if let Some(parent) = self.comments.find_parent(id).await? {
            self.comments.remove_reply(parent.id, id).await?;
        } else if let Some(post) = self.posts.find_by_root_comment(id).await? {
            self.posts.remove_comment(post.id, id).await?;
        }

        let mut removed = 0;
        for comment in subtree {
            match self.comments.delete(comment.id).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(err) => warn!(comment = %comment.id, error = %err, "cascade delete skipped a comment"),
            }
        }

        info!(removed, "comment subtree deleted");
        Ok(removed)
    }
}
