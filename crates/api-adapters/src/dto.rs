//! Request and response bodies in the shape the web client sends them.

use domains::{CommentId, CommentParent, DomainError, PostId, UserId};
use serde::{Deserialize, Serialize};
use services::NewComment;

/// Body of the upvote/downvote routes.
#[derive(Debug, Clone, Deserialize)]
pub struct VoteBody {
    #[serde(rename = "userID")]
    pub user_id: UserId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// A new comment names exactly one of `postID` or `parentCommentID`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentBody {
    pub content: String,
    pub commented_by: UserId,
    #[serde(rename = "postID", default)]
    pub post_id: Option<PostId>,
    #[serde(rename = "parentCommentID", default)]
    pub parent_comment_id: Option<CommentId>,
}

impl TryFrom<CreateCommentBody> for NewComment {
    type Error = DomainError;

    fn try_from(body: CreateCommentBody) -> Result<Self, Self::Error> {
        let parent = match (body.post_id, body.parent_comment_id) {
            (Some(post), None) => CommentParent::Post(post),
            (None, Some(comment)) => CommentParent::Comment(comment),
            _ => {
                return Err(DomainError::BadRequest(
                    "exactly one of postID or parentCommentID is required".into(),
                ))
            }
        };
        Ok(NewComment {
            parent,
            content: body.content,
            commented_by: body.commented_by,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFlairBody {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedBody {
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
