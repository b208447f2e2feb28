//! Axum handlers. Each one extracts, calls a single service operation and
//! serializes the result; all business rules stay in `services`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domains::{
    Comment, CommentId, Community, CommunityId, DomainError, LinkFlair, Post, PostId, User, UserId,
    VoteDirection, VoteTarget,
};
use services::{CommentTree, NewComment, NewCommunity, NewPost, VotedEntity};
use tracing::instrument;

use super::error::{ApiError, ApiResult};
use crate::dto::{CreateCommentBody, CreateFlairBody, DeletedBody, RegisterBody, SearchParams, VoteBody};
use crate::metrics::VoteLabels;
use crate::AppState;

type AppStateRef = State<Arc<AppState>>;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn metrics(State(state): AppStateRef) -> ApiResult<String> {
    state
        .metrics
        .render()
        .map_err(|e| ApiError(DomainError::internal(e)))
}

// ── Users ───────────────────────────────────────────────────────────────────

pub async fn list_users(State(state): AppStateRef) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.list_users().await?))
}

pub async fn get_user(State(state): AppStateRef, Path(id): Path<UserId>) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get_user(id).await?))
}

pub async fn register_user(
    State(state): AppStateRef,
    Json(body): Json<RegisterBody>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .users
        .register(User::new(body.email, body.display_name))
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// ── Communities ─────────────────────────────────────────────────────────────

pub async fn list_communities(State(state): AppStateRef) -> ApiResult<Json<Vec<Community>>> {
    Ok(Json(state.communities.list_communities().await?))
}

pub async fn get_community(
    State(state): AppStateRef,
    Path(id): Path<CommunityId>,
) -> ApiResult<Json<Community>> {
    Ok(Json(state.communities.get_community(id).await?))
}

pub async fn community_posts(
    State(state): AppStateRef,
    Path(id): Path<CommunityId>,
) -> ApiResult<Json<Vec<Post>>> {
    Ok(Json(state.communities.posts_of(id).await?))
}

pub async fn create_community(
    State(state): AppStateRef,
    Json(body): Json<NewCommunity>,
) -> ApiResult<impl IntoResponse> {
    let community = state.communities.create_community(body).await?;
    Ok((StatusCode::CREATED, Json(community)))
}

// ── Posts ───────────────────────────────────────────────────────────────────

pub async fn list_posts(State(state): AppStateRef) -> ApiResult<Json<Vec<Post>>> {
    Ok(Json(state.posts.list_posts().await?))
}

pub async fn get_post(State(state): AppStateRef, Path(id): Path<PostId>) -> ApiResult<Json<Post>> {
    Ok(Json(state.posts.get_post(id).await?))
}

pub async fn create_post(
    State(state): AppStateRef,
    Json(body): Json<NewPost>,
) -> ApiResult<impl IntoResponse> {
    let post = state.posts.create_post(body).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn record_view(
    State(state): AppStateRef,
    Path(id): Path<PostId>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.posts.record_view(id).await?))
}

pub async fn post_comments(
    State(state): AppStateRef,
    Path(id): Path<PostId>,
) -> ApiResult<Json<CommentTree>> {
    Ok(Json(state.tree.comment_tree(id).await?))
}

pub async fn upvote_post(
    State(state): AppStateRef,
    Path(id): Path<PostId>,
    Json(body): Json<VoteBody>,
) -> ApiResult<Json<VotedEntity>> {
    cast_vote(&state, VoteTarget::Post(id), VoteDirection::Up, body.user_id).await
}

pub async fn downvote_post(
    State(state): AppStateRef,
    Path(id): Path<PostId>,
    Json(body): Json<VoteBody>,
) -> ApiResult<Json<VotedEntity>> {
    cast_vote(&state, VoteTarget::Post(id), VoteDirection::Down, body.user_id).await
}

// ── Comments ────────────────────────────────────────────────────────────────

pub async fn list_comments(State(state): AppStateRef) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.list_comments().await?))
}

pub async fn create_comment(
    State(state): AppStateRef,
    Json(body): Json<CreateCommentBody>,
) -> ApiResult<impl IntoResponse> {
    let input = NewComment::try_from(body)?;
    let comment = state.comments.create_comment(input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): AppStateRef,
    Path(id): Path<CommentId>,
) -> ApiResult<Json<DeletedBody>> {
    let removed = state.comments.delete_comment(id).await?;
    Ok(Json(DeletedBody { removed }))
}

pub async fn upvote_comment(
    State(state): AppStateRef,
    Path(id): Path<CommentId>,
    Json(body): Json<VoteBody>,
) -> ApiResult<Json<VotedEntity>> {
    cast_vote(&state, VoteTarget::Comment(id), VoteDirection::Up, body.user_id).await
}

pub async fn downvote_comment(
    State(state): AppStateRef,
    Path(id): Path<CommentId>,
    Json(body): Json<VoteBody>,
) -> ApiResult<Json<VotedEntity>> {
    cast_vote(&state, VoteTarget::Comment(id), VoteDirection::Down, body.user_id).await
}

/// Applies a vote and records it on the vote counters.
#[instrument(skip(state))]
async fn cast_vote(
    state: &AppState,
    target: VoteTarget,
    direction: VoteDirection,
    voter: UserId,
) -> ApiResult<Json<VotedEntity>> {
    match state.votes.apply_vote(target, direction, voter).await {
        Ok(entity) => {
            state
                .metrics
                .votes
                .get_or_create(&VoteLabels::new(target.kind(), direction))
                .inc();
            Ok(Json(entity))
        }
        Err(err @ DomainError::Forbidden(_)) => {
            state.metrics.vote_rejections.inc();
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

// ── Link flairs ─────────────────────────────────────────────────────────────

pub async fn list_flairs(State(state): AppStateRef) -> ApiResult<Json<Vec<LinkFlair>>> {
    Ok(Json(state.flairs.list_flairs().await?))
}

pub async fn create_flair(
    State(state): AppStateRef,
    Json(body): Json<CreateFlairBody>,
) -> ApiResult<impl IntoResponse> {
    let flair = state.flairs.create_flair(&body.content).await?;
    Ok((StatusCode::CREATED, Json(flair)))
}

// ── Search ──────────────────────────────────────────────────────────────────

/// A missing `query` parameter is treated like an empty one.
pub async fn search(
    State(state): AppStateRef,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Post>>> {
    let query = params.query.unwrap_or_default();
    let posts = state.search.search(&query).await?;
    state.metrics.searches.inc();
    Ok(Json(posts))
}
