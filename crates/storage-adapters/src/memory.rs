//! # In-memory entity store
//!
//! `DashMap`-backed implementation of every repository port.
//!
//! Atomic updates (`apply_vote`, `adjust_reputation`, `push_*`) run while the
//! entry's shard write lock is held, so racing requests serialize on the
//! entry and no increment is lost. Collections are returned in identifier
//! order, which for UUID v7 is creation order.

use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{
    contains_ignore_case, Comment, CommentId, CommentRepository, Community, CommunityId,
    CommunityRepository, DomainError, LinkFlair, LinkFlairId, LinkFlairRepository, Post, PostId,
    PostRepository, Repositories, Result, User, UserId, UserRepository, VoteDirection,
};
use tracing::trace;

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    communities: DashMap<CommunityId, Community>,
    posts: DashMap<PostId, Post>,
    comments: DashMap<CommentId, Comment>,
    flairs: DashMap<LinkFlairId, LinkFlair>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires one shared store behind every port.
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

fn insert_new<K, V>(map: &DashMap<K, V>, entity: &'static str, id: K, value: V) -> Result<()>
where
    K: Eq + Hash + Copy + std::fmt::Display,
{
    match map.entry(id) {
        dashmap::mapref::entry::Entry::Occupied(_) => {
            Err(DomainError::Conflict(format!("{entity} {id} already exists")))
        }
        dashmap::mapref::entry::Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(())
        }
    }
}

fn sorted_where<K, V>(map: &DashMap<K, V>, keep: impl Fn(&V) -> bool) -> Vec<V>
where
    K: Eq + Hash + Ord + Copy,
    V: Clone,
{
    let mut found: Vec<(K, V)> = map
        .iter()
        .filter(|entry| keep(entry.value()))
        .map(|entry| (*entry.key(), entry.value().clone()))
        .collect();
    found.sort_by_key(|(k, _)| *k);
    found.into_iter().map(|(_, v)| v).collect()
}

fn in_order<K, V>(map: &DashMap<K, V>, ids: &[K]) -> Vec<V>
where
    K: Eq + Hash,
    V: Clone,
{
    ids.iter()
        .filter_map(|id| map.get(id).map(|entry| entry.value().clone()))
        .collect()
}

/// Drops every occurrence of `item`; `true` if anything was removed.
fn remove_all<T: PartialEq>(list: &mut Vec<T>, item: &T) -> bool {
    let before = list.len();
    list.retain(|x| x != item);
    list.len() != before
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.clone()))
    }

    async fn find_by_display_name(&self, display_name: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.display_name == display_name)
            .map(|u| u.clone()))
    }

    async fn list(&self) -> Result<Vec<User>> {
        Ok(sorted_where(&self.users, |_| true))
    }

    async fn insert(&self, user: &User) -> Result<()> {
        insert_new(&self.users, UserId::ENTITY, user.id, user.clone())
    }

    async fn adjust_reputation(&self, id: UserId, delta: i64) -> Result<Option<User>> {
        Ok(self.users.get_mut(&id).map(|mut user| {
            user.reputation += delta;
            trace!(user = %id, reputation = user.reputation, "reputation adjusted");
            user.clone()
        }))
    }
}

#[async_trait]
impl CommunityRepository for MemoryStore {
    async fn find_by_id(&self, id: CommunityId) -> Result<Option<Community>> {
        Ok(self.communities.get(&id).map(|c| c.clone()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Community>> {
        Ok(self
            .communities
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.clone()))
    }

    async fn list(&self) -> Result<Vec<Community>> {
        Ok(sorted_where(&self.communities, |_| true))
    }

    async fn insert(&self, community: &Community) -> Result<()> {
        insert_new(
            &self.communities,
            CommunityId::ENTITY,
            community.id,
            community.clone(),
        )
    }

    async fn push_post(&self, id: CommunityId, post_id: PostId) -> Result<bool> {
        Ok(self
            .communities
            .get_mut(&id)
            .map(|mut c| c.post_ids.push(post_id))
            .is_some())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|p| p.clone()))
    }

    async fn find_by_ids(&self, ids: &[PostId]) -> Result<Vec<Post>> {
        Ok(in_order(&self.posts, ids))
    }

    async fn list(&self) -> Result<Vec<Post>> {
        Ok(sorted_where(&self.posts, |_| true))
    }

    async fn insert(&self, post: &Post) -> Result<()> {
        insert_new(&self.posts, PostId::ENTITY, post.id, post.clone())
    }

    async fn search_text(&self, terms: &[String]) -> Result<Vec<Post>> {
        Ok(sorted_where(&self.posts, |post| {
            terms.iter().any(|term| {
                contains_ignore_case(&post.title, term) || contains_ignore_case(&post.content, term)
            })
        }))
    }

    async fn find_by_root_comment(&self, comment_id: CommentId) -> Result<Option<Post>> {
        Ok(sorted_where(&self.posts, |post| post.comment_ids.contains(&comment_id))
            .into_iter()
            .next())
    }

    async fn find_by_flairs(&self, flair_ids: &[LinkFlairId]) -> Result<Vec<Post>> {
        Ok(sorted_where(&self.posts, |post| {
            post.link_flair_id
                .is_some_and(|flair| flair_ids.contains(&flair))
        }))
    }

    async fn apply_vote(&self, id: PostId, direction: VoteDirection) -> Result<Option<Post>> {
        Ok(self.posts.get_mut(&id).map(|mut post| {
            post.record_vote(direction);
            post.clone()
        }))
    }

    async fn increment_views(&self, id: PostId) -> Result<Option<Post>> {
        Ok(self.posts.get_mut(&id).map(|mut post| {
            post.views += 1;
            post.clone()
        }))
    }

    async fn push_comment(&self, id: PostId, comment_id: CommentId) -> Result<bool> {
        Ok(self
            .posts
            .get_mut(&id)
            .map(|mut post| post.comment_ids.push(comment_id))
            .is_some())
    }

    async fn remove_comment(&self, id: PostId, comment_id: CommentId) -> Result<bool> {
        Ok(self
            .posts
            .get_mut(&id)
            .is_some_and(|mut post| remove_all(&mut post.comment_ids, &comment_id)))
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>> {
        Ok(self.comments.get(&id).map(|c| c.clone()))
    }

    async fn find_by_ids(&self, ids: &[CommentId]) -> Result<Vec<Comment>> {
        Ok(in_order(&self.comments, ids))
    }

    async fn list(&self) -> Result<Vec<Comment>> {
        Ok(sorted_where(&self.comments, |_| true))
    }

    async fn insert(&self, comment: &Comment) -> Result<()> {
        insert_new(&self.comments, CommentId::ENTITY, comment.id, comment.clone())
    }

    async fn search_content(&self, needle: &str) -> Result<Vec<Comment>> {
        Ok(sorted_where(&self.comments, |c| contains_ignore_case(&c.content, needle)))
    }

    async fn find_parent(&self, child: CommentId) -> Result<Option<Comment>> {
        Ok(sorted_where(&self.comments, |c| c.comment_ids.contains(&child))
            .into_iter()
            .next())
    }

    async fn apply_vote(&self, id: CommentId, direction: VoteDirection) -> Result<Option<Comment>> {
        Ok(self.comments.get_mut(&id).map(|mut comment| {
            comment.record_vote(direction);
            comment.clone()
        }))
    }

    async fn push_reply(&self, id: CommentId, reply_id: CommentId) -> Result<bool> {
        Ok(self
            .comments
            .get_mut(&id)
            .map(|mut c| c.comment_ids.push(reply_id))
            .is_some())
    }

    async fn remove_reply(&self, id: CommentId, reply_id: CommentId) -> Result<bool> {
        Ok(self
            .comments
            .get_mut(&id)
            .is_some_and(|mut c| remove_all(&mut c.comment_ids, &reply_id)))
    }

    async fn delete(&self, id: CommentId) -> Result<bool> {
        Ok(self.comments.remove(&id).is_some())
    }
}

#[async_trait]
impl LinkFlairRepository for MemoryStore {
    async fn find_by_id(&self, id: LinkFlairId) -> Result<Option<LinkFlair>> {
        Ok(self.flairs.get(&id).map(|f| f.clone()))
    }

    async fn list(&self) -> Result<Vec<LinkFlair>> {
        Ok(sorted_where(&self.flairs, |_| true))
    }

    async fn insert(&self, flair: &LinkFlair) -> Result<()> {
        insert_new(&self.flairs, LinkFlairId::ENTITY, flair.id, flair.clone())
    }

    async fn search_content(&self, needle: &str) -> Result<Vec<LinkFlair>> {
        Ok(sorted_where(&self.flairs, |f| contains_ignore_case(&f.content, needle)))
    }
}
