//! Populates a Postgres-backed forum with an admin account and sample
//! discussion content.
//!
//! ```text
//! seed <admin-email> <admin-display-name>
//! ```
//!
//! The connection comes from the usual configuration layers
//! (`FORUM__DATABASE__URL`). Content is written through the services, so
//! every reference list is maintained exactly as the server would.

use std::sync::Arc;

use anyhow::{bail, Context};
use configs::Settings;
use domains::{Comment, CommentParent, Repositories, User, UserId};
use services::{
    CommentService, CommunityService, LinkFlairService, NewComment, NewCommunity, NewPost,
    PostService, UserService,
};
use storage_adapters::PostgresStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [admin_email, admin_name] = args.as_slice() else {
        bail!("usage: seed <admin-email> <admin-display-name>");
    };

    let settings = Settings::load().context("loading configuration")?;
    settings.log_sources();
    let store = PostgresStore::connect(settings.database.url()?, settings.database.max_connections)
        .await
        .context("connecting to postgres")?;
    let repos = Arc::new(store).into_repositories();

    seed(&repos, admin_email, admin_name).await?;
    info!("database seeded");
    Ok(())
}

async fn seed(repos: &Repositories, admin_email: &str, admin_name: &str) -> anyhow::Result<()> {
    let users = UserService::new(repos.users.clone());
    let flairs = LinkFlairService::new(repos.flairs.clone());
    let communities = CommunityService::new(repos.communities.clone(), repos.posts.clone());
    let posts = PostService::new(
        repos.posts.clone(),
        repos.communities.clone(),
        repos.flairs.clone(),
    );
    let comments = CommentService::new(repos.posts.clone(), repos.comments.clone());

    let admin = users.register(User::new_admin(admin_email, admin_name)).await?;
    info!(admin = %admin.id, "admin created");

    let bigfeet = users.register(User::new("bigfeet@gmail.com", "bigfeet")).await?.id;
    let astyanax = users.register(User::new("astyanax@gmail.com", "astyanax")).await?.id;
    let truth = users.register(User::new("truth47@gmail.com", "outtheretruth47")).await?.id;
    let shemp = users.register(User::new("shemp@gmail.com", "shemp")).await?.id;
    let rollo = users.register(User::new("rollo@gmail.com", "rollo")).await?.id;

    let jerkstore = flairs.create_flair("The jerkstore called...").await?;
    flairs.create_flair("Literal Saint").await?;
    let walk_among_us = flairs.create_flair("They walk among us").await?;
    flairs.create_flair("Worse than Hitler").await?;

    let jerk = communities
        .create_community(NewCommunity {
            name: "Am I the Jerk?".into(),
            description: "A practical application of the principles of justice.".into(),
            members: vec![rollo, shemp, astyanax, bigfeet],
        })
        .await?;
    let history = communities
        .create_community(NewCommunity {
            name: "The History Channel".into(),
            description: "A fantastical reimagining of our past and present.".into(),
            members: vec![astyanax, truth, bigfeet],
        })
        .await?;

    let cybertruck = posts
        .create_post(NewPost {
            community_id: jerk.id,
            title: "AITJ: I parked my cybertruck in the handicapped spot".into(),
            content: "Recently I went to the store in my new cybertruck and every spot was taken.".into(),
            link_flair_id: Some(jerkstore.id),
            posted_by: bigfeet,
        })
        .await?;
    let channel = posts
        .create_post(NewPost {
            community_id: history.id,
            title: "Remember when this was a HISTORY channel?".into(),
            content: "Does anyone else remember when they used to show actual history?".into(),
            link_flair_id: Some(walk_among_us.id),
            posted_by: astyanax,
        })
        .await?;

    let higher_calling = reply(
        &comments,
        CommentParent::Post(cybertruck.id),
        shemp,
        "There is no higher calling than protecting your own property.",
    )
    .await?;
    reply(&comments, CommentParent::Post(cybertruck.id), astyanax, "Obvious rage bait.").await?;
    reply(
        &comments,
        CommentParent::Comment(higher_calling.id),
        rollo,
        "My brother in Christ, that is not how any of this works.",
    )
    .await?;

    let truth_is_out_there =
        reply(&comments, CommentParent::Post(channel.id), astyanax, "The truth is out there.").await?;
    reply(
        &comments,
        CommentParent::Post(channel.id),
        bigfeet,
        "The same thing happened to me on my way home.",
    )
    .await?;
    let believe = reply(
        &comments,
        CommentParent::Comment(truth_is_out_there.id),
        truth,
        "I want to believe.",
    )
    .await?;
    reply(
        &comments,
        CommentParent::Comment(believe.id),
        bigfeet,
        "Generic poster slogan #42",
    )
    .await?;

    Ok(())
}

async fn reply(
    comments: &CommentService,
    parent: CommentParent,
    author: UserId,
    content: &str,
) -> anyhow::Result<Comment> {
    Ok(comments
        .create_comment(NewComment {
            parent,
            content: content.into(),
            commented_by: author,
        })
        .await?)
}
