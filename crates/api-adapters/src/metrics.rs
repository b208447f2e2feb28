//! Prometheus counters for the vote and search paths.

use std::fmt;

use domains::{TargetKind, VoteDirection};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum TargetLabel {
    Post,
    Comment,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum DirectionLabel {
    Up,
    Down,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct VoteLabels {
    pub target: TargetLabel,
    pub direction: DirectionLabel,
}

impl VoteLabels {
    pub fn new(kind: TargetKind, direction: VoteDirection) -> Self {
        Self {
            target: match kind {
                TargetKind::Post => TargetLabel::Post,
                TargetKind::Comment => TargetLabel::Comment,
            },
            direction: match direction {
                VoteDirection::Up => DirectionLabel::Up,
                VoteDirection::Down => DirectionLabel::Down,
            },
        }
    }
}

pub struct Metrics {
    registry: Registry,
    pub votes: Family<VoteLabels, Counter>,
    pub vote_rejections: Counter,
    pub searches: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("forum");
        let votes = Family::<VoteLabels, Counter>::default();
        let vote_rejections = Counter::default();
        let searches = Counter::default();

        registry.register("votes", "Votes applied to posts and comments", votes.clone());
        registry.register(
            "vote_rejections",
            "Votes rejected by the reputation gate",
            vote_rejections.clone(),
        );
        registry.register("searches", "Search requests served", searches.clone());

        Self {
            registry,
            votes,
            vote_rejections,
            searches,
        }
    }

    /// OpenMetrics text exposition.
    pub fn render(&self) -> Result<String, fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
