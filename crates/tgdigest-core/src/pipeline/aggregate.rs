use crate::domain::Channel;

use super::normalize::NormalizedPost;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelSection {
    pub channel: Channel,
    pub posts: Vec<NormalizedPost>,
}

/// All channels' qualifying posts, in configured channel order.
///
/// Channels without qualifying posts never get a section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregateDocument {
    sections: Vec<ChannelSection>,
}

impl AggregateDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, channel: Channel, posts: Vec<NormalizedPost>) {
        if posts.is_empty() {
            return;
        }
        self.sections.push(ChannelSection { channel, posts });
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> &[ChannelSection] {
        &self.sections
    }

    pub fn post_count(&self) -> usize {
        self.sections.iter().map(|s| s.posts.len()).sum()
    }

    /// Text sent to the generative service.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&format!("\n=== {} ===\n", section.channel));
            let blocks = section
                .posts
                .iter()
                .map(NormalizedPost::render)
                .collect::<Vec<_>>();
            out.push_str(&blocks.join("\n\n"));
        }
        out
    }
}
