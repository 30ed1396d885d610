//! Node-level view of a RadioData document.
//!
//! This mirrors the XML shape one-to-one (channel, scheduled broadcast, line)
//! and sits between the [`radio_model::Project`] and the XML text in both
//! directions.

use radio_model::{Guid, Rgb};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadioDocument {
    pub channels: Vec<ChannelNode>,
}

/// `ChannelEntry`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelNode {
    pub id: String,
    pub name: String,
    pub frequency: f64,
    pub broadcasts: Vec<BroadcastNode>,
}

/// `BroadcastEntry`: one scheduled airing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastNode {
    pub id: String,
    pub day: i32,
    pub timestamp: i64,
    pub endstamp: i64,
    pub lines: Vec<LineNode>,
}

/// `LineEntry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineNode {
    /// `None` when the document carried no usable identity.
    pub id: Option<Guid>,
    pub text: String,
    pub rgb: Option<Rgb>,
}

impl RadioDocument {
    /// All line nodes in document order.
    pub fn lines(&self) -> impl Iterator<Item = &LineNode> {
        self.channels
            .iter()
            .flat_map(|channel| channel.broadcasts.iter())
            .flat_map(|broadcast| broadcast.lines.iter())
    }

    /// First line node carrying `guid`.
    pub fn line(&self, guid: &Guid) -> Option<&LineNode> {
        self.lines().find(|line| line.id.as_ref() == Some(guid))
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }
}
