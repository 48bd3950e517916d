//! Depth-bounded search over arbitrary JSON trees.
//!
//! Browse responses nest the interesting renderers at unpredictable depths, and the nesting
//! changes between client versions. Rather than modelling each shape, we walk the whole tree and
//! let a visitor decide, per object node, whether it has found what it is looking for.
//!
//! The walk is depth-first in document key order. Object keys keep their document order
//! (`serde_json`'s `preserve_order` feature), so "first match" is deterministic for a given
//! response body.

use crate::types::VideoRef;
use indexmap::IndexSet;
use serde_json::{Map, Value};
use std::ops::ControlFlow;

/// Nodes deeper than this are ignored.
///
/// Real payloads stay well below it; anything deeper is treated as pathological.
pub const MAX_DEPTH: usize = 20;

/// What the walk should do after a visitor has looked at an object node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Keep going into this node's children.
    Descend,
    /// This subtree has been handled; skip its children but continue elsewhere.
    Prune,
    /// Abandon the walk entirely.
    Stop,
}

/// Walks `root`, calling `visit` for every object node within [`MAX_DEPTH`].
///
/// Arrays and scalars are never handed to the visitor; arrays are only traversed.
pub fn walk<F>(root: &Value, mut visit: F)
where
    F: FnMut(&Map<String, Value>) -> Visit,
{
    let _ = walk_node(root, 0, &mut visit);
}

fn walk_node<F>(node: &Value, depth: usize, visit: &mut F) -> ControlFlow<()>
where
    F: FnMut(&Map<String, Value>) -> Visit,
{
    if depth > MAX_DEPTH {
        return ControlFlow::Continue(());
    }
    match node {
        Value::Object(map) => match visit(map) {
            Visit::Stop => ControlFlow::Break(()),
            Visit::Prune => ControlFlow::Continue(()),
            Visit::Descend => {
                for child in map.values() {
                    walk_node(child, depth + 1, visit)?;
                }
                ControlFlow::Continue(())
            }
        },
        Value::Array(items) => {
            for item in items {
                walk_node(item, depth + 1, visit)?;
            }
            ControlFlow::Continue(())
        }
        _ => ControlFlow::Continue(()),
    }
}

fn video_id_at(node: &Map<String, Value>, renderer: &str, field: &str) -> Option<VideoRef> {
    node.get(renderer)?
        .get(field)?
        .as_str()
        .and_then(VideoRef::parse)
}

/// Returns the video a renderer node describes, if `node` is one of the known tile renderers.
fn renderer_video_id(node: &Map<String, Value>) -> Option<VideoRef> {
    video_id_at(node, "videoRenderer", "videoId")
        .or_else(|| video_id_at(node, "reelItemRenderer", "videoId"))
        .or_else(|| {
            let content = node.get("richItemRenderer")?.get("content")?.as_object()?;
            video_id_at(content, "videoRenderer", "videoId")
                .or_else(|| video_id_at(content, "reelItemRenderer", "videoId"))
        })
        .or_else(|| video_id_at(node, "lockupViewModel", "contentId"))
}

/// Adds every video referenced by a tile renderer under `root` to `found`.
///
/// Once a renderer has yielded its id, its subtree is not searched further: nested structure
/// inside a tile (badges, menus, thumbnails overlays) only produces duplicates or noise.
///
/// Returns how many refs were new to `found`.
pub fn find_video_refs(root: &Value, found: &mut IndexSet<VideoRef>) -> usize {
    let before = found.len();
    walk(root, |node| match renderer_video_id(node) {
        Some(video) => {
            found.insert(video);
            Visit::Prune
        }
        None => Visit::Descend,
    });
    found.len() - before
}

/// Returns the first continuation token under `root`, in depth-first key order.
pub fn find_continuation(root: &Value) -> Option<String> {
    let mut token = None;
    walk(root, |node| {
        let Some(command) = node.get("continuationCommand") else {
            return Visit::Descend;
        };
        match command.get("token").and_then(Value::as_str) {
            Some(t) if !t.is_empty() => {
                token = Some(t.to_owned());
                Visit::Stop
            }
            _ => Visit::Prune,
        }
    });
    token
}
