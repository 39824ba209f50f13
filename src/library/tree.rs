//! Artist -> album -> track tree built from the library

use std::collections::HashMap;

use super::TrackRecord;

/// Index of a node inside a [`LibraryTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A node of the library tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Artist { name: String },
    Album { name: String },
    Track(TrackRecord),
}

impl Node {
    /// Human readable label, as shown in listings
    pub fn label(&self) -> String {
        match self {
            Node::Artist { name } => format!("Artist: {}", name),
            Node::Album { name } => format!("Album: {}", name),
            Node::Track(track) => track.title().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    children: Vec<NodeId>,
}

/// Three-level selection tree over a track collection
///
/// Artist and album levels are skipped for tracks whose album artist or
/// album is empty; such tracks hang off the nearest level that exists.
#[derive(Debug, Clone, Default)]
pub struct LibraryTree {
    entries: Vec<Entry>,
    roots: Vec<NodeId>,
}

impl LibraryTree {
    /// Sort the tracks and build the tree in sorted order
    pub fn build(mut tracks: Vec<TrackRecord>) -> Self {
        sort_tracks(&mut tracks);

        let mut tree = Self::default();
        let mut artists: HashMap<String, NodeId> = HashMap::new();
        let mut albums: HashMap<(String, String), NodeId> = HashMap::new();

        for track in tracks {
            let artist_label = track.album_artist().trim().to_string();
            let album_label = track.album().trim().to_string();

            let artist = (!artist_label.is_empty()).then(|| {
                *artists.entry(artist_label.clone()).or_insert_with(|| {
                    tree.push(
                        None,
                        Node::Artist {
                            name: track.album_artist().to_string(),
                        },
                    )
                })
            });

            let album = (!album_label.is_empty()).then(|| {
                *albums
                    .entry((artist_label.clone(), album_label.clone()))
                    .or_insert_with(|| {
                        tree.push(
                            artist,
                            Node::Album {
                                name: track.album().to_string(),
                            },
                        )
                    })
            });

            tree.push(album.or(artist), Node::Track(track));
        }

        tree
    }

    fn push(&mut self, parent: Option<NodeId>, node: Node) -> NodeId {
        let id = NodeId(self.entries.len());
        self.entries.push(Entry {
            node,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.entries[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.entries.get(id.0).map(|e| &e.node)
    }

    /// Children of a node, in insertion order (empty for unknown ids)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entries
            .get(id.0)
            .map(|e| e.children.as_slice())
            .unwrap_or_default()
    }

    /// Depth-first walk yielding `(depth, id)` pairs in display order
    pub fn walk(&self) -> Vec<(usize, NodeId)> {
        let mut out = Vec::with_capacity(self.entries.len());
        let mut stack: Vec<(usize, NodeId)> = self.roots.iter().rev().map(|&id| (0, id)).collect();

        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for &child in self.children(id).iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    /// Artist nodes whose name matches, ignoring case and surrounding spaces
    pub fn find_artists(&self, name: &str) -> Vec<NodeId> {
        self.find(|node| matches!(node, Node::Artist { name: n } if same_label(n, name)))
    }

    /// Album nodes whose name matches, under any artist
    pub fn find_albums(&self, name: &str) -> Vec<NodeId> {
        self.find(|node| matches!(node, Node::Album { name: n } if same_label(n, name)))
    }

    /// Track nodes carrying the given identifier
    pub fn find_tracks(&self, id: &str) -> Vec<NodeId> {
        self.find(|node| match node {
            Node::Track(track) => [&track.id, &track.store_id, &track.episode_id]
                .into_iter()
                .any(|candidate| candidate.as_deref() == Some(id)),
            _ => false,
        })
    }

    fn find(&self, predicate: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .map(|(_, id)| id)
            .filter(|&id| self.node(id).is_some_and(&predicate))
            .collect()
    }

    /// Tracks in tree order
    pub fn tracks(&self) -> Vec<&TrackRecord> {
        self.walk()
            .into_iter()
            .filter_map(|(_, id)| match self.node(id) {
                Some(Node::Track(track)) => Some(track),
                _ => None,
            })
            .collect()
    }
}

fn same_label(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Order tracks by album artist, album, disc, track number and title
///
/// Applied as successive stable sorts from the finest key to the coarsest,
/// so ties keep the order established by the finer keys.
pub fn sort_tracks(tracks: &mut [TrackRecord]) {
    tracks.sort_by(|a, b| a.title().cmp(b.title()));
    tracks.sort_by_key(|t| t.track_number.unwrap_or(0));
    tracks.sort_by_key(|t| t.disc_number.unwrap_or(0));
    tracks.sort_by(|a, b| a.album().cmp(b.album()));
    tracks.sort_by(|a, b| a.album_artist().cmp(b.album_artist()));
}
