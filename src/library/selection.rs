//! Turning a tree selection into an ordered download plan

use std::path::{Path, PathBuf};

use super::{LibraryTree, Node, NodeId, TrackRecord};
use crate::utils::sanitize_component;

/// One unit of progress in a download plan
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Make sure a directory exists before its tracks are downloaded
    Directory { label: String, path: PathBuf },
    /// Download one track into `dir`
    Track { record: TrackRecord, dir: PathBuf },
}

impl Step {
    pub fn label(&self) -> &str {
        match self {
            Step::Directory { label, .. } => label,
            Step::Track { record, .. } => record.title(),
        }
    }
}

/// Number of progress steps for a selection
///
/// Each selected node counts once, plus once per child and once per
/// grandchild.
pub fn count_steps(tree: &LibraryTree, selection: &[NodeId]) -> u64 {
    selection
        .iter()
        .map(|&selected| {
            1 + tree
                .children(selected)
                .iter()
                .map(|&child| 1 + tree.children(child).len() as u64)
                .sum::<u64>()
        })
        .sum()
}

/// Walk the selection and produce the steps to execute, in order
///
/// - artist: `base/<artist>`, then `base/<artist>/<album>` and its tracks
///   for every album below it
/// - album: `base/<album>` and its tracks
/// - track: downloaded straight into `base`
pub fn plan(tree: &LibraryTree, selection: &[NodeId], base: &Path) -> Vec<Step> {
    let mut steps = Vec::with_capacity(count_steps(tree, selection) as usize);

    for &selected in selection {
        match tree.node(selected) {
            Some(Node::Artist { name }) => {
                let artist_dir = base.join(sanitize_component(name));
                steps.push(Step::Directory {
                    label: name.clone(),
                    path: artist_dir.clone(),
                });

                for &child in tree.children(selected) {
                    match tree.node(child) {
                        Some(Node::Album { name }) => {
                            push_album(&mut steps, tree, child, name, &artist_dir)
                        }
                        Some(Node::Track(record)) => steps.push(Step::Track {
                            record: record.clone(),
                            dir: artist_dir.clone(),
                        }),
                        _ => {}
                    }
                }
            }
            Some(Node::Album { name }) => push_album(&mut steps, tree, selected, name, base),
            Some(Node::Track(record)) => steps.push(Step::Track {
                record: record.clone(),
                dir: base.to_path_buf(),
            }),
            None => {}
        }
    }

    steps
}

fn push_album(steps: &mut Vec<Step>, tree: &LibraryTree, album: NodeId, name: &str, parent: &Path) {
    let album_dir = parent.join(sanitize_component(name));
    steps.push(Step::Directory {
        label: name.to_string(),
        path: album_dir.clone(),
    });

    for &child in tree.children(album) {
        if let Some(Node::Track(record)) = tree.node(child) {
            steps.push(Step::Track {
                record: record.clone(),
                dir: album_dir.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tree::tests::track;

    fn two_by_two() -> LibraryTree {
        LibraryTree::build(vec![
            track("Artist", "One", 1, 1, "one-1"),
            track("Artist", "One", 1, 2, "one-2"),
            track("Artist", "Two", 1, 1, "two-1"),
            track("Artist", "Two", 1, 2, "two-2"),
        ])
    }

    #[test]
    fn test_count_steps_artist() {
        let tree = two_by_two();
        let artist = tree.find_artists("Artist");
        assert_eq!(count_steps(&tree, &artist), 7);
    }

    #[test]
    fn test_count_steps_mixed_selection() {
        let tree = two_by_two();
        let mut selection = tree.find_albums("Two");
        selection.extend(tree.find_tracks("Artist-One-1-1"));
        assert_eq!(count_steps(&tree, &selection), 3 + 1);
    }

    #[test]
    fn test_plan_artist_layout() {
        let tree = two_by_two();
        let base = Path::new("/music");
        let steps = plan(&tree, &tree.find_artists("Artist"), base);

        let labels: Vec<_> = steps.iter().map(Step::label).collect();
        assert_eq!(labels, ["Artist", "One", "one-1", "one-2", "Two", "two-1", "two-2"]);

        assert_eq!(
            steps[1],
            Step::Directory {
                label: "One".to_string(),
                path: PathBuf::from("/music/Artist/One"),
            }
        );
        match &steps[6] {
            Step::Track { dir, .. } => assert_eq!(dir, Path::new("/music/Artist/Two")),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_plan_album_and_track() {
        let tree = LibraryTree::build(vec![
            track("AC/DC", "Back=Black", 1, 1, "Hells Bells"),
            track("AC/DC", "Back=Black", 1, 2, "Shoot to Thrill"),
        ]);
        let base = Path::new("/music");

        let album_steps = plan(&tree, &tree.find_albums("Back=Black"), base);
        assert_eq!(album_steps.len(), 3);
        assert_eq!(
            album_steps[0],
            Step::Directory {
                label: "Back=Black".to_string(),
                path: PathBuf::from("/music/Back_Black"),
            }
        );

        let track_steps = plan(&tree, &tree.find_tracks("AC/DC-Back=Black-1-2"), base);
        match &track_steps[..] {
            [Step::Track { record, dir }] => {
                assert_eq!(record.title(), "Shoot to Thrill");
                assert_eq!(dir, base);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_plan_length_matches_count() {
        let mut loose = track("Artist", "", 1, 5, "loose");
        loose.album = None;
        let tree = LibraryTree::build(vec![
            loose,
            track("Artist", "One", 1, 1, "one-1"),
            track("Other", "Solo", 1, 1, "solo-1"),
        ]);

        let mut selection = tree.find_artists("Artist");
        selection.extend(tree.find_albums("Solo"));
        selection.extend(tree.find_tracks("Other-Solo-1-1"));

        let steps = plan(&tree, &selection, Path::new("base"));
        assert_eq!(steps.len() as u64, count_steps(&tree, &selection));

        let loose_step = steps.iter().find(|s| s.label() == "loose").unwrap();
        match loose_step {
            Step::Track { dir, .. } => assert_eq!(dir, Path::new("base/Artist")),
            other => panic!("unexpected step {:?}", other),
        }
    }
}
