use super::collector::Collected;
use crate::config::Settings;
use crate::error::WizardError;
use crate::traits::{HttpClient, Prompt, Reply, UserInput};
use anyhow::Result;
use serde::Deserialize;
use std::cmp::Ordering;

/// Tag used whenever no explicit version is chosen
pub const LATEST: &str = "latest";

/// One record of the registry's tag listing; other fields are ignored
#[derive(Debug, Deserialize)]
struct TagRecord {
    name: String,
}

/// Tags grouped by their dot/dash separated segments
#[derive(Debug, Clone, Default)]
pub struct TagTree {
    root: TagNode,
}

#[derive(Debug, Clone, Default)]
struct TagNode {
    /// Tag text up to and including this segment
    prefix: String,
    /// Set when a tag ends at this node
    tag: Option<String>,
    children: Vec<(String, TagNode)>,
}

/// One line of a level in the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickEntry {
    /// A selectable tag
    Tag(String),

    /// A group of tags sharing `prefix`, entered by pushing `segment` onto the path
    Group {
        segment: String,
        prefix: String,
        count: usize,
    },
}

impl PickEntry {
    pub fn label(&self) -> String {
        match self {
            PickEntry::Tag(tag) => tag.clone(),
            PickEntry::Group { prefix, count, .. } => format!("{} › ({} tags)", prefix, count),
        }
    }
}

impl TagTree {
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = TagTree::default();
        for tag in tags {
            tree.insert(tag.as_ref());
        }
        tree.root.sort();
        tree
    }

    fn insert(&mut self, tag: &str) {
        let tag = tag.trim();
        // Pinned separately at the top level
        if tag.is_empty() || tag == LATEST {
            return;
        }

        let mut node = &mut self.root;
        let mut start = 0;
        for end in segment_ends(tag) {
            let segment = &tag[start..end];
            start = (end + 1).min(tag.len());

            let position = match node.children.iter().position(|(key, _)| key == segment) {
                Some(position) => position,
                None => {
                    node.children.push((
                        segment.to_string(),
                        TagNode {
                            prefix: tag[..end].to_string(),
                            ..TagNode::default()
                        },
                    ));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[position].1;
        }

        if node.tag.is_none() {
            node.tag = Some(tag.to_string());
        }
    }

    /// Number of distinct tags, not counting the pinned `latest`
    pub fn len(&self) -> usize {
        self.root.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries shown at `path`; `latest` leads the top level.
    ///
    /// Groups holding a single tag collapse into that tag.
    pub fn entries(&self, path: &[String]) -> Vec<PickEntry> {
        let Some(node) = self.root.find(path) else {
            return Vec::new();
        };

        let mut entries = Vec::new();
        if path.is_empty() {
            entries.push(PickEntry::Tag(LATEST.to_string()));
        } else if let Some(tag) = &node.tag {
            entries.push(PickEntry::Tag(tag.clone()));
        }

        for (segment, child) in &node.children {
            let count = child.count();
            if count == 1 {
                if let Some(tag) = child.first_tag() {
                    entries.push(PickEntry::Tag(tag.to_string()));
                }
            } else {
                entries.push(PickEntry::Group {
                    segment: segment.clone(),
                    prefix: child.prefix.clone(),
                    count,
                });
            }
        }

        entries
    }

    /// Tag text shared by everything below `path`
    pub fn prefix_of(&self, path: &[String]) -> Option<String> {
        self.root.find(path).map(|node| node.prefix.clone())
    }
}

impl TagNode {
    fn count(&self) -> usize {
        let below: usize = self.children.iter().map(|(_, c)| c.count()).sum();
        usize::from(self.tag.is_some()) + below
    }

    fn first_tag(&self) -> Option<&str> {
        self.tag
            .as_deref()
            .or_else(|| self.children.iter().find_map(|(_, c)| c.first_tag()))
    }

    fn find(&self, path: &[String]) -> Option<&TagNode> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self
                .children
                .iter()
                .find(|(key, _)| key == head)
                .and_then(|(_, child)| child.find(rest)),
        }
    }

    fn sort(&mut self) {
        self.children.sort_by(|(a, _), (b, _)| compare_segments(a, b));
        for (_, child) in &mut self.children {
            child.sort();
        }
    }
}

/// Byte offsets where each segment of `tag` ends
fn segment_ends(tag: &str) -> Vec<usize> {
    let mut ends: Vec<usize> = tag.match_indices(['.', '-']).map(|(i, _)| i).collect();
    ends.push(tag.len());
    ends
}

/// Numeric segments first, newest first; then the rest alphabetically
fn compare_segments(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => y.cmp(&x),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Variable that receives the chosen tag of `app`
pub fn version_variable(app: &str) -> String {
    let sanitized: String = app
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_version", sanitized)
}

/// List the tags published for `app`
pub fn fetch_tags(http: &dyn HttpClient, settings: &Settings, app: &str) -> Result<Vec<String>> {
    let url = settings.registry_url_for(app);
    let lookup_error = |message: String| WizardError::VersionLookup {
        app: app.to_string(),
        message,
    };

    let body = http
        .get_text(&url)
        .map_err(|e| lookup_error(format!("{:#}", e)))?;
    let records: Vec<TagRecord> = serde_json::from_str(&body)
        .map_err(|e| lookup_error(format!("invalid tag listing: {}", e)))?;

    Ok(records.into_iter().map(|r| r.name).collect())
}

/// Let the user pick a tag for `app`.
///
/// A failed lookup or a cancelled pick yields `latest`; only an interrupt is passed up.
pub fn select_version(
    http: &dyn HttpClient,
    input: &dyn UserInput,
    settings: &Settings,
    app: &str,
) -> Result<Collected> {
    let tags = match fetch_tags(http, settings, app) {
        Ok(tags) => tags,
        Err(e) => {
            log::warn!("{:#}; using '{}'", e, LATEST);
            return Ok(Collected::Value(LATEST.to_string()));
        }
    };

    let tree = TagTree::from_tags(&tags);
    if tree.is_empty() {
        return Ok(Collected::Value(LATEST.to_string()));
    }

    let text = format!("Please, select version of {}", app);
    match input.ask(Prompt::Pick { text: &text, tree: &tree })? {
        Reply::Value(tag) => Ok(Collected::Value(tag)),
        Reply::Interrupt => Ok(Collected::Interrupted),
        _ => Ok(Collected::Value(LATEST.to_string())),
    }
}
