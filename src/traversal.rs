//! Traversal of URL segments through an explicit registry of named nodes.
//!
//! The tree holds index nodes (which only route to named children) and
//! collection nodes (which are bound to one table).  Below a collection, any
//! segment that parses as an integer addresses a row; every other segment must
//! be a registered child.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

/// The tables a collection node can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// The `person` table.
    People,
    /// The `film` table.
    Films,
}

/// A path component: a name and the node above it.
#[derive(Debug, PartialEq, Eq)]
pub struct Node {
    parent: Option<Arc<Node>>,
    name: String,
}

impl Node {
    /// The root of a tree.
    pub fn root() -> Arc<Node> {
        Arc::new(Node {
            parent: None,
            name: String::new(),
        })
    }

    /// A node named `name` below `parent`.
    pub fn child(parent: &Arc<Node>, name: impl Into<String>) -> Arc<Node> {
        Arc::new(Node {
            parent: Some(Arc::clone(parent)),
            name: name.into(),
        })
    }

    /// The segment this node was reached by; empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node above this one.
    pub fn parent(&self) -> Option<&Arc<Node>> {
        self.parent.as_ref()
    }

    /// Every ancestor's name joined by `/`, with leading and trailing slashes.
    pub fn path(&self) -> String {
        match &self.parent {
            None => "/".to_string(),
            Some(parent) => format!("{}{}/", parent.path(), self.name),
        }
    }
}

/// What a path resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// An index node, such as the site root.
    Index(Arc<Node>),
    /// A collection bound to a table.
    Collection(TableKind, Arc<Node>),
    /// One row of a table, addressed by id below its collection.
    Row(TableKind, Arc<Node>, i64),
}

impl Located {
    /// The node the path ended on.
    pub fn node(&self) -> &Arc<Node> {
        match self {
            Located::Index(node) | Located::Collection(_, node) | Located::Row(_, node, _) => node,
        }
    }
}

/// A path segment that names nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No child is registered under this segment.
    #[error("no resource named {0:?}")]
    NotFound(String),
}

/// Handle to a node registered in a [`ResourceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Entry {
    node: Arc<Node>,
    table: Option<TableKind>,
    children: BTreeMap<String, usize>,
}

/// The registry of named nodes a request path is resolved against.
#[derive(Debug)]
pub struct ResourceTree {
    entries: Vec<Entry>,
}

impl Default for ResourceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTree {
    /// A tree holding only the root index.
    pub fn new() -> Self {
        Self {
            entries: vec![Entry {
                node: Node::root(),
                table: None,
                children: BTreeMap::new(),
            }],
        }
    }

    /// `/` → `api` → `v1` → {`people`, `films`}.
    pub fn catalog() -> Self {
        let mut tree = Self::new();
        let api = tree.register_index(tree.root(), "api");
        let v1 = tree.register_index(api, "v1");
        tree.register_collection(v1, "people", TableKind::People);
        tree.register_collection(v1, "films", TableKind::Films);
        tree
    }

    /// The root index.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The node behind `id`.
    pub fn node(&self, id: NodeId) -> &Arc<Node> {
        &self.entries[id.0].node
    }

    /// The first collection registered for `table`.
    pub fn collection(&self, table: TableKind) -> Option<&Arc<Node>> {
        self.entries
            .iter()
            .find(|entry| entry.table == Some(table))
            .map(|entry| &entry.node)
    }

    /// Registers an index node named `name` below `parent`.
    pub fn register_index(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.register(parent, name, None)
    }

    /// Registers a collection bound to `table` below `parent`.
    pub fn register_collection(&mut self, parent: NodeId, name: &str, table: TableKind) -> NodeId {
        self.register(parent, name, Some(table))
    }

    fn register(&mut self, parent: NodeId, name: &str, table: Option<TableKind>) -> NodeId {
        let node = Node::child(&self.entries[parent.0].node, name);
        let index = self.entries.len();
        self.entries.push(Entry {
            node,
            table,
            children: BTreeMap::new(),
        });
        self.entries[parent.0]
            .children
            .insert(name.to_string(), index);
        NodeId(index)
    }

    /// Resolves path segments from the root; empty segments are skipped.
    pub fn resolve<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Located, LookupError> {
        let mut current = 0;
        let mut row: Option<(Arc<Node>, i64)> = None;
        for segment in segments.into_iter().filter(|s| !s.is_empty()) {
            if row.is_some() {
                return Err(LookupError::NotFound(segment.to_string()));
            }
            let entry = &self.entries[current];
            if let Some(&child) = entry.children.get(segment) {
                current = child;
                continue;
            }
            match (entry.table, segment.parse::<i64>()) {
                (Some(_), Ok(id)) => row = Some((Node::child(&entry.node, segment), id)),
                _ => return Err(LookupError::NotFound(segment.to_string())),
            }
        }
        let entry = &self.entries[current];
        Ok(match (entry.table, row) {
            (Some(table), Some((node, id))) => Located::Row(table, node, id),
            (Some(table), None) => Located::Collection(table, Arc::clone(&entry.node)),
            (None, _) => Located::Index(Arc::clone(&entry.node)),
        })
    }

    /// Resolves a URL path such as `/api/v1/people/3/`.
    pub fn resolve_path(&self, path: &str) -> Result<Located, LookupError> {
        self.resolve(path.split('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_paths() {
        let root = Node::root();
        assert_eq!(root.path(), "/");
        let api = Node::child(&root, "api");
        let v1 = Node::child(&api, "v1");
        assert_eq!(Node::child(&v1, "films").path(), "/api/v1/films/");
        assert_eq!(v1.parent().map(|p| p.name()), Some("api"));
    }

    #[test]
    fn resolves_root_and_collections() {
        let tree = ResourceTree::catalog();
        assert!(matches!(tree.resolve_path("/"), Ok(Located::Index(_))));
        assert!(matches!(tree.resolve_path("/api/v1"), Ok(Located::Index(_))));
        match tree.resolve_path("/api/v1/people/").unwrap() {
            Located::Collection(TableKind::People, node) => {
                assert_eq!(node.path(), "/api/v1/people/")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn integer_segment_yields_row() {
        let tree = ResourceTree::catalog();
        match tree.resolve_path("/api/v1/films/42").unwrap() {
            Located::Row(TableKind::Films, node, id) => {
                assert_eq!(id, 42);
                assert_eq!(node.path(), "/api/v1/films/42/");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            tree.resolve_path("/api/v1/films/0/"),
            Ok(Located::Row(TableKind::Films, _, 0))
        ));
    }

    #[test]
    fn unknown_segments_are_not_found() {
        let tree = ResourceTree::catalog();
        assert_eq!(
            tree.resolve_path("/api/v1/films/abc"),
            Err(LookupError::NotFound("abc".to_string()))
        );
        assert_eq!(
            tree.resolve_path("/api/v2/"),
            Err(LookupError::NotFound("v2".to_string()))
        );
        assert_eq!(
            tree.resolve_path("/api/v1/films/1/cast"),
            Err(LookupError::NotFound("cast".to_string()))
        );
        assert_eq!(
            tree.resolve_path("/3"),
            Err(LookupError::NotFound("3".to_string()))
        );
    }

    #[test]
    fn collection_lookup_by_table() {
        let tree = ResourceTree::catalog();
        let films = tree.collection(TableKind::Films).unwrap();
        assert_eq!(films.path(), "/api/v1/films/");
        assert!(ResourceTree::new().collection(TableKind::People).is_none());
    }

    #[test]
    fn empty_segments_are_skipped() {
        let tree = ResourceTree::catalog();
        assert!(matches!(
            tree.resolve_path("//api//v1/people//7//"),
            Ok(Located::Row(TableKind::People, _, 7))
        ));
    }

    #[test]
    fn collections_route_to_registered_children() {
        let mut tree = ResourceTree::catalog();
        let Located::Collection(_, _) = tree.resolve_path("/api/v1/people").unwrap() else {
            panic!("people is a collection");
        };
        let people = NodeId(3);
        assert_eq!(tree.node(people).path(), "/api/v1/people/");
        tree.register_index(people, "search");
        assert!(matches!(
            tree.resolve_path("/api/v1/people/search/"),
            Ok(Located::Index(_))
        ));
    }
}
