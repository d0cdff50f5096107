//! Construct tree
//!
//! A [`Scope`] owns an ordered list of children, each either a nested scope
//! or a [`ResourceNode`]. There is no index by kind: discovery always walks
//! the tree with [`Scope::find_all`] and filters the result.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{ChartError, Result};
use crate::resource::{Resource, ResourceKind, ResourceNode, ResourceRef};

/// Maximum length of a Kubernetes DNS label
const MAX_NAME_LEN: usize = 63;

/// Number of hex characters of the path hash appended to generated names
const HASH_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq)]
enum Child {
    Scope(Scope),
    Resource(ResourceNode),
}

impl Child {
    fn id(&self) -> &str {
        match self {
            Child::Scope(scope) => scope.id(),
            Child::Resource(node) => node.id(),
        }
    }
}

/// A node visited by [`Scope::find_all`]
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Scope(&'a Scope),
    Resource(&'a ResourceNode),
}

impl<'a> Node<'a> {
    pub fn as_resource(self) -> Option<&'a ResourceNode> {
        match self {
            Node::Resource(node) => Some(node),
            Node::Scope(_) => None,
        }
    }
}

/// A named subtree of resources
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    id: String,
    path: Vec<String>,
    children: Vec<Child>,
}

impl Scope {
    /// Create a root scope
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            path: vec![id.clone()],
            id,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `/`-joined construct path
    pub fn path(&self) -> String {
        self.path.join("/")
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Register a resource under this scope
    ///
    /// A missing `metadata.name` is replaced by a name generated from the
    /// construct path. Fails if a sibling already uses `id` or if a resource
    /// of the same kind and name exists in this scope's subtree.
    ///
    /// Only the subtree is checked here: a nested scope can still register a
    /// name its parent already uses. Chart-wide uniqueness is enforced by
    /// [`Scope::validate`], which runs before synthesis.
    pub fn add(
        &mut self,
        id: impl Into<String>,
        resource: impl Into<Resource>,
    ) -> Result<ResourceRef> {
        let id = id.into();
        self.ensure_unique_id(&id)?;

        let path = self.child_path(&id);
        let mut resource = resource.into();
        let metadata = resource.metadata_mut();
        if metadata.name.as_deref().is_none_or(str::is_empty) {
            metadata.name = Some(generate_name(&path));
        }

        let node = ResourceNode::new(id, path.join("/"), resource);
        let reference = node.to_ref();
        if self
            .resources_of_kind(reference.kind)
            .any(|existing| existing.name() == reference.name)
        {
            return Err(ChartError::DuplicateName {
                kind: reference.kind.to_string(),
                name: reference.name,
            });
        }

        debug!(path = node.path(), resource = %reference, "registered resource");
        self.children.push(Child::Resource(node));
        Ok(reference)
    }

    /// Create a nested scope and return it for population
    pub fn add_scope(&mut self, id: impl Into<String>) -> Result<&mut Scope> {
        let id = id.into();
        self.ensure_unique_id(&id)?;

        let scope = Scope {
            path: self.child_path(&id),
            id,
            children: Vec::new(),
        };
        self.children.push(Child::Scope(scope));
        match self.children.last_mut() {
            Some(Child::Scope(scope)) => Ok(scope),
            _ => unreachable!("scope was just pushed"),
        }
    }

    /// Depth-first, pre-order walk of this scope and every descendant
    ///
    /// The walk starts with the scope itself and is lazy; call again to
    /// restart it.
    pub fn find_all(&self) -> Walk<'_> {
        Walk {
            root: Some(self),
            stack: Vec::new(),
        }
    }

    /// Every resource in this subtree, in traversal order
    pub fn resources(&self) -> impl Iterator<Item = &ResourceNode> {
        self.find_all().filter_map(Node::as_resource)
    }

    /// Every resource of `kind` in this subtree, in traversal order
    pub fn resources_of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceNode> {
        self.resources().filter(move |node| node.kind() == kind)
    }

    /// Mutable counterpart of [`Scope::resources`]
    pub fn resources_mut(&mut self) -> ResourcesMut<'_> {
        ResourcesMut {
            stack: vec![self.children.iter_mut()],
        }
    }

    /// Look up a resource by kind and name anywhere in this subtree
    pub fn find(&self, kind: ResourceKind, name: &str) -> Option<&ResourceNode> {
        self.resources_of_kind(kind).find(|node| node.name() == name)
    }

    /// Check that no two resources of the same kind share a name
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for node in self.resources() {
            if !seen.insert((node.kind(), node.name())) {
                return Err(ChartError::DuplicateName {
                    kind: node.kind().to_string(),
                    name: node.name().to_string(),
                });
            }
        }
        Ok(())
    }

    fn ensure_unique_id(&self, id: &str) -> Result<()> {
        if self.children.iter().any(|child| child.id() == id) {
            return Err(ChartError::DuplicateId {
                scope: self.path(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn child_path(&self, id: &str) -> Vec<String> {
        let mut path = self.path.clone();
        path.push(id.to_string());
        path
    }
}

/// Iterator returned by [`Scope::find_all`]
pub struct Walk<'a> {
    root: Option<&'a Scope>,
    stack: Vec<std::slice::Iter<'a, Child>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Node<'a>> {
        if let Some(root) = self.root.take() {
            self.stack.push(root.children.iter());
            return Some(Node::Scope(root));
        }

        while let Some(children) = self.stack.last_mut() {
            match children.next() {
                Some(Child::Scope(scope)) => {
                    self.stack.push(scope.children.iter());
                    return Some(Node::Scope(scope));
                }
                Some(Child::Resource(node)) => return Some(Node::Resource(node)),
                None => {
                    self.stack.pop();
                }
            }
        }

        None
    }
}

/// Iterator returned by [`Scope::resources_mut`]
pub struct ResourcesMut<'a> {
    stack: Vec<std::slice::IterMut<'a, Child>>,
}

impl<'a> Iterator for ResourcesMut<'a> {
    type Item = &'a mut ResourceNode;

    fn next(&mut self) -> Option<&'a mut ResourceNode> {
        while let Some(children) = self.stack.last_mut() {
            match children.next() {
                Some(Child::Scope(scope)) => self.stack.push(scope.children.iter_mut()),
                Some(Child::Resource(node)) => return Some(node),
                None => {
                    self.stack.pop();
                }
            }
        }

        None
    }
}

/// Generate a DNS-label name from a construct path
///
/// Components are lower-cased, stripped to `[a-z0-9-]` and joined with `-`,
/// followed by a short hash of the full path so distinct paths never collide.
fn generate_name(path: &[String]) -> String {
    let digest = hex::encode(Sha256::digest(path.join("/").as_bytes()));
    let hash = &digest[..HASH_LEN];

    let readable = path
        .iter()
        .map(|component| {
            component
                .to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
        })
        .map(|component| component.trim_matches('-').to_string())
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    let budget = MAX_NAME_LEN - HASH_LEN - 1;
    let readable = readable[..readable.len().min(budget)].trim_end_matches('-');

    if readable.is_empty() {
        hash.to_string()
    } else {
        format!("{readable}-{hash}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ConfigMap, Service};
    use k8s_openapi::api::networking::v1::Ingress;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn service(name: &str) -> Service {
        Service {
            metadata: meta(name),
            ..Default::default()
        }
    }

    fn ingress(name: &str) -> Ingress {
        Ingress {
            metadata: meta(name),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_returns_resolved_name() {
        let mut scope = Scope::new("test");
        let reference = scope.add("service", service("orders")).unwrap();

        assert_eq!(reference.kind, ResourceKind::Service);
        assert_eq!(reference.name, "orders");
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_generated_name_for_unnamed_resource() {
        let mut scope = Scope::new("test");
        let reference = scope.add("vars", ConfigMap::default()).unwrap();

        assert!(reference.name.starts_with("test-vars-"));
        assert_eq!(reference.name.len(), "test-vars-".len() + HASH_LEN);
        // stable across builds
        let mut again = Scope::new("test");
        assert_eq!(again.add("vars", ConfigMap::default()).unwrap(), reference);
    }

    #[test]
    fn test_generated_name_sanitized() {
        let name = generate_name(&["My_Chart".to_string(), "Web.Config".to_string()]);
        assert!(name.starts_with("mychart-webconfig-"));
        assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn test_generated_name_length_capped() {
        let long = "x".repeat(100);
        let name = generate_name(&["chart".to_string(), long]);
        assert!(name.len() <= MAX_NAME_LEN);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut scope = Scope::new("test");
        scope.add("service", service("a")).unwrap();

        let err = scope.add("service", service("b")).unwrap_err();
        assert!(matches!(err, ChartError::DuplicateId { ref id, .. } if id == "service"));
    }

    #[test]
    fn test_duplicate_name_same_kind_rejected() {
        let mut scope = Scope::new("test");
        scope.add("service", service("orders")).unwrap();

        let err = scope.add("other", service("orders")).unwrap_err();
        assert!(matches!(err, ChartError::DuplicateName { ref kind, .. } if kind == "Service"));
    }

    #[test]
    fn test_same_name_different_kind_allowed() {
        let mut scope = Scope::new("test");
        scope.add("service", service("orders")).unwrap();
        scope.add("ingress", ingress("orders")).unwrap();
        assert!(scope.validate().is_ok());
    }

    #[test]
    fn test_find_all_is_preorder_and_recursive() {
        let mut scope = Scope::new("root");
        scope.add("a", service("a")).unwrap();
        let nested = scope.add_scope("nested").unwrap();
        nested.add("b", service("b")).unwrap();
        let deeper = nested.add_scope("deeper").unwrap();
        deeper.add("c", ingress("c")).unwrap();
        scope.add("d", ingress("d")).unwrap();

        let visited: Vec<String> = scope
            .find_all()
            .map(|node| match node {
                Node::Scope(s) => format!("scope:{}", s.path()),
                Node::Resource(r) => format!("resource:{}", r.path()),
            })
            .collect();

        assert_eq!(
            visited,
            vec![
                "scope:root",
                "resource:root/a",
                "scope:root/nested",
                "resource:root/nested/b",
                "scope:root/nested/deeper",
                "resource:root/nested/deeper/c",
                "resource:root/d",
            ]
        );
    }

    #[test]
    fn test_find_all_restartable() {
        let mut scope = Scope::new("root");
        scope.add("a", service("a")).unwrap();
        scope.add_scope("nested").unwrap().add("b", service("b")).unwrap();

        assert_eq!(scope.find_all().count(), 4);
        assert_eq!(scope.find_all().count(), 4);
    }

    #[test]
    fn test_empty_scope_yields_itself() {
        let scope = Scope::new("root");
        let nodes: Vec<_> = scope.find_all().collect();
        assert_eq!(nodes.len(), 1);
        assert!(matches!(nodes[0], Node::Scope(s) if s.id() == "root"));
        assert_eq!(scope.resources().count(), 0);
    }

    #[test]
    fn test_resources_of_kind_filters() {
        let mut scope = Scope::new("root");
        scope.add("svc", service("a")).unwrap();
        scope.add_scope("nested").unwrap().add("ing", ingress("b")).unwrap();

        let names: Vec<_> = scope
            .resources_of_kind(ResourceKind::Ingress)
            .map(ResourceNode::name)
            .collect();
        assert_eq!(names, vec!["b"]);
        assert!(scope.find(ResourceKind::Service, "a").is_some());
        assert!(scope.find(ResourceKind::Service, "b").is_none());
    }

    #[test]
    fn test_resources_mut_reaches_nested_nodes() {
        let mut scope = Scope::new("root");
        scope.add("a", service("a")).unwrap();
        scope.add_scope("nested").unwrap().add("b", service("b")).unwrap();

        for node in scope.resources_mut() {
            node.add_label("seen", "yes");
        }

        assert!(scope.resources().all(|node| node.labels().unwrap()["seen"] == "yes"));
    }

    #[test]
    fn test_validate_detects_duplicates_across_scopes() {
        let mut scope = Scope::new("root");
        scope.add("a", service("dup")).unwrap();
        // nested scopes only see their own subtree at registration time
        scope.add_scope("nested").unwrap().add("b", service("dup")).unwrap();

        let err = scope.validate().unwrap_err();
        assert!(err.to_string().contains("dup"));
    }
}
