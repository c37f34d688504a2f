//! Schema registry for the artifact graph.
//!
//! The registry is the single source of truth for what a node type looks
//! like: which properties it carries, which one is its unique external id,
//! and which relationships it declares. It is built once at startup from a
//! list of [`NodeTypeDescriptor`]s and is read-only afterwards.
//!
//! # Lookups
//!
//! - [`SchemaRegistry::describe`] - a node type by exact name
//! - [`SchemaRegistry::resolve_resource`] - a node type by case-insensitive
//!   resource name, as used in API paths (`kojibuild` -> `KojiBuild`)
//! - [`SchemaRegistry::relationship_for`] - the relationship an observed edge
//!   belongs to, keyed by `(edge label, direction, far node type)`
//!
//! Subtypes (`ContainerKojiBuild` extends `KojiBuild`) inherit every property
//! and relationship of their parent, and an edge to a subtype matches a
//! relationship declared against any of its ancestors.

mod descriptor;
mod error;
pub mod ontology;

pub use descriptor::{
    Cardinality, Direction, NodeTypeDescriptor, PropertyDescriptor, PropertyKind,
    RelationshipDescriptor,
};
pub use error::SchemaError;

use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EdgeKey {
    label: String,
    direction: Direction,
    target: String,
}

/// A registered node type with inherited members flattened in.
#[derive(Debug, Clone)]
pub struct NodeType {
    descriptor: NodeTypeDescriptor,
    ancestors: Vec<String>,
    unique: usize,
    edge_index: HashMap<EdgeKey, usize>,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Declared properties, inherited ones first.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.descriptor.properties
    }

    /// Declared relationships, inherited ones first.
    pub fn relationships(&self) -> &[RelationshipDescriptor] {
        &self.descriptor.relationships
    }

    /// The property holding the unique external id.
    pub fn unique_property(&self) -> &PropertyDescriptor {
        &self.descriptor.properties[self.unique]
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.descriptor.properties.iter().find(|p| p.name == name)
    }

    pub fn relationship(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.descriptor.relationships.iter().find(|r| r.name == name)
    }

    /// Parent, grandparent, and so on.
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    fn lookup(&self, label: &str, direction: Direction, target: &str) -> Option<&RelationshipDescriptor> {
        let key = EdgeKey {
            label: label.to_string(),
            direction,
            target: target.to_string(),
        };
        self.edge_index
            .get(&key)
            .map(|&index| &self.descriptor.relationships[index])
    }
}

/// Immutable registry of every node type known to the system.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    types: BTreeMap<String, NodeType>,
    by_resource: HashMap<String, String>,
}

impl SchemaRegistry {
    /// Build and validate a registry from type descriptors.
    pub fn new(descriptors: Vec<NodeTypeDescriptor>) -> Result<Self, SchemaError> {
        let mut declared: BTreeMap<String, NodeTypeDescriptor> = BTreeMap::new();
        for descriptor in descriptors {
            if declared.contains_key(&descriptor.name) {
                return Err(SchemaError::DuplicateType(descriptor.name));
            }
            declared.insert(descriptor.name.clone(), descriptor);
        }

        let mut types = BTreeMap::new();
        for name in declared.keys() {
            let ancestors = Self::ancestry(&declared, name)?;
            let flattened = Self::flatten(&declared, name, &ancestors);
            let node_type = Self::index(flattened, ancestors, &declared)?;
            types.insert(name.clone(), node_type);
        }

        let by_resource = types
            .keys()
            .map(|name| (name.to_lowercase(), name.clone()))
            .collect();

        Ok(Self { types, by_resource })
    }

    /// The registry for the built-in release-pipeline ontology.
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::new(ontology::node_types())
    }

    /// Describe a node type by exact name.
    pub fn describe(&self, name: &str) -> Result<&NodeType, SchemaError> {
        self.types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&NodeType> {
        self.types.get(name)
    }

    /// Find a node type by resource name, ignoring case.
    pub fn resolve_resource(&self, resource: &str) -> Option<&NodeType> {
        self.by_resource
            .get(&resource.to_lowercase())
            .and_then(|name| self.types.get(name))
    }

    /// Whether `node_type` is `expected` or one of its subtypes.
    pub fn is_a(&self, node_type: &str, expected: &str) -> bool {
        node_type == expected
            || self
                .types
                .get(node_type)
                .is_some_and(|t| t.ancestors.iter().any(|a| a == expected))
    }

    /// Every registered type that is `node_type` or one of its subtypes.
    pub fn subtypes_of(&self, node_type: &str) -> Vec<&str> {
        self.types
            .keys()
            .filter(|name| self.is_a(name, node_type))
            .map(String::as_str)
            .collect()
    }

    /// Resolve an observed edge to the relationship it belongs to.
    ///
    /// `direction` is the edge direction as seen from a node of `node_type`.
    /// The far node's own type is tried first, then each of its ancestors.
    /// Returns `None` when the combination is declared nowhere.
    pub fn relationship_for(
        &self,
        node_type: &str,
        label: &str,
        direction: Direction,
        far_type: &str,
    ) -> Option<&RelationshipDescriptor> {
        let declaring = self.types.get(node_type)?;
        let far = self.types.get(far_type)?;

        std::iter::once(far.name())
            .chain(far.ancestors.iter().map(String::as_str))
            .find_map(|candidate| declaring.lookup(label, direction, candidate))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn ancestry(
        declared: &BTreeMap<String, NodeTypeDescriptor>,
        name: &str,
    ) -> Result<Vec<String>, SchemaError> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::from([name.to_string()]);
        let mut current = &declared[name];

        while let Some(parent) = current.parent.as_deref() {
            if !seen.insert(parent.to_string()) {
                return Err(SchemaError::InheritanceCycle(name.to_string()));
            }
            let next = declared.get(parent).ok_or_else(|| SchemaError::UnknownParent {
                node_type: current.name.clone(),
                parent: parent.to_string(),
            })?;
            ancestors.push(parent.to_string());
            current = next;
        }

        Ok(ancestors)
    }

    fn flatten(
        declared: &BTreeMap<String, NodeTypeDescriptor>,
        name: &str,
        ancestors: &[String],
    ) -> NodeTypeDescriptor {
        let own = &declared[name];
        let mut flattened = NodeTypeDescriptor::new(name);
        flattened.parent = own.parent.clone();

        // Root first so that subtypes can redeclare inherited members.
        let lineage = ancestors.iter().rev().map(|a| &declared[a]).chain(std::iter::once(own));
        for descriptor in lineage {
            for property in &descriptor.properties {
                match flattened.properties.iter_mut().find(|p| p.name == property.name) {
                    Some(existing) => *existing = property.clone(),
                    None => flattened.properties.push(property.clone()),
                }
            }
            for relationship in &descriptor.relationships {
                match flattened
                    .relationships
                    .iter_mut()
                    .find(|r| r.name == relationship.name)
                {
                    Some(existing) => *existing = relationship.clone(),
                    None => flattened.relationships.push(relationship.clone()),
                }
            }
        }

        flattened
    }

    fn index(
        descriptor: NodeTypeDescriptor,
        ancestors: Vec<String>,
        declared: &BTreeMap<String, NodeTypeDescriptor>,
    ) -> Result<NodeType, SchemaError> {
        let mut unique = descriptor
            .properties
            .iter()
            .enumerate()
            .filter(|(_, p)| p.unique)
            .map(|(i, _)| i);
        let unique_index = unique
            .next()
            .ok_or_else(|| SchemaError::MissingUniqueId(descriptor.name.clone()))?;
        if unique.next().is_some() {
            return Err(SchemaError::MultipleUniqueIds(descriptor.name.clone()));
        }

        let mut edge_index: HashMap<EdgeKey, usize> = HashMap::new();
        for (i, relationship) in descriptor.relationships.iter().enumerate() {
            if !declared.contains_key(&relationship.target) {
                return Err(SchemaError::UnknownTarget {
                    node_type: descriptor.name.clone(),
                    relationship: relationship.name.clone(),
                    target: relationship.target.clone(),
                });
            }

            let directions: &[Direction] = match relationship.direction {
                Direction::Either => &[Direction::Outgoing, Direction::Incoming],
                Direction::Outgoing => &[Direction::Outgoing],
                Direction::Incoming => &[Direction::Incoming],
            };

            for &direction in directions {
                let key = EdgeKey {
                    label: relationship.edge_label.clone(),
                    direction,
                    target: relationship.target.clone(),
                };
                if let Some(&existing) = edge_index.get(&key) {
                    let first = &descriptor.relationships[existing];
                    if first.name != relationship.name {
                        return Err(SchemaError::AmbiguousRelationship {
                            node_type: descriptor.name.clone(),
                            label: key.label,
                            direction: direction.to_string(),
                            target: key.target,
                            first: first.name.clone(),
                            second: relationship.name.clone(),
                        });
                    }
                }
                edge_index.insert(key, i);
            }
        }

        Ok(NodeType {
            descriptor,
            ancestors,
            unique: unique_index,
            edge_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_types() -> Vec<NodeTypeDescriptor> {
        vec![
            NodeTypeDescriptor::new("Build")
                .unique_id_as("id_", "id")
                .property("name", PropertyKind::String)
                .relationship(RelationshipDescriptor::outgoing("owner", "OWNED_BY", "User").zero_or_one()),
            NodeTypeDescriptor::new("ContainerBuild")
                .extends("Build")
                .property("original_nvr", PropertyKind::String),
            NodeTypeDescriptor::new("User")
                .unique_id("username")
                .relationship(RelationshipDescriptor::incoming("builds", "OWNED_BY", "Build"))
                .relationship(RelationshipDescriptor::either("peers", "KNOWS", "User")),
        ]
    }

    #[test]
    fn test_subtype_inherits_members() {
        let registry = SchemaRegistry::new(build_types()).unwrap();
        let container = registry.describe("ContainerBuild").unwrap();

        assert_eq!(container.unique_property().wire_name, "id");
        assert!(container.property("name").is_some());
        assert!(container.property("original_nvr").is_some());
        assert!(container.relationship("owner").is_some());
        assert_eq!(container.ancestors(), ["Build".to_string()]);
    }

    #[test]
    fn test_relationship_lookup_walks_far_ancestors() {
        let registry = SchemaRegistry::new(build_types()).unwrap();

        let rel = registry
            .relationship_for("User", "OWNED_BY", Direction::Incoming, "ContainerBuild")
            .unwrap();
        assert_eq!(rel.name, "builds");

        assert!(registry
            .relationship_for("User", "OWNED_BY", Direction::Outgoing, "Build")
            .is_none());
    }

    #[test]
    fn test_either_direction_indexed_both_ways() {
        let registry = SchemaRegistry::new(build_types()).unwrap();

        for direction in [Direction::Outgoing, Direction::Incoming] {
            let rel = registry
                .relationship_for("User", "KNOWS", direction, "User")
                .unwrap();
            assert_eq!(rel.name, "peers");
        }
    }

    #[test]
    fn test_resolve_resource_ignores_case() {
        let registry = SchemaRegistry::new(build_types()).unwrap();
        assert_eq!(registry.resolve_resource("containerbuild").unwrap().name(), "ContainerBuild");
        assert!(registry.resolve_resource("advisory").is_none());
    }

    #[test]
    fn test_ambiguous_relationship_rejected() {
        let types = vec![
            NodeTypeDescriptor::new("Bug")
                .unique_id("id")
                .relationship(RelationshipDescriptor::incoming("fixed_by", "RESOLVED", "Bug"))
                .relationship(RelationshipDescriptor::either("related", "RESOLVED", "Bug")),
        ];

        let err = SchemaRegistry::new(types).unwrap_err();
        assert!(matches!(err, SchemaError::AmbiguousRelationship { .. }));
    }

    #[test]
    fn test_unknown_target_and_parent_rejected() {
        let bad_target = vec![NodeTypeDescriptor::new("Bug")
            .unique_id("id")
            .relationship(RelationshipDescriptor::outgoing("owner", "OWNED_BY", "Nobody"))];
        assert!(matches!(
            SchemaRegistry::new(bad_target),
            Err(SchemaError::UnknownTarget { .. })
        ));

        let bad_parent = vec![NodeTypeDescriptor::new("Bug").unique_id("id").extends("Issue")];
        assert!(matches!(
            SchemaRegistry::new(bad_parent),
            Err(SchemaError::UnknownParent { .. })
        ));
    }

    #[test]
    fn test_unique_id_required_exactly_once() {
        let missing = vec![NodeTypeDescriptor::new("Bug").property("id", PropertyKind::String)];
        assert!(matches!(SchemaRegistry::new(missing), Err(SchemaError::MissingUniqueId(_))));

        let doubled = vec![NodeTypeDescriptor::new("Bug").unique_id("id").unique_id("alias")];
        assert!(matches!(SchemaRegistry::new(doubled), Err(SchemaError::MultipleUniqueIds(_))));
    }

    #[test]
    fn test_inheritance_cycle_rejected() {
        let types = vec![
            NodeTypeDescriptor::new("A").unique_id("id").extends("B"),
            NodeTypeDescriptor::new("B").unique_id("id").extends("A"),
        ];
        assert!(matches!(SchemaRegistry::new(types), Err(SchemaError::InheritanceCycle(_))));
    }
}
