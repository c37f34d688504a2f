//! Koji node types.

use crate::schema::{NodeTypeDescriptor, PropertyKind, RelationshipDescriptor};

pub fn node_types() -> Vec<NodeTypeDescriptor> {
    vec![build(), container_build(), task(), tag()]
}

fn build() -> NodeTypeDescriptor {
    NodeTypeDescriptor::new("KojiBuild")
        .unique_id_as("id_", "id")
        .property("completion_time", PropertyKind::Timestamp)
        .property("creation_time", PropertyKind::Timestamp)
        .property("epoch", PropertyKind::String)
        .property("extra", PropertyKind::String)
        .property("name", PropertyKind::String)
        .property("release", PropertyKind::String)
        .property("start_time", PropertyKind::Timestamp)
        .property("state", PropertyKind::Integer)
        .property("version", PropertyKind::String)
        .relationship(RelationshipDescriptor::incoming("advisories", "ATTACHED", "Advisory"))
        .relationship(RelationshipDescriptor::outgoing("commit", "BUILT_FROM", "DistGitCommit").zero_or_one())
        .relationship(RelationshipDescriptor::outgoing("owner", "OWNED_BY", "User").zero_or_one())
        .relationship(RelationshipDescriptor::incoming("tags", "CONTAINS", "KojiTag"))
        .relationship(RelationshipDescriptor::incoming("tasks", "TRIGGERED", "KojiTask"))
}

fn container_build() -> NodeTypeDescriptor {
    NodeTypeDescriptor::new("ContainerKojiBuild")
        .extends("KojiBuild")
        .property("original_nvr", PropertyKind::String)
        .relationship(
            RelationshipDescriptor::incoming("triggered_by_freshmaker_event", "TRIGGERED", "FreshmakerEvent")
                .zero_or_one(),
        )
}

fn task() -> NodeTypeDescriptor {
    NodeTypeDescriptor::new("KojiTask")
        .unique_id_as("id_", "id")
        .property("arch", PropertyKind::String)
        .property("completion_time", PropertyKind::Timestamp)
        .property("create_time", PropertyKind::Timestamp)
        .property("method", PropertyKind::String)
        .property("priority", PropertyKind::Integer)
        .property("start_time", PropertyKind::Timestamp)
        .property("state", PropertyKind::Integer)
        .property("weight", PropertyKind::Float)
        .relationship(RelationshipDescriptor::outgoing("builds", "TRIGGERED", "KojiBuild"))
        // Cardinality is enforced on `parent`; `children` is its read-only mirror
        .relationship(RelationshipDescriptor::incoming("children", "PARENT", "KojiTask"))
        .relationship(RelationshipDescriptor::outgoing("owner", "OWNED_BY", "User"))
        .relationship(RelationshipDescriptor::outgoing("parent", "PARENT", "KojiTask").zero_or_one())
}

fn tag() -> NodeTypeDescriptor {
    NodeTypeDescriptor::new("KojiTag")
        .unique_id_as("id_", "id")
        .property("name", PropertyKind::String)
        .relationship(RelationshipDescriptor::outgoing("builds", "CONTAINS", "KojiBuild"))
}
