//! Freshmaker node types.

use crate::schema::{NodeTypeDescriptor, PropertyKind, RelationshipDescriptor};

pub fn node_types() -> Vec<NodeTypeDescriptor> {
    vec![NodeTypeDescriptor::new("FreshmakerEvent")
        .unique_id_as("id_", "id")
        .property("event_type_id", PropertyKind::Integer)
        .property("message_id", PropertyKind::String)
        .property("state", PropertyKind::Integer)
        .property("state_name", PropertyKind::String)
        .property("state_reason", PropertyKind::String)
        .property("url", PropertyKind::String)
        .relationship(
            RelationshipDescriptor::outgoing("triggered_by_advisory", "TRIGGERED_BY", "Advisory").zero_or_one(),
        )
        .relationship(RelationshipDescriptor::outgoing(
            "triggered_container_builds",
            "TRIGGERED",
            "ContainerKojiBuild",
        ))]
}
