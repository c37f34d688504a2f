//! Errata Tool node types.

use crate::schema::{NodeTypeDescriptor, PropertyKind, RelationshipDescriptor};

/// Workflow states an advisory moves through.
const ADVISORY_STATES: &[&str] = &[
    "NEW_FILES",
    "QE",
    "REL_PREP",
    "PUSH_READY",
    "IN_PUSH",
    "SHIPPED_LIVE",
    "DROPPED_NO_SHIP",
];

pub fn node_types() -> Vec<NodeTypeDescriptor> {
    let states = PropertyKind::Enum(ADVISORY_STATES.iter().map(|s| s.to_string()).collect());

    vec![
        NodeTypeDescriptor::new("Advisory")
            .unique_id_as("id_", "id")
            .property("actual_ship_date", PropertyKind::Timestamp)
            .property("advisory_name", PropertyKind::String)
            .property("content_types", PropertyKind::StringList)
            .property("created_at", PropertyKind::Timestamp)
            .property("issue_date", PropertyKind::Timestamp)
            .property("product_name", PropertyKind::String)
            .property("product_short_name", PropertyKind::String)
            .property("release_date", PropertyKind::Timestamp)
            .property("security_impact", PropertyKind::String)
            .property("security_sla", PropertyKind::Timestamp)
            .property("state", states.clone())
            .property("status_time", PropertyKind::Timestamp)
            .property("synopsis", PropertyKind::String)
            .property_as("type_", "type", PropertyKind::String)
            .property("update_date", PropertyKind::Timestamp)
            .property("updated_at", PropertyKind::Timestamp)
            .relationship(RelationshipDescriptor::outgoing("assigned_to", "ASSIGNED_TO", "User").zero_or_one())
            .relationship(RelationshipDescriptor::outgoing("attached_bugs", "ATTACHED", "BugzillaBug"))
            .relationship(RelationshipDescriptor::outgoing("attached_builds", "ATTACHED", "KojiBuild"))
            .relationship(
                RelationshipDescriptor::outgoing("package_owner", "PACKAGE_OWNED_BY", "User").zero_or_one(),
            )
            .relationship(RelationshipDescriptor::outgoing("reporter", "REPORTED_BY", "User").zero_or_one())
            .relationship(RelationshipDescriptor::incoming("states", "STATE_OF", "AdvisoryState"))
            .relationship(RelationshipDescriptor::incoming(
                "triggered_freshmaker_events",
                "TRIGGERED_BY",
                "FreshmakerEvent",
            )),
        NodeTypeDescriptor::new("AdvisoryState")
            .unique_id_as("id_", "id")
            .property("name", states)
            .property("created_at", PropertyKind::Timestamp)
            .property("updated_at", PropertyKind::Timestamp)
            .relationship(RelationshipDescriptor::outgoing("advisory", "STATE_OF", "Advisory").one())
            .relationship(RelationshipDescriptor::outgoing("creator", "CREATED_BY", "User").zero_or_one()),
    ]
}
