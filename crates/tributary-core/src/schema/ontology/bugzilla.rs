//! Bugzilla node types.

use crate::schema::{NodeTypeDescriptor, PropertyKind, RelationshipDescriptor};

pub fn node_types() -> Vec<NodeTypeDescriptor> {
    vec![NodeTypeDescriptor::new("BugzillaBug")
        .unique_id_as("id_", "id")
        .property("classification", PropertyKind::String)
        .property("creation_time", PropertyKind::Timestamp)
        .property("modified_time", PropertyKind::Timestamp)
        .property("priority", PropertyKind::String)
        .property("product_name", PropertyKind::String)
        .property("product_version", PropertyKind::String)
        .property("resolution", PropertyKind::String)
        .property("severity", PropertyKind::String)
        .property("short_description", PropertyKind::String)
        .property("status", PropertyKind::String)
        .property("target_milestone", PropertyKind::String)
        .property("votes", PropertyKind::Integer)
        .relationship(RelationshipDescriptor::outgoing("assignee", "ASSIGNED_TO", "User").zero_or_one())
        .relationship(RelationshipDescriptor::outgoing("qa_contact", "QA_BY", "User").zero_or_one())
        .relationship(RelationshipDescriptor::outgoing("reporter", "REPORTED_BY", "User").zero_or_one())
        .relationship(RelationshipDescriptor::incoming("attached_advisories", "ATTACHED", "Advisory"))
        .relationship(RelationshipDescriptor::incoming("related_by_commits", "RELATED", "DistGitCommit"))
        .relationship(RelationshipDescriptor::incoming("resolved_by_commits", "RESOLVED", "DistGitCommit"))
        .relationship(RelationshipDescriptor::incoming("reverted_by_commits", "REVERTED", "DistGitCommit"))]
}
