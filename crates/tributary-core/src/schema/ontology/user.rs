//! The user type shared by every tracker.
//!
//! Most relationships here mirror single-valued relationships declared on the
//! other end (an advisory has one assignee), so they are read-only views.

use crate::schema::{NodeTypeDescriptor, PropertyKind, RelationshipDescriptor};

pub fn node_types() -> Vec<NodeTypeDescriptor> {
    vec![NodeTypeDescriptor::new("User")
        .unique_id("username")
        .property("email", PropertyKind::String)
        .property("name", PropertyKind::String)
        .relationship(RelationshipDescriptor::incoming("advisories_assigned", "ASSIGNED_TO", "Advisory"))
        .relationship(RelationshipDescriptor::incoming(
            "advisories_package_owner",
            "PACKAGE_OWNED_BY",
            "Advisory",
        ))
        .relationship(RelationshipDescriptor::incoming("advisories_reported", "REPORTED_BY", "Advisory"))
        .relationship(RelationshipDescriptor::incoming(
            "advisories_state_creator",
            "CREATED_BY",
            "AdvisoryState",
        ))
        .relationship(RelationshipDescriptor::incoming("bugs_assigned", "ASSIGNED_TO", "BugzillaBug"))
        .relationship(RelationshipDescriptor::incoming("bugs_qa_contact_for", "QA_BY", "BugzillaBug"))
        .relationship(RelationshipDescriptor::incoming("bugs_reported", "REPORTED_BY", "BugzillaBug"))
        .relationship(RelationshipDescriptor::incoming(
            "distgit_authored_commits",
            "AUTHORED_BY",
            "DistGitCommit",
        ))
        .relationship(RelationshipDescriptor::incoming("distgit_branches", "CONTRIBUTED_BY", "DistGitBranch"))
        .relationship(RelationshipDescriptor::incoming(
            "distgit_committed_commits",
            "COMMITTED_BY",
            "DistGitCommit",
        ))
        .relationship(RelationshipDescriptor::incoming("distgit_pushes", "PUSHED_BY", "DistGitPush"))
        .relationship(RelationshipDescriptor::incoming("distgit_repos", "CONTRIBUTED_BY", "DistGitRepo"))
        .relationship(RelationshipDescriptor::incoming("koji_builds", "OWNED_BY", "KojiBuild"))
        .relationship(RelationshipDescriptor::incoming("koji_tasks", "OWNED_BY", "KojiTask"))]
}
