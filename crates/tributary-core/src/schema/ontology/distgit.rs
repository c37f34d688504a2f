//! dist-git node types: repositories, branches, pushes and commits.

use crate::schema::{NodeTypeDescriptor, PropertyKind, RelationshipDescriptor};

pub fn node_types() -> Vec<NodeTypeDescriptor> {
    vec![commit(), repo(), branch(), push()]
}

fn commit() -> NodeTypeDescriptor {
    NodeTypeDescriptor::new("DistGitCommit")
        .unique_id_as("hash_", "hash")
        .property("author_date", PropertyKind::Timestamp)
        .property("commit_date", PropertyKind::Timestamp)
        .property("log_message", PropertyKind::String)
        .relationship(RelationshipDescriptor::outgoing("author", "AUTHORED_BY", "User").zero_or_one())
        .relationship(RelationshipDescriptor::outgoing("committer", "COMMITTED_BY", "User").zero_or_one())
        // Cardinality is enforced on `parent`; `children` is its read-only mirror
        .relationship(RelationshipDescriptor::outgoing("parent", "PARENT", "DistGitCommit").zero_or_one())
        .relationship(RelationshipDescriptor::incoming("children", "PARENT", "DistGitCommit"))
        .relationship(RelationshipDescriptor::incoming("branches", "CONTAINS", "DistGitBranch"))
        .relationship(RelationshipDescriptor::incoming("repos", "CONTAINS", "DistGitRepo"))
        .relationship(RelationshipDescriptor::incoming("pushes", "PUSHED", "DistGitPush"))
        .relationship(RelationshipDescriptor::incoming("koji_builds", "BUILT_FROM", "KojiBuild"))
        .relationship(RelationshipDescriptor::outgoing("related_bugs", "RELATED", "BugzillaBug"))
        .relationship(RelationshipDescriptor::outgoing("resolved_bugs", "RESOLVED", "BugzillaBug"))
        .relationship(RelationshipDescriptor::outgoing("reverted_bugs", "REVERTED", "BugzillaBug"))
}

fn repo() -> NodeTypeDescriptor {
    NodeTypeDescriptor::new("DistGitRepo")
        .unique_id("name")
        .property("namespace", PropertyKind::String)
        .relationship(RelationshipDescriptor::outgoing("branches", "CONTAINS", "DistGitBranch"))
        .relationship(RelationshipDescriptor::outgoing("commits", "CONTAINS", "DistGitCommit"))
        .relationship(RelationshipDescriptor::outgoing("contributors", "CONTRIBUTED_BY", "User"))
}

fn branch() -> NodeTypeDescriptor {
    NodeTypeDescriptor::new("DistGitBranch")
        .unique_id("name")
        .property("repo_name", PropertyKind::String)
        .property("repo_namespace", PropertyKind::String)
        .relationship(RelationshipDescriptor::outgoing("commits", "CONTAINS", "DistGitCommit"))
        .relationship(RelationshipDescriptor::outgoing("contributors", "CONTRIBUTED_BY", "User"))
        .relationship(RelationshipDescriptor::incoming("repos", "CONTAINS", "DistGitRepo"))
        .relationship(RelationshipDescriptor::incoming("pushes", "PUSHED_TO", "DistGitPush"))
}

fn push() -> NodeTypeDescriptor {
    NodeTypeDescriptor::new("DistGitPush")
        .unique_id_as("id_", "id")
        .property("push_date", PropertyKind::Timestamp)
        .property("push_ip", PropertyKind::String)
        .relationship(RelationshipDescriptor::outgoing("branch", "PUSHED_TO", "DistGitBranch").zero_or_one())
        .relationship(RelationshipDescriptor::outgoing("commits", "PUSHED", "DistGitCommit"))
        .relationship(RelationshipDescriptor::outgoing("pusher", "PUSHED_BY", "User").zero_or_one())
}
