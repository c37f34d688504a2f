//! Built-in ontology for the release pipeline.
//!
//! Node types are grouped by the upstream system that produces them:
//!
//! - **Bugzilla**: `BugzillaBug`
//! - **dist-git**: `DistGitCommit`, `DistGitRepo`, `DistGitBranch`, `DistGitPush`
//! - **Koji**: `KojiBuild`, `ContainerKojiBuild`, `KojiTask`, `KojiTag`
//! - **Errata**: `Advisory`, `AdvisoryState`
//! - **Freshmaker**: `FreshmakerEvent`
//! - **Users**: `User`, shared by every tracker
//!
//! Relationships are declared from both ends where consumers need them, so
//! an `ATTACHED` edge from an advisory to a build shows up as
//! `Advisory.attached_builds` and as `KojiBuild.advisories`.

mod bugzilla;
mod distgit;
mod errata;
mod freshmaker;
mod koji;
mod user;

use super::NodeTypeDescriptor;

/// Every built-in node type.
pub fn node_types() -> Vec<NodeTypeDescriptor> {
    let mut types = Vec::new();
    types.extend(bugzilla::node_types());
    types.extend(distgit::node_types());
    types.extend(errata::node_types());
    types.extend(freshmaker::node_types());
    types.extend(koji::node_types());
    types.extend(user::node_types());
    types
}
