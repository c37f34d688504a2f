//! Story resolution.
//!
//! A story is one causal chain through the release pipeline, for example
//! bug -> commit -> build -> advisory -> rebuild event -> container builds.
//! [`StoryResolver`] walks every template registered for the seed's type,
//! breadth-first, and turns each distinct chain into a [`Story`].
//!
//! # Walking
//!
//! Starting from the seed, each step follows its relationship from the
//! nodes reached by the step it hangs off. A fan step splits the chain, one
//! copy per target; a gather step keeps every target in one hop. A step that
//! matches nothing is absent from the chain, and so is everything reached
//! through it, but the chain is still reported.
//!
//! # Related nodes
//!
//! Each story counts, per node type, the nodes that could have been shown in
//! a hop but were not. For a hop, candidates are taken from its anchor: the
//! next hop in display order, or the previous one for the last hop, provided
//! one of the two was reached from the other. Looking from a hop reached
//! from this one goes back along its edge; looking from the hop this one was
//! reached from follows this hop's relationship. Nodes already in the chain
//! are never counted.

mod template;

pub use template::{
    HopMode, StepDef, StoryTemplate, TemplateDef, TemplateError, TemplateSet, TemplateStep,
};

use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::graph::{GraphError, GraphNode, GraphSession};

/// Nodes reached by one template step.
#[derive(Debug, Clone)]
pub struct StoryHop {
    /// Template step name.
    pub step: String,
    /// Node type the step was declared with. Nodes may be subtypes of it.
    pub node_type: String,
    pub headline: bool,
    /// One node for a fan step, every match for a gather step.
    pub nodes: Vec<GraphNode>,
}

/// One resolved correlation chain.
#[derive(Debug, Clone)]
pub struct Story {
    pub template: String,
    /// Hops in display order.
    pub hops: Vec<StoryHop>,
    /// Node type -> number of related nodes not shown in the chain.
    pub related_nodes: BTreeMap<String, usize>,
}

impl Story {
    /// Store keys of every node in the chain, in display order.
    pub fn keys(&self) -> Vec<&str> {
        self.hops
            .iter()
            .flat_map(|hop| hop.nodes.iter().map(|n| n.key.as_str()))
            .collect()
    }
}

/// A chain under construction: per template step, the nodes it reached, or
/// `None` when the step is absent.
type Chain = Vec<Option<Vec<GraphNode>>>;

/// Enumerates the stories a seed node takes part in.
pub struct StoryResolver {
    templates: Arc<TemplateSet>,
    concurrency: usize,
}

impl StoryResolver {
    /// `concurrency` bounds how many parent nodes a step expands at once.
    pub fn new(templates: Arc<TemplateSet>, concurrency: usize) -> Self {
        Self {
            templates,
            concurrency: concurrency.max(1),
        }
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Resolve the stories of the node with the given type and external id.
    pub async fn resolve(
        &self,
        session: &GraphSession,
        node_type: &str,
        external_id: &str,
    ) -> Result<Vec<Story>, GraphError> {
        if session.registry().get(node_type).is_none() {
            return Err(GraphError::UnknownType(node_type.to_string()));
        }
        let seed = session.get_node(node_type, external_id).await?;
        self.resolve_from(session, &seed).await
    }

    /// Resolve the stories of an already fetched seed node.
    ///
    /// Templates are picked by the seed's own type, falling back to its
    /// ancestors. Stories come out in template order, then in the order
    /// their nodes were discovered.
    pub async fn resolve_from(&self, session: &GraphSession, seed: &GraphNode) -> Result<Vec<Story>, GraphError> {
        let templates = self.templates.for_type(session.registry(), &seed.node_type);
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut stories = Vec::new();
        let mut seed_only: Option<(&StoryTemplate, Chain)> = None;

        for template in templates {
            let chains = self.walk(session, template, seed).await?;
            debug!(template = %template.name, chains = chains.len(), "Walked story template");

            for chain in chains {
                if !seen.insert(chain_keys(&chain)) {
                    continue;
                }
                if is_seed_only(template, &chain) {
                    if seed_only.is_none() {
                        seed_only = Some((template, chain));
                    }
                    continue;
                }
                stories.push(self.build_story(session, template, chain).await?);
            }
        }

        if stories.is_empty() {
            let story = match seed_only {
                Some((template, chain)) => self.build_story(session, template, chain).await?,
                None => Story {
                    template: seed.node_type.clone(),
                    hops: vec![StoryHop {
                        step: seed.node_type.clone(),
                        node_type: seed.node_type.clone(),
                        headline: true,
                        nodes: vec![seed.clone()],
                    }],
                    related_nodes: BTreeMap::new(),
                },
            };
            stories.push(story);
        }

        Ok(stories)
    }

    async fn walk(
        &self,
        session: &GraphSession,
        template: &StoryTemplate,
        seed: &GraphNode,
    ) -> Result<Vec<Chain>, GraphError> {
        let mut initial: Chain = vec![None; template.steps.len()];
        initial[template.seed()] = Some(vec![seed.clone()]);
        let mut chains = vec![initial];

        for &index in &template.walk_order()[1..] {
            let step = &template.steps[index];
            let (Some(parent), Some(relationship)) = (step.from, step.relationship.as_ref()) else {
                continue;
            };

            let mut parents: Vec<&GraphNode> = Vec::new();
            let mut parent_keys = HashSet::new();
            for node in chains.iter().filter_map(|c| c[parent].as_ref()).flatten() {
                if parent_keys.insert(node.key.as_str()) {
                    parents.push(node);
                }
            }

            let follows: Vec<_> = parents
                .iter()
                .map(|node| session.follow(node, &relationship.name))
                .collect();
            let fetched: Vec<Vec<GraphNode>> = stream::iter(follows)
            .buffered(self.concurrency)
            .try_collect()
            .await?;

            let targets: HashMap<String, Vec<GraphNode>> = parents
                .iter()
                .map(|node| node.key.clone())
                .zip(fetched)
                .collect();

            chains = chains
                .into_iter()
                .flat_map(|chain| extend(chain, parent, index, step.mode, &targets))
                .collect();
        }

        Ok(chains)
    }

    async fn build_story(
        &self,
        session: &GraphSession,
        template: &StoryTemplate,
        chain: Chain,
    ) -> Result<Story, GraphError> {
        let related_nodes = count_related(session, template, &chain).await?;
        let hops = template
            .steps
            .iter()
            .zip(chain)
            .filter_map(|(step, nodes)| {
                nodes.map(|nodes| StoryHop {
                    step: step.name.clone(),
                    node_type: step.node_type.clone(),
                    headline: step.headline,
                    nodes,
                })
            })
            .collect();

        Ok(Story {
            template: template.name.clone(),
            hops,
            related_nodes,
        })
    }
}

/// Extend a chain with the targets found for its node at `parent`.
fn extend(
    mut chain: Chain,
    parent: usize,
    index: usize,
    mode: HopMode,
    targets: &HashMap<String, Vec<GraphNode>>,
) -> Vec<Chain> {
    let found = chain[parent]
        .as_ref()
        .and_then(|nodes| nodes.first())
        .and_then(|node| targets.get(&node.key))
        .filter(|found| !found.is_empty());
    let Some(found) = found else {
        return vec![chain];
    };

    match mode {
        HopMode::Gather => {
            chain[index] = Some(found.clone());
            vec![chain]
        }
        HopMode::Fan => found
            .iter()
            .map(|target| {
                let mut branch = chain.clone();
                branch[index] = Some(vec![target.clone()]);
                branch
            })
            .collect(),
    }
}

fn chain_keys(chain: &Chain) -> Vec<String> {
    chain
        .iter()
        .flatten()
        .flatten()
        .map(|node| node.key.clone())
        .collect()
}

fn is_seed_only(template: &StoryTemplate, chain: &Chain) -> bool {
    chain
        .iter()
        .enumerate()
        .all(|(i, nodes)| i == template.seed() || nodes.is_none())
}

async fn count_related(
    session: &GraphSession,
    template: &StoryTemplate,
    chain: &Chain,
) -> Result<BTreeMap<String, usize>, GraphError> {
    let shown: HashSet<&str> = chain
        .iter()
        .flatten()
        .flatten()
        .map(|node| node.key.as_str())
        .collect();
    let mut related: BTreeMap<String, HashSet<String>> = template
        .node_types()
        .map(|t| (t.to_string(), HashSet::new()))
        .collect();

    let present: Vec<usize> = (0..template.steps.len()).filter(|&i| chain[i].is_some()).collect();
    for (position, &index) in present.iter().enumerate() {
        let step = &template.steps[index];
        let mut candidates = Vec::new();

        match anchor_for(template, &present, position) {
            Some(Anchor::Dependent(anchor)) => {
                let Some(relationship) = template.steps[anchor].relationship.as_ref() else {
                    continue;
                };
                for node in chain[anchor].iter().flatten() {
                    let siblings = session
                        .neighbors(
                            node,
                            &relationship.edge_label,
                            relationship.direction.reversed(),
                            &step.node_type,
                        )
                        .await?;
                    candidates.extend(siblings);
                }
            }
            Some(Anchor::Parent(parent)) => {
                let Some(relationship) = step.relationship.as_ref() else {
                    continue;
                };
                for node in chain[parent].iter().flatten() {
                    candidates.extend(session.follow(node, &relationship.name).await?);
                }
            }
            None => continue,
        }

        let bucket = related.entry(step.node_type.clone()).or_default();
        for node in candidates {
            if !shown.contains(node.key.as_str()) {
                bucket.insert(node.key);
            }
        }
    }

    Ok(related
        .into_iter()
        .map(|(node_type, keys)| (node_type, keys.len()))
        .collect())
}

/// Where sibling candidates of a hop are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// A hop reached from this one: look back along its edge.
    Dependent(usize),
    /// The hop this one was reached from: follow this hop's relationship.
    Parent(usize),
}

/// The next present hop in display order when the two are linked, else the
/// previous one, else the nearest linked hop in the template tree.
fn anchor_for(template: &StoryTemplate, present: &[usize], position: usize) -> Option<Anchor> {
    let index = present[position];
    let link = |other: usize| {
        if template.steps[other].from == Some(index) {
            Some(Anchor::Dependent(other))
        } else if template.steps[index].from == Some(other) {
            Some(Anchor::Parent(other))
        } else {
            None
        }
    };

    let next = present.get(position + 1).copied();
    let previous = position.checked_sub(1).map(|p| present[p]);
    next.and_then(link)
        .or_else(|| previous.and_then(link))
        .or_else(|| {
            template
                .dependents(index)
                .find(|d| present.contains(d))
                .map(Anchor::Dependent)
        })
        .or_else(|| template.steps[index].from.map(Anchor::Parent))
}
