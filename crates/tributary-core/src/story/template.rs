//! Story templates.
//!
//! A template is the static shape of one kind of story: a seed step and a
//! tree of steps reached from it through declared relationships. Templates
//! are plain data (TOML or YAML) and are compiled against the schema
//! registry once at startup, so a template naming an unknown type or
//! relationship never reaches request handling.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use thiserror::Error;

use crate::schema::{RelationshipDescriptor, SchemaError, SchemaRegistry};

const DEFAULT_TEMPLATES: &str = include_str!("default_templates.toml");

/// Errors raised while loading template files.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read template file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse TOML templates: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse YAML templates: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// How a step treats multiple matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HopMode {
    /// One story per matched node.
    #[default]
    Fan,
    /// Every matched node in a single hop.
    Gather,
}

/// A template as written in a template file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDef {
    pub name: String,
    /// Node type the template starts from.
    pub seed: String,
    /// Steps in display order.
    pub steps: Vec<StepDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDef {
    pub name: String,
    /// Step this one is reached from. Absent for the seed.
    #[serde(default)]
    pub from: Option<String>,
    /// Relationship followed from the `from` step.
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub mode: HopMode,
    #[serde(default)]
    pub headline: bool,
}

#[derive(Debug, Default, Deserialize)]
struct TemplateFile {
    #[serde(default, rename = "template")]
    templates: Vec<TemplateDef>,
}

/// A compiled template step.
#[derive(Debug, Clone)]
pub struct TemplateStep {
    pub name: String,
    pub node_type: String,
    pub from: Option<usize>,
    pub relationship: Option<RelationshipDescriptor>,
    pub mode: HopMode,
    pub headline: bool,
}

impl TemplateStep {
    pub fn is_seed(&self) -> bool {
        self.from.is_none()
    }
}

/// A template validated against the registry.
#[derive(Debug, Clone)]
pub struct StoryTemplate {
    pub name: String,
    pub seed_type: String,
    /// Steps in display order.
    pub steps: Vec<TemplateStep>,
    seed: usize,
    walk_order: Vec<usize>,
}

impl StoryTemplate {
    /// Index of the seed step.
    pub fn seed(&self) -> usize {
        self.seed
    }

    /// Step indices with every step after the step it is reached from.
    pub fn walk_order(&self) -> &[usize] {
        &self.walk_order
    }

    /// Steps reached directly from `step`, in display order.
    pub fn dependents(&self, step: usize) -> impl Iterator<Item = usize> + '_ {
        self.steps
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.from == Some(step))
            .map(|(i, _)| i)
    }

    /// Every node type the template mentions.
    pub fn node_types(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.node_type.as_str())
    }

    fn compile(registry: &SchemaRegistry, def: &TemplateDef) -> Result<Self, SchemaError> {
        let invalid = |reason: String| SchemaError::invalid_template(&def.name, reason);
        registry.describe(&def.seed)?;

        let mut by_name: HashMap<&str, usize> = HashMap::new();
        for (i, step) in def.steps.iter().enumerate() {
            if by_name.insert(step.name.as_str(), i).is_some() {
                return Err(invalid(format!("step {} declared twice", step.name)));
            }
        }

        let seeds: Vec<usize> = def
            .steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.from.is_none())
            .map(|(i, _)| i)
            .collect();
        let [seed] = seeds[..] else {
            return Err(invalid(format!(
                "expected exactly one seed step without `from`, found {}",
                seeds.len()
            )));
        };
        let seed_def = &def.steps[seed];
        if seed_def.relationship.is_some() {
            return Err(invalid(format!("seed step {} cannot follow a relationship", seed_def.name)));
        }
        if seed_def.mode == HopMode::Gather {
            return Err(invalid(format!("seed step {} cannot gather", seed_def.name)));
        }

        let mut parents = Vec::with_capacity(def.steps.len());
        for step in &def.steps {
            let parent = match &step.from {
                Some(from) => Some(
                    *by_name
                        .get(from.as_str())
                        .ok_or_else(|| invalid(format!("step {} is reached from unknown step {}", step.name, from)))?,
                ),
                None => None,
            };
            parents.push(parent);
        }

        let mut walk_order = Vec::with_capacity(def.steps.len());
        let mut queue = VecDeque::from([seed]);
        while let Some(current) = queue.pop_front() {
            walk_order.push(current);
            queue.extend((0..def.steps.len()).filter(|&i| parents[i] == Some(current)));
        }
        if walk_order.len() != def.steps.len() {
            let stranded: Vec<&str> = (0..def.steps.len())
                .filter(|i| !walk_order.contains(i))
                .map(|i| def.steps[i].name.as_str())
                .collect();
            return Err(invalid(format!("steps form a cycle: {}", stranded.join(", "))));
        }

        let mut types: Vec<Option<String>> = vec![None; def.steps.len()];
        let mut relationships: Vec<Option<RelationshipDescriptor>> = vec![None; def.steps.len()];
        types[seed] = Some(def.seed.clone());

        for &i in &walk_order[1..] {
            let step = &def.steps[i];
            let Some(parent) = parents[i] else { continue };
            if def.steps[parent].mode == HopMode::Gather {
                return Err(invalid(format!(
                    "step {} is reached from gather step {}",
                    step.name, def.steps[parent].name
                )));
            }
            let parent_type = types[parent].clone().unwrap_or_default();
            let name = step
                .relationship
                .as_deref()
                .ok_or_else(|| invalid(format!("step {} names no relationship", step.name)))?;
            let relationship = registry
                .describe(&parent_type)?
                .relationship(name)
                .ok_or_else(|| SchemaError::UnknownRelationship {
                    node_type: parent_type.clone(),
                    relationship: name.to_string(),
                })?;
            types[i] = Some(relationship.target.clone());
            relationships[i] = Some(relationship.clone());
        }

        let steps = def
            .steps
            .iter()
            .zip(types)
            .zip(relationships)
            .zip(parents)
            .map(|(((step, node_type), relationship), from)| TemplateStep {
                name: step.name.clone(),
                node_type: node_type.unwrap_or_default(),
                from,
                relationship,
                mode: step.mode,
                headline: step.headline,
            })
            .collect();

        Ok(Self {
            name: def.name.clone(),
            seed_type: def.seed.clone(),
            steps,
            seed,
            walk_order,
        })
    }
}

/// Every template known to the process, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: Vec<StoryTemplate>,
}

impl TemplateSet {
    /// Compile and validate template definitions.
    pub fn compile(registry: &SchemaRegistry, defs: &[TemplateDef]) -> Result<Self, SchemaError> {
        let templates = defs
            .iter()
            .map(|def| StoryTemplate::compile(registry, def))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { templates })
    }

    /// The templates shipped with the binary.
    pub fn builtin(registry: &SchemaRegistry) -> Result<Self, TemplateError> {
        Self::from_toml_str(registry, DEFAULT_TEMPLATES)
    }

    pub fn from_toml_str(registry: &SchemaRegistry, content: &str) -> Result<Self, TemplateError> {
        let file: TemplateFile = toml::from_str(content)?;
        Ok(Self::compile(registry, &file.templates)?)
    }

    pub fn from_yaml_str(registry: &SchemaRegistry, content: &str) -> Result<Self, TemplateError> {
        let file: TemplateFile = serde_yaml::from_str(content)?;
        Ok(Self::compile(registry, &file.templates)?)
    }

    /// Load templates, reading YAML for `.yaml`/`.yml` files and TOML otherwise.
    pub fn load(registry: &SchemaRegistry, path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(registry, &content),
            _ => Self::from_toml_str(registry, &content),
        }
    }

    /// Templates seeded from `node_type`, or else from its nearest ancestor
    /// that has any.
    pub fn for_type(&self, registry: &SchemaRegistry, node_type: &str) -> Vec<&StoryTemplate> {
        let ancestors = registry
            .get(node_type)
            .map(|t| t.ancestors().to_vec())
            .unwrap_or_default();

        std::iter::once(node_type.to_string())
            .chain(ancestors)
            .map(|candidate| {
                self.templates
                    .iter()
                    .filter(|t| t.seed_type == candidate)
                    .collect::<Vec<_>>()
            })
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoryTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
