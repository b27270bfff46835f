// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! Context builder (§4.G): layer schema defaults, owner parameters,
//! fixed parameters and the fixed `ctx` variables into one evaluation
//! environment, plus the companion context variables (`metadata`,
//! `workload`, `configurations`) used by rendering for other resource
//! types (SPEC_FULL §4.G supplement).

use crate::node::Node;
use crate::schema;
use indexmap::IndexMap;

/// Developer-supplied values for one component instance.
#[derive(Debug, Clone)]
pub struct OwnerDescriptor {
    /// Owner-supplied parameters, keyed by the same names as the schema.
    pub parameters: Node,
}

impl Default for OwnerDescriptor {
    /// No owner-supplied parameters: an empty mapping, so deep-merging
    /// against schema defaults is a no-op rather than nulling them out.
    fn default() -> Self {
        Self {
            parameters: Node::Mapping(IndexMap::new()),
        }
    }
}

/// A declarative template document: schema, fixed parameters and a
/// template tree.
#[derive(Debug, Clone)]
pub struct Definition {
    /// The definition's name, matched against a type definition's
    /// allowed-template list.
    pub name: String,
    /// The shorthand schema tree (§4.F).
    pub schema: Node,
    /// Platform-author-controlled fixed parameters.
    pub fixed_parameters: IndexMap<String, Node>,
    /// The template tree to render.
    pub template: Node,
}

/// One entry in a type definition's allowed-templates list.
#[derive(Debug, Clone)]
pub struct AllowedTemplate {
    /// Must equal a [`Definition::name`] for its fixed parameters to win.
    pub name: String,
    /// Fixed parameters that override the definition's own.
    pub fixed_parameters: IndexMap<String, Node>,
}

/// An optional override source for fixed parameters.
#[derive(Debug, Clone, Default)]
pub struct TypeDefinition {
    /// Allowed templates, matched by name against the definition.
    pub allowed_templates: Vec<AllowedTemplate>,
}

/// Context variables identifying the render call, per §3/§4.G. The two
/// auto-filled fields (`timestamp`, `uuid`) are populated by the
/// rendering pipeline (§4.H step 2) before the builder runs.
#[derive(Debug, Clone, Default)]
pub struct ContextVars {
    /// Organization name. Must be non-empty (§4.H step 1).
    pub org_name: String,
    /// Project name. Must be non-empty.
    pub project_name: String,
    /// Component name. Must be non-empty.
    pub component_name: String,
    /// Workflow name, present only for workflow-shaped renders.
    pub workflow_name: Option<String>,
}

/// Deep-merge `base` and `override_`: for every key in `override_`, if
/// both sides are mappings, recurse; otherwise `override_`'s value wins
/// outright — even replacing a mapping in `base` with a non-mapping
/// leaf (§9's deep-merge corner case). Keys present only in `base` are
/// preserved.
pub fn deep_merge(base: &Node, override_: &Node) -> Node {
    match (base, override_) {
        (Node::Mapping(base_map), Node::Mapping(override_map)) => {
            let mut out = base_map.clone();
            for (key, value) in override_map {
                let merged = match out.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Node::Mapping(out)
        }
        (_, override_) => override_.clone(),
    }
}

/// Build the evaluation environment's `ctx`, `schema` and
/// `fixedParameters` top-level variables (§4.G).
pub fn build(
    owner: &OwnerDescriptor,
    definition: &Definition,
    type_def: Option<&TypeDefinition>,
    ctx_vars: &ContextVars,
    timestamp: i64,
    uuid: &str,
) -> IndexMap<String, Node> {
    let mut ctx = IndexMap::new();
    ctx.insert("orgName".to_string(), Node::String(ctx_vars.org_name.clone()));
    ctx.insert(
        "projectName".to_string(),
        Node::String(ctx_vars.project_name.clone()),
    );
    ctx.insert(
        "componentName".to_string(),
        Node::String(ctx_vars.component_name.clone()),
    );
    if let Some(workflow_name) = &ctx_vars.workflow_name {
        ctx.insert("workflowName".to_string(), Node::String(workflow_name.clone()));
    }
    ctx.insert("timestamp".to_string(), Node::Int(timestamp));
    ctx.insert("uuid".to_string(), Node::String(uuid.to_string()));

    let schema_defaults =
        schema::extract_defaults(&definition.schema).unwrap_or_else(|| Node::Mapping(IndexMap::new()));
    let schema = deep_merge(&schema_defaults, &owner.parameters);

    let mut fixed_parameters = definition.fixed_parameters.clone();
    if let Some(type_def) = type_def {
        if let Some(matched) = type_def
            .allowed_templates
            .iter()
            .find(|t| t.name == definition.name)
        {
            for (key, value) in &matched.fixed_parameters {
                fixed_parameters.insert(key.clone(), value.clone());
            }
        }
    }

    let mut env = IndexMap::new();
    env.insert("ctx".to_string(), Node::Mapping(ctx));
    env.insert("schema".to_string(), schema);
    env.insert("fixedParameters".to_string(), Node::Mapping(fixed_parameters));
    env
}

/// Container spec within a [`Workload`].
#[derive(Debug, Clone, Default)]
pub struct ContainerSpec {
    /// Container image reference.
    pub image: String,
    /// Optional entrypoint override.
    pub command: Option<Vec<String>>,
    /// Optional argument list.
    pub args: Option<Vec<String>>,
}

/// One exposed network endpoint of a workload.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Endpoint name.
    pub name: String,
    /// Port number.
    pub port: i64,
}

/// One outbound connection declared by a workload.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Connection name.
    pub name: String,
    /// Arbitrary connection parameters.
    pub params: Node,
}

/// The `metadata` companion context variable (SPEC_FULL §4.G).
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// Resource name.
    pub name: String,
    /// Resource namespace.
    pub namespace: String,
    /// Optional labels.
    pub labels: Option<IndexMap<String, String>>,
    /// Optional annotations.
    pub annotations: Option<IndexMap<String, String>>,
    /// Optional pod selector labels.
    pub pod_selectors: Option<IndexMap<String, String>>,
}

/// The `workload` companion context variable.
#[derive(Debug, Clone, Default)]
pub struct Workload {
    /// Containers keyed by name.
    pub containers: IndexMap<String, ContainerSpec>,
    /// Exposed endpoints.
    pub endpoints: Vec<Endpoint>,
    /// Outbound connections.
    pub connections: Vec<Connection>,
}

/// One `envs`/`files` configuration group.
#[derive(Debug, Clone, Default)]
pub struct ConfigGroup {
    /// Environment-variable-shaped entries.
    pub envs: IndexMap<String, String>,
    /// File-shaped entries (path -> contents).
    pub files: IndexMap<String, String>,
}

/// An environment-specific override layered onto [`Configurations`] by
/// matching environment name before being folded in.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentOverride {
    /// The environment this override applies to.
    pub environment: String,
    /// Config overrides for that environment.
    pub configs: Option<ConfigGroup>,
    /// Secret overrides for that environment.
    pub secrets: Option<ConfigGroup>,
}

/// The `configurations` companion context variable, partitioned into
/// `configs.{envs,files}` and `secrets.{envs,files}`.
#[derive(Debug, Clone, Default)]
pub struct Configurations {
    /// Non-secret configuration.
    pub configs: ConfigGroup,
    /// Secret configuration.
    pub secrets: ConfigGroup,
}

fn config_group_to_node(group: &ConfigGroup) -> Node {
    let to_map = |m: &IndexMap<String, String>| {
        Node::Mapping(m.iter().map(|(k, v)| (k.clone(), Node::String(v.clone()))).collect())
    };
    Node::Mapping(IndexMap::from([
        ("envs".to_string(), to_map(&group.envs)),
        ("files".to_string(), to_map(&group.files)),
    ]))
}

fn apply_override(base: &ConfigGroup, over: Option<&ConfigGroup>) -> ConfigGroup {
    let Some(over) = over else { return base.clone() };
    let mut envs = base.envs.clone();
    for (k, v) in &over.envs {
        envs.insert(k.clone(), v.clone());
    }
    let mut files = base.files.clone();
    for (k, v) in &over.files {
        files.insert(k.clone(), v.clone());
    }
    ConfigGroup { envs, files }
}

impl Metadata {
    /// Convert to a `Node` for insertion into the evaluation environment.
    pub fn to_node(&self) -> Node {
        let mut m = IndexMap::new();
        m.insert("name".to_string(), Node::String(self.name.clone()));
        m.insert("namespace".to_string(), Node::String(self.namespace.clone()));
        if let Some(labels) = &self.labels {
            m.insert(
                "labels".to_string(),
                Node::Mapping(labels.iter().map(|(k, v)| (k.clone(), Node::String(v.clone()))).collect()),
            );
        }
        if let Some(annotations) = &self.annotations {
            m.insert(
                "annotations".to_string(),
                Node::Mapping(
                    annotations
                        .iter()
                        .map(|(k, v)| (k.clone(), Node::String(v.clone())))
                        .collect(),
                ),
            );
        }
        if let Some(pod_selectors) = &self.pod_selectors {
            m.insert(
                "podSelectors".to_string(),
                Node::Mapping(
                    pod_selectors
                        .iter()
                        .map(|(k, v)| (k.clone(), Node::String(v.clone())))
                        .collect(),
                ),
            );
        }
        Node::Mapping(m)
    }
}

impl Workload {
    /// Convert to a `Node` for insertion into the evaluation environment.
    pub fn to_node(&self) -> Node {
        let containers = self
            .containers
            .iter()
            .map(|(name, spec)| {
                let mut c = IndexMap::new();
                c.insert("image".to_string(), Node::String(spec.image.clone()));
                if let Some(command) = &spec.command {
                    c.insert(
                        "command".to_string(),
                        Node::Sequence(command.iter().map(|s| Node::String(s.clone())).collect()),
                    );
                }
                if let Some(args) = &spec.args {
                    c.insert(
                        "args".to_string(),
                        Node::Sequence(args.iter().map(|s| Node::String(s.clone())).collect()),
                    );
                }
                (name.clone(), Node::Mapping(c))
            })
            .collect();

        let endpoints = self
            .endpoints
            .iter()
            .map(|e| {
                Node::Mapping(IndexMap::from([
                    ("name".to_string(), Node::String(e.name.clone())),
                    ("port".to_string(), Node::Int(e.port)),
                ]))
            })
            .collect();

        let connections = self
            .connections
            .iter()
            .map(|c| {
                Node::Mapping(IndexMap::from([
                    ("name".to_string(), Node::String(c.name.clone())),
                    ("params".to_string(), c.params.clone()),
                ]))
            })
            .collect();

        Node::Mapping(IndexMap::from([
            ("containers".to_string(), Node::Mapping(containers)),
            ("endpoints".to_string(), Node::Sequence(endpoints)),
            ("connections".to_string(), Node::Sequence(connections)),
        ]))
    }
}

impl Configurations {
    /// Apply the override matching `environment_name` (if any), then
    /// convert to a `Node` for insertion into the evaluation environment.
    pub fn to_node(&self, environment_name: &str, overrides: &[EnvironmentOverride]) -> Node {
        let matched = overrides.iter().find(|o| o.environment == environment_name);
        let configs = apply_override(&self.configs, matched.and_then(|o| o.configs.as_ref()));
        let secrets = apply_override(&self.secrets, matched.and_then(|o| o.secrets.as_ref()));
        Node::Mapping(IndexMap::from([
            ("configs".to_string(), config_group_to_node(&configs)),
            ("secrets".to_string(), config_group_to_node(&secrets)),
        ]))
    }
}
