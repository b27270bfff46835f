// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios exercised only through the public crate API,
//! mirroring the worked examples documented alongside this crate's design.

use indexmap::IndexMap;
use tmpl_render_core::prelude::*;

fn definition(template: Node) -> Definition {
    Definition {
        name: "component".to_string(),
        schema: Node::Mapping(IndexMap::new()),
        fixed_parameters: IndexMap::new(),
        template,
    }
}

fn context() -> ContextVars {
    ContextVars {
        org_name: "acme".to_string(),
        project_name: "checkout".to_string(),
        component_name: "api".to_string(),
        workflow_name: None,
    }
}

fn owner(parameters: Node) -> OwnerDescriptor {
    OwnerDescriptor { parameters }
}

/// Wrap a `spec` fragment in a minimal, output-valid resource envelope.
fn envelope(spec: Node) -> Node {
    Node::Mapping(IndexMap::from([
        ("apiVersion".to_string(), Node::String("v1".to_string())),
        ("kind".to_string(), Node::String("Component".to_string())),
        (
            "metadata".to_string(),
            Node::Mapping(IndexMap::from([(
                "name".to_string(),
                Node::String("fixed-name".to_string()),
            )])),
        ),
        ("spec".to_string(), spec),
    ]))
}

fn spec_of(output: &Node) -> &IndexMap<String, Node> {
    let Node::Mapping(root) = output else {
        panic!("expected mapping root")
    };
    let Node::Mapping(spec) = &root["spec"] else {
        panic!("expected spec mapping")
    };
    spec
}

#[test]
fn plain_literal_passes_through_unchanged() {
    let engine = Engine::new();
    let template = envelope(Node::Mapping(IndexMap::from([(
        "plain".to_string(),
        Node::String("hello".to_string()),
    )])));
    let input = RenderInput {
        owner: owner(Node::Mapping(IndexMap::new())),
        definition: definition(template),
        type_definition: None,
        context: context(),
    };
    let out = render(&engine, input).unwrap();
    let spec = spec_of(&out.resolved);
    assert_eq!(spec.get("plain"), Some(&Node::String("hello".to_string())));
}

#[test]
fn interpolation_and_sole_numeric_expression() {
    let engine = Engine::new();
    let template = envelope(Node::Mapping(IndexMap::from([
        (
            "message".to_string(),
            Node::String("${metadata.name} has ${spec.replicas} replicas".to_string()),
        ),
        ("numeric".to_string(), Node::String("${spec.replicas}".to_string())),
    ])));
    let input = RenderInput {
        owner: owner(Node::Mapping(IndexMap::from([
            (
                "metadata".to_string(),
                Node::Mapping(IndexMap::from([(
                    "name".to_string(),
                    Node::String("checkout".to_string()),
                )])),
            ),
            (
                "spec".to_string(),
                Node::Mapping(IndexMap::from([("replicas".to_string(), Node::Int(2))])),
            ),
        ]))),
        definition: definition(template),
        type_definition: None,
        context: context(),
    };
    let out = render(&engine, input).unwrap();
    let spec = spec_of(&out.resolved);
    assert_eq!(
        spec.get("message"),
        Some(&Node::String("checkout has 2 replicas".to_string()))
    );
    assert_eq!(spec.get("numeric"), Some(&Node::Int(2)), "integer type is preserved");
}

#[test]
fn omit_drops_entry_and_merge_shallow_overrides_by_key() {
    let engine = Engine::new();
    let template = envelope(Node::Mapping(IndexMap::from([(
        "annotations".to_string(),
        Node::Mapping(IndexMap::from([
            (
                "base".to_string(),
                Node::String(r#"${merge({"team":"platform"}, schema.metadata.labels)}"#.to_string()),
            ),
            (
                "optional".to_string(),
                Node::String(
                    r#"${has(schema.spec.flag) && schema.spec.flag ? {"enabled":"true"} : omit()}"#
                        .to_string(),
                ),
            ),
        ])),
    )])));

    let make_owner = |flag: bool| {
        owner(Node::Mapping(IndexMap::from([
            (
                "metadata".to_string(),
                Node::Mapping(IndexMap::from([(
                    "labels".to_string(),
                    Node::Mapping(IndexMap::from([
                        ("team".to_string(), Node::String("payments".to_string())),
                        ("region".to_string(), Node::String("us".to_string())),
                    ])),
                )])),
            ),
            (
                "spec".to_string(),
                Node::Mapping(IndexMap::from([("flag".to_string(), Node::Bool(flag))])),
            ),
        ])))
    };

    let engine2 = &engine;
    let out = render(
        engine2,
        RenderInput {
            owner: make_owner(true),
            definition: definition(template.clone()),
            type_definition: None,
            context: context(),
        },
    )
    .unwrap();
    let spec = spec_of(&out.resolved);
    let Node::Mapping(annotations) = &spec["annotations"] else {
        panic!()
    };
    let Node::Mapping(base) = &annotations["base"] else { panic!() };
    assert_eq!(base.get("team"), Some(&Node::String("payments".to_string())));
    assert_eq!(base.get("region"), Some(&Node::String("us".to_string())));
    let Node::Mapping(optional) = &annotations["optional"] else {
        panic!()
    };
    assert_eq!(optional.get("enabled"), Some(&Node::String("true".to_string())));

    let out = render(
        engine2,
        RenderInput {
            owner: make_owner(false),
            definition: definition(template),
            type_definition: None,
            context: context(),
        },
    )
    .unwrap();
    let spec = spec_of(&out.resolved);
    let Node::Mapping(annotations) = &spec["annotations"] else {
        panic!()
    };
    assert!(
        !annotations.contains_key("optional"),
        "omit() must drop the optional key entirely when spec.flag is false"
    );
}

#[test]
fn sanitize_with_many_args_always_appends_hash_suffix() {
    let engine = Engine::new();
    let template = envelope(Node::Mapping(IndexMap::from([(
        "name".to_string(),
        Node::String(r#"${sanitizeK8sResourceName("front","end","prod","us-west","99")}"#.to_string()),
    )])));
    let input = RenderInput {
        owner: owner(Node::Mapping(IndexMap::new())),
        definition: definition(template),
        type_definition: None,
        context: context(),
    };
    let out = render(&engine, input).unwrap();
    let spec = spec_of(&out.resolved);
    let Node::String(name) = &spec["name"] else { panic!() };
    assert!(name.starts_with("front-end-prod-us-west-99-"));
    assert_eq!(name.len(), "front-end-prod-us-west-99-".len() + 8);
}

#[test]
fn dynamic_string_key_evaluates_to_its_rendered_value() {
    let engine = Engine::new();
    let template = envelope(Node::Mapping(IndexMap::from([(
        "services".to_string(),
        Node::Mapping(IndexMap::from([(
            "${'port-' + string(metadata.port)}".to_string(),
            Node::String("${metadata.serviceName}".to_string()),
        )])),
    )])));
    let input = RenderInput {
        owner: owner(Node::Mapping(IndexMap::from([(
            "metadata".to_string(),
            Node::Mapping(IndexMap::from([
                ("port".to_string(), Node::Int(8080)),
                ("serviceName".to_string(), Node::String("web-service".to_string())),
            ])),
        )]))),
        definition: definition(template),
        type_definition: None,
        context: context(),
    };
    let out = render(&engine, input).unwrap();
    let spec = spec_of(&out.resolved);
    let Node::Mapping(services) = &spec["services"] else {
        panic!()
    };
    assert_eq!(
        services.get("port-8080"),
        Some(&Node::String("web-service".to_string()))
    );
}

#[test]
fn dynamic_non_string_key_fails_with_key_type_error() {
    let engine = Engine::new();
    let template = envelope(Node::Mapping(IndexMap::from([(
        "ports".to_string(),
        Node::Mapping(IndexMap::from([(
            "${metadata.port}".to_string(),
            Node::String("http".to_string()),
        )])),
    )])));
    let input = RenderInput {
        owner: owner(Node::Mapping(IndexMap::from([(
            "metadata".to_string(),
            Node::Mapping(IndexMap::from([("port".to_string(), Node::Int(8080))])),
        )]))),
        definition: definition(template),
        type_definition: None,
        context: context(),
    };
    let err = render(&engine, input).unwrap_err();
    match err {
        RenderError::KeyType { actual_type, .. } => assert_eq!(actual_type, "int"),
        other => panic!("expected KeyType error, got {other:?}"),
    }
}

#[test]
fn missing_key_is_classified_as_missing_data() {
    let engine = Engine::new();
    let template = envelope(Node::Mapping(IndexMap::from([(
        "v".to_string(),
        Node::String("${data.missingKey}".to_string()),
    )])));
    let input = RenderInput {
        owner: owner(Node::Mapping(IndexMap::from([(
            "data".to_string(),
            Node::Mapping(IndexMap::from([(
                "existingKey".to_string(),
                Node::String("value".to_string()),
            )])),
        )]))),
        definition: definition(template),
        type_definition: None,
        context: context(),
    };
    let err = render(&engine, input).unwrap_err();
    assert!(is_missing_data_error(&err));
}

#[test]
fn sha256sum_matches_known_digest() {
    let engine = Engine::new();
    let template = envelope(Node::Mapping(IndexMap::from([(
        "digest".to_string(),
        Node::String(r#"${sha256sum("hello world")}"#.to_string()),
    )])));
    let input = RenderInput {
        owner: owner(Node::Mapping(IndexMap::new())),
        definition: definition(template),
        type_definition: None,
        context: context(),
    };
    let out = render(&engine, input).unwrap();
    let spec = spec_of(&out.resolved);
    assert_eq!(
        spec.get("digest"),
        Some(&Node::String(
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9".to_string()
        ))
    );
}

#[test]
fn render_is_deterministic_modulo_auto_filled_context() {
    let engine = Engine::new();
    let template = envelope(Node::Mapping(IndexMap::from([(
        "replicas".to_string(),
        Node::String("${schema.replicas}".to_string()),
    )])));
    let mut def = definition(template);
    def.schema = Node::Mapping(IndexMap::from([(
        "replicas".to_string(),
        Node::String("int | default=3".to_string()),
    )]));

    let run = || {
        render(
            &engine,
            RenderInput {
                owner: owner(Node::Mapping(IndexMap::new())),
                definition: def.clone(),
                type_definition: None,
                context: context(),
            },
        )
        .unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(spec_of(&a.resolved), spec_of(&b.resolved));
}
