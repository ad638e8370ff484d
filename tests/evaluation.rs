use pex_evaluation::{
    config::{CredentialPathStyle, EvaluationOptions},
    core::{
        input_descriptor::{
            Constraints, ConstraintsField, ConstraintsLimitDisclosure, InputDescriptor, Schema,
        },
        presentation_definition::PresentationDefinition,
        presentation_submission::DescriptorMap,
    },
    evaluation::{
        limit_disclosure, EvaluationContext, EvaluationError, EvaluationHandler, EvaluationPipeline,
        JsonPathResolver, LimitDisclosureHandler, Status, UriEvaluationHandler,
    },
};
use serde_json::{json, Value};
use serde_json_path::JsonPath;

fn degree_credential() -> Value {
    json!({
        "@context": [
            "https://www.w3.org/2018/credentials/v1",
            "https://www.w3.org/2018/credentials/examples/v1"
        ],
        "id": "http://example.edu/credentials/1872",
        "type": ["VerifiableCredential", "https://example.org/schema#A"],
        "issuer": "did:example:76e12ec712ebc6f1c221ebfeb1f",
        "issuanceDate": "2010-01-01T19:23:24Z",
        "credentialSchema": {
            "id": "https://example.org/examples/degree.json",
            "type": "JsonSchemaValidator2018"
        },
        "credentialSubject": {
            "id": "did:example:ebfeb1f712ebc6f1c276e12ec21",
            "name": "Jayden Doe",
            "degree": {
                "type": "BachelorDegree",
                "name": "Bachelor of Science and Arts"
            }
        },
        "proof": {
            "type": "RsaSignature2018",
            "created": "2017-06-18T21:19:10Z",
            "jws": "eyJhbGciOiJSUzI1NiIsImI2NCI6ZmFsc2UsImNyaXQiOlsiYjY0Il19..TCYt5X"
        }
    })
}

fn path(expression: &str) -> JsonPath {
    JsonPath::parse(expression).unwrap()
}

fn schema_descriptor(id: &str, uri: &str) -> InputDescriptor {
    InputDescriptor::new(id).add_schema(Schema::new(uri))
}

fn uri_context(definition: &PresentationDefinition, credentials: &[Value]) -> EvaluationContext {
    let mut context = EvaluationContext::new(credentials.to_vec(), EvaluationOptions::default());
    UriEvaluationHandler
        .handle(&mut context, definition, credentials)
        .unwrap();
    context
}

fn descriptor_map(context: &EvaluationContext) -> Vec<DescriptorMap> {
    context
        .presentation()
        .presentation_submission()
        .unwrap()
        .descriptor_map()
        .clone()
}

#[test]
fn v2_pairs_always_match() {
    let definition = PresentationDefinition::v2("definition", InputDescriptor::new("a"))
        .add_input_descriptors(InputDescriptor::new("b"));
    let credentials = vec![degree_credential(), json!({ "type": "Unrelated" })];

    let context = uri_context(&definition, &credentials);

    assert_eq!(context.results().len(), 4);
    assert!(context
        .results()
        .iter()
        .all(|result| result.status == Status::Info && result.evaluator == "UriEvaluation"));

    let paths: Vec<(String, String)> = context
        .results()
        .iter()
        .map(|r| {
            (
                r.input_descriptor_path.clone(),
                r.verifiable_credential_path.clone(),
            )
        })
        .collect();
    assert_eq!(
        paths,
        vec![
            ("$.input_descriptors[0]".into(), "$[0]".into()),
            ("$.input_descriptors[0]".into(), "$[1]".into()),
            ("$.input_descriptors[1]".into(), "$[0]".into()),
            ("$.input_descriptors[1]".into(), "$[1]".into()),
        ]
    );
}

#[test]
fn v1_type_uri_match_and_mismatch() {
    let definition = PresentationDefinition::v1(
        "definition",
        schema_descriptor("degree", "https://example.org/schema#A"),
    );

    let context = uri_context(
        &definition,
        &[json!({ "type": ["https://example.org/schema#A"] })],
    );
    assert_eq!(context.results().len(), 1);
    assert_eq!(context.results()[0].status, Status::Info);
    assert_eq!(
        context.results()[0].payload["descriptorUris"],
        json!(["https://example.org/schema#A"])
    );

    let context = uri_context(
        &definition,
        &[json!({ "type": ["https://example.org/schema#B"] })],
    );
    assert_eq!(context.results().len(), 1);
    assert_eq!(context.results()[0].status, Status::Error);
    assert!(descriptor_map(&context).is_empty());
}

#[test]
fn v1_matches_context_and_credential_schema() {
    let credential = degree_credential();

    let by_context = PresentationDefinition::v1(
        "definition",
        schema_descriptor("a", "https://www.w3.org/2018/credentials/examples/v1"),
    );
    let by_schema = PresentationDefinition::v1(
        "definition",
        schema_descriptor("a", "https://example.org/examples/degree.json"),
    );

    for definition in [by_context, by_schema] {
        let context = uri_context(&definition, std::slice::from_ref(&credential));
        let result = &context.results()[0];
        assert_eq!(result.status, Status::Info);
        assert_eq!(result.payload["context"], credential["@context"]);
        assert_eq!(
            result.payload["credentialSchema"],
            credential["credentialSchema"]
        );
    }
}

#[test]
fn hashlink_schema_uri_warns() {
    let definition = PresentationDefinition::v1(
        "definition",
        InputDescriptor::new("degree")
            .add_schema(Schema::new("hl:zQmAbc:zQmXyz"))
            .add_schema(Schema::new("https://example.org/schema#A")),
    );

    let context = uri_context(
        &definition,
        &[json!({ "type": ["https://example.org/schema#A"] })],
    );
    let statuses: Vec<Status> = context.results().iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![Status::Warn, Status::Info]);
    assert_eq!(context.results()[0].payload, json!({ "uri": "hl:zQmAbc:zQmXyz" }));

    let context = uri_context(
        &definition,
        &[json!({ "type": ["https://example.org/schema#B"] })],
    );
    let statuses: Vec<Status> = context.results().iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![Status::Warn, Status::Error]);
}

#[test]
fn descriptor_map_mirrors_info_results() {
    let definition = PresentationDefinition::v1(
        "definition",
        schema_descriptor("a", "https://example.org/schema#A"),
    )
    .add_input_descriptors(schema_descriptor("b", "https://example.org/schema#B"));
    let credentials = vec![
        json!({ "type": ["https://example.org/schema#A"] }),
        json!({ "type": ["https://example.org/schema#B"] }),
        json!({ "type": ["https://example.org/schema#A", "https://example.org/schema#B"] }),
    ];

    let context = uri_context(&definition, &credentials);
    let infos: Vec<_> = context.results_with_status(Status::Info).collect();
    let map = descriptor_map(&context);

    assert_eq!(map.len(), infos.len());
    for (entry, result) in map.iter().zip(infos) {
        assert_eq!(entry.path, path(&result.verifiable_credential_path));
        assert_eq!(entry.format.to_string(), "ldp_vc");
    }
    assert_eq!(
        map,
        vec![
            DescriptorMap::new("a", "ldp_vc", path("$[0]")),
            DescriptorMap::new("a", "ldp_vc", path("$[2]")),
            DescriptorMap::new("b", "ldp_vc", path("$[1]")),
            DescriptorMap::new("b", "ldp_vc", path("$[2]")),
        ]
    );

    let submission = context.presentation().presentation_submission().unwrap();
    assert_eq!(submission.definition_id(), "definition");
}

#[test]
fn uri_evaluation_is_idempotent() {
    let definition = PresentationDefinition::v1(
        "definition",
        schema_descriptor("a", "https://example.org/schema#A"),
    );
    let credentials = vec![degree_credential(), json!({ "type": "Other" })];

    let first = uri_context(&definition, &credentials);
    let second = uri_context(&definition, &credentials);

    assert_eq!(descriptor_map(&first), descriptor_map(&second));
    assert_ne!(
        first.presentation().presentation_submission().unwrap().id(),
        second.presentation().presentation_submission().unwrap().id()
    );
}

#[test]
fn submission_is_replaced_on_rerun() {
    let definition = PresentationDefinition::v2("definition", InputDescriptor::new("a"));
    let credentials = vec![degree_credential()];
    let mut context = uri_context(&definition, &credentials);

    UriEvaluationHandler
        .handle(&mut context, &definition, &credentials)
        .unwrap();

    // The log keeps the first run's records and the map covers all of them.
    assert_eq!(context.results().len(), 2);
    assert_eq!(descriptor_map(&context).len(), 2);
}

#[test]
fn non_object_credential_is_fatal() {
    let definition = PresentationDefinition::v2("definition", InputDescriptor::new("a"));
    let credentials = vec![json!("eyJhbGciOiJFUzI1NiJ9.e30.sig")];
    let mut context = EvaluationContext::new(credentials.clone(), EvaluationOptions::default());

    let err = UriEvaluationHandler
        .handle(&mut context, &definition, &credentials)
        .unwrap_err();
    assert!(matches!(err, EvaluationError::MalformedCredential { .. }));
}

fn limited_definition(fields: Vec<ConstraintsField>) -> PresentationDefinition {
    let constraints = fields.into_iter().fold(
        Constraints::new().set_limit_disclosure(ConstraintsLimitDisclosure::Required),
        Constraints::add_constraint,
    );

    PresentationDefinition::v1(
        "definition",
        schema_descriptor("degree", "https://example.org/schema#A").set_constraints(constraints),
    )
}

#[test]
fn limited_disclosure_keeps_mandatory_and_selected_fields() {
    let definition = limited_definition(vec![ConstraintsField::new(
        "$.credentialSubject.degree.type",
    )]);
    let credentials = vec![degree_credential()];

    let context = EvaluationPipeline::default()
        .evaluate(&definition, &credentials)
        .unwrap();

    let disclosure: Vec<_> = context
        .results()
        .iter()
        .filter(|r| r.evaluator == limit_disclosure::NAME)
        .collect();
    assert_eq!(disclosure.len(), 1);
    assert_eq!(disclosure[0].status, Status::Info);
    assert_eq!(
        disclosure[0].payload,
        json!(["$", "credentialSubject", "degree", "type"])
    );

    let presented = context.presentation().verifiable_credential().unwrap();
    assert_eq!(presented.len(), 2);
    assert_eq!(presented[0], credentials[0]);

    let source = &credentials[0];
    assert_eq!(
        presented[1],
        json!({
            "@context": source["@context"],
            "id": source["id"],
            "credentialSchema": source["credentialSchema"],
            "credentialSubject": { "degree": { "type": "BachelorDegree" } },
            "type": source["type"]
        })
    );
}

#[test]
fn disclosed_array_elements_are_not_rewritten() {
    let definition = limited_definition(vec![
        ConstraintsField::new("$.credentialSubject.degrees"),
        ConstraintsField::new("$.credentialSubject.degrees[1].type"),
    ]);
    let mut credential = degree_credential();
    credential["credentialSubject"]["degrees"] = json!([
        { "type": "BachelorDegree", "name": "Bachelor of Science" },
        { "type": "MasterDegree", "name": "Master of Science" }
    ]);
    let credentials = vec![credential];

    let context = EvaluationPipeline::default()
        .evaluate(&definition, &credentials)
        .unwrap();

    let presented = context.presentation().verifiable_credential().unwrap();
    assert_eq!(
        presented[1]["credentialSubject"],
        json!({ "degrees": credentials[0]["credentialSubject"]["degrees"] })
    );
}

#[test]
fn missing_field_is_reported_and_processing_continues() {
    let definition = limited_definition(vec![
        ConstraintsField::new("$.credentialSubject.birthDate")
            .add_path("$.credentialSubject.dob"),
        ConstraintsField::new("$.credentialSubject.name"),
    ]);
    let credentials = vec![degree_credential()];
    let mut context = EvaluationContext::new(credentials.clone(), EvaluationOptions::default());

    LimitDisclosureHandler::new(JsonPathResolver)
        .handle(&mut context, &definition, &credentials)
        .unwrap();

    let statuses: Vec<Status> = context.results().iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![Status::Error, Status::Info]);
    assert_eq!(
        context.results()[0].payload,
        json!(["$.credentialSubject.birthDate", "$.credentialSubject.dob"])
    );

    // Without a submission nothing is attached.
    assert_eq!(
        context.presentation().verifiable_credential(),
        Some(&credentials)
    );
}

#[test]
fn first_resolving_expression_wins() {
    let definition = limited_definition(vec![ConstraintsField::new("$.vc.issuer")
        .add_path("$.issuer")
        .add_path("$.credentialSubject.id")]);
    let credentials = vec![degree_credential()];

    let context = EvaluationPipeline::default()
        .evaluate(&definition, &credentials)
        .unwrap();

    let disclosed = &context.presentation().verifiable_credential().unwrap()[1];
    assert_eq!(disclosed["issuer"], json!("did:example:76e12ec712ebc6f1c221ebfeb1f"));
    // The verbatim copy of the subject stays since no field descended into it.
    assert_eq!(disclosed["credentialSubject"], credentials[0]["credentialSubject"]);
    assert!(disclosed.get("proof").is_none());
}

#[test]
fn absent_mandatory_fields_are_written_as_null() {
    let definition = PresentationDefinition::v2(
        "definition",
        InputDescriptor::new("name").set_constraints(
            Constraints::new()
                .set_limit_disclosure(ConstraintsLimitDisclosure::Required)
                .add_constraint(ConstraintsField::new("$.credentialSubject.name")),
        ),
    );
    let credentials = vec![json!({
        "type": "VerifiableCredential",
        "credentialSubject": { "name": "Jayden Doe", "age": 42 }
    })];

    let context = EvaluationPipeline::default()
        .evaluate(&definition, &credentials)
        .unwrap();

    assert_eq!(
        context.presentation().verifiable_credential().unwrap()[1],
        json!({
            "@context": null,
            "id": null,
            "credentialSchema": null,
            "credentialSubject": { "name": "Jayden Doe" },
            "type": "VerifiableCredential"
        })
    );
}

#[test]
fn disclosed_credential_is_appended_per_descriptor_map_entry() {
    let definition = limited_definition(vec![ConstraintsField::new(
        "$.credentialSubject.degree.type",
    )]);
    let credentials = vec![degree_credential(), degree_credential()];

    let context = EvaluationPipeline::default()
        .evaluate(&definition, &credentials)
        .unwrap();

    // Two descriptor map entries for `degree`, two credentials disclosed:
    // each disclosed credential is appended once per entry.
    assert_eq!(descriptor_map(&context).len(), 2);
    assert_eq!(
        context.presentation().verifiable_credential().map(Vec::len),
        Some(2 + 2 * 2)
    );
}

#[test]
fn preferred_limit_disclosure_passes_through() {
    let definition = PresentationDefinition::v2(
        "definition",
        InputDescriptor::new("degree").set_constraints(
            Constraints::new()
                .set_limit_disclosure(ConstraintsLimitDisclosure::Preferred)
                .add_constraint(ConstraintsField::new("$.credentialSubject.missing")),
        ),
    );
    let credentials = vec![degree_credential()];

    let context = EvaluationPipeline::default()
        .evaluate(&definition, &credentials)
        .unwrap();

    assert!(!context.has_errors());
    assert_eq!(context.presentation().verifiable_credential(), Some(&credentials));
}

#[test]
fn invalid_field_path_aborts_the_run() {
    let definition = limited_definition(vec![
        ConstraintsField::new("$.credentialSubject.name"),
        ConstraintsField::new("$.[invalid"),
    ]);
    let credentials = vec![degree_credential()];
    let pipeline = EvaluationPipeline::default();
    let mut context = EvaluationContext::new(credentials.clone(), EvaluationOptions::default());

    let err = pipeline
        .run(&mut context, &definition, &credentials)
        .unwrap_err();

    assert!(matches!(err, EvaluationError::InvalidPathExpression { .. }));
    // The URI evaluation and the first field were recorded before the failure.
    assert_eq!(context.results().len(), 2);
}

#[test]
fn pipeline_runs_handlers_in_order_with_options() {
    let options = EvaluationOptions {
        credential_path: CredentialPathStyle::VerifiableCredential,
        ..Default::default()
    };
    let pipeline = EvaluationPipeline::new(options)
        .with_handler(UriEvaluationHandler)
        .with_handler(LimitDisclosureHandler::new(JsonPathResolver));
    assert_eq!(
        pipeline.handler_names(),
        vec!["UriEvaluation", "LimitDisclosureEvaluation"]
    );

    let definition = limited_definition(vec![ConstraintsField::new("$.credentialSubject.name")]);
    let credentials = vec![degree_credential()];
    let (results, presentation) = pipeline
        .evaluate(&definition, &credentials)
        .unwrap()
        .into_parts();

    assert!(results
        .iter()
        .all(|r| r.verifiable_credential_path == "$.verifiableCredential[0]"));

    let document: Value = presentation.into();
    assert_eq!(
        document["presentation_submission"]["descriptor_map"],
        json!([{ "id": "degree", "format": "ldp_vc", "path": "$.verifiableCredential[0]" }])
    );
    assert_eq!(
        document["verifiableCredential"][1]["credentialSubject"],
        json!({ "name": "Jayden Doe" })
    );
}
