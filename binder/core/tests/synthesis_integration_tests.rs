// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end synthesis over fixture manifests: error aggregation, strategy
//! totality, tier monotonicity, determinism and concurrent resolution.

use capbind_core::application::compliance_enforcer::standard_rules;
use capbind_core::application::synthesis::SynthesisPlan;
use capbind_core::application::{ComplianceEnforcer, SynthesisDriver, SynthesisOptions};
use capbind_core::domain::binding::ComplianceTier;
use capbind_core::domain::compliance::ComplianceSettings;
use capbind_core::domain::component::ComponentId;
use capbind_core::domain::engine_config::EngineConfigManifest;
use capbind_core::domain::error::BindingErrorKind;
use capbind_core::domain::manifest::ServiceManifest;
use capbind_core::domain::strategy::{BinderStrategy, StrategyTable};
use capbind_core::infrastructure::manifest_parser::ServiceManifestParser;
use capbind_core::infrastructure::metrics::AuditMetricsCollector;
use capbind_core::infrastructure::strategies::{
    cache::CacheStrategy, compute::FunctionInvokeStrategy, database::DatabaseStrategy,
    gateway::{ApiInvokeStrategy, GatewayIntegrationStrategy},
    observability::ObservabilityStrategy, queue::QueueStrategy, secret::SecretStrategy,
    storage::StorageStrategy,
};
use std::io::Write;
use std::sync::Arc;

const MARKETPLACE: &str = r#"
apiVersion: capbind.dev/v1
kind: ServiceManifest
metadata:
  name: marketplace
  version: "2.3.0"
spec:
  environment: prod
  compliance_tier: elevated
  components:
    - id: storefront
      type: api-gateway
      bindings:
        - target: catalog-fn
          capability: compute:lambda
          access: write
        - target: payment-key
          capability: secret:secretsmanager
          access: read
    - id: catalog-fn
      type: compute-function
      provides:
        - capability: compute:lambda
          attributes:
            functionName: catalog
            functionArn: "arn:aws:lambda:eu-west-1:123456789012:function:catalog"
      bindings:
        - target: catalog-db
          capability: db:postgres
          access: read
        - target: images
          capability: storage:s3
          access: read
        - target: sessions
          capability: cache:redis
          access: read-write
    - id: order-worker
      type: worker
      bindings:
        - target: orders-queue
          capability: queue:sqs
          access: read
        - target: order-events
          capability: topic:sns
          access: write
        - target: catalog-db
          capability: db:postgres
          access: read-write
        - target: billing
          capability: api:rest
          access: write
        - target: catalog-fn
          capability: compute:lambda
          access: write
    - id: catalog-db
      type: database
      provides:
        - capability: db:postgres
          attributes:
            host: catalog.cluster.internal
            port: 5432
            resourceArn: "arn:aws:rds-db:eu-west-1:123456789012:dbuser:catalog/app"
    - id: images
      type: storage
      provides:
        - capability: storage:s3
          attributes:
            bucketName: marketplace-images
            bucketArn: "arn:aws:s3:::marketplace-images"
    - id: sessions
      type: cache
      provides:
        - capability: cache:redis
          attributes:
            host: sessions.cache.internal
            port: 6379
            transportEncryption: true
    - id: orders-queue
      type: queue
      provides:
        - capability: queue:sqs
          attributes:
            queueUrl: "https://sqs.eu-west-1.amazonaws.com/123456789012/orders"
            queueArn: "arn:aws:sqs:eu-west-1:123456789012:orders"
    - id: order-events
      type: other-bus
      provides:
        - capability: topic:sns
          attributes:
            topicArn: "arn:aws:sns:eu-west-1:123456789012:order-events"
    - id: billing
      type: external-api
      provides:
        - capability: api:rest
          attributes:
            apiUrl: "https://billing.internal/v2"
    - id: payment-key
      type: secret-store
      provides:
        - capability: secret:secretsmanager
          attributes:
            secretArn: "arn:aws:secretsmanager:eu-west-1:123456789012:secret:payment"
"#;

/// Three independent broken bindings among valid ones.
const BROKEN: &str = r#"
apiVersion: capbind.dev/v1
kind: ServiceManifest
metadata:
  name: broken
spec:
  environment: prod
  compliance_tier: baseline
  components:
    - id: api
      type: compute-function
      bindings:
        - target: ledger
          capability: db:postgres
          access: admin
        - target: jobs
          capability: queue:sqs
          access: write
        - target: ledger
          capability: db:postgres
          access: read
    - id: archive
      type: storage
      bindings:
        - target: sessions
          capability: cache:redis
          access: read
    - id: ledger
      type: database
      provides:
        - capability: db:postgres
          attributes:
            host: ledger.internal
            port: 5432
            resourceArn: "arn:aws:rds-db:eu-west-1:1:dbuser:ledger/app"
    - id: jobs
      type: queue
      provides:
        - capability: queue:sqs
          attributes:
            queueUrl: "https://sqs.eu-west-1.amazonaws.com/1/jobs"
    - id: sessions
      type: cache
      provides:
        - capability: cache:redis
          attributes:
            host: sessions.internal
            port: 6379
"#;

fn driver(options: SynthesisOptions) -> SynthesisDriver {
    SynthesisDriver::from_config(&EngineConfigManifest::default(), Arc::new(AuditMetricsCollector::new()))
        .with_options(options)
}

fn parse(yaml: &str) -> ServiceManifest {
    ServiceManifestParser::parse_yaml(yaml).unwrap()
}

fn all_strategies() -> Vec<Arc<dyn BinderStrategy>> {
    let strategies: [Arc<dyn BinderStrategy>; 9] = [
        Arc::new(DatabaseStrategy),
        Arc::new(StorageStrategy),
        Arc::new(CacheStrategy),
        Arc::new(QueueStrategy),
        Arc::new(FunctionInvokeStrategy),
        Arc::new(GatewayIntegrationStrategy),
        Arc::new(ApiInvokeStrategy),
        Arc::new(SecretStrategy),
        Arc::new(ObservabilityStrategy),
    ];
    Vec::from(strategies)
}

fn table_from(strategies: Vec<Arc<dyn BinderStrategy>>) -> StrategyTable {
    strategies.into_iter().fold(StrategyTable::new(), StrategyTable::with)
}

fn fingerprints(report: &capbind_core::application::SynthesisReport) -> Vec<(String, String)> {
    report
        .bindings
        .iter()
        .map(|record| (record.subject.to_string(), record.fingerprint.clone()))
        .collect()
}

#[test]
fn test_marketplace_synthesises_cleanly() {
    let report = driver(SynthesisOptions::default()).synthesize(&parse(MARKETPLACE)).unwrap();

    assert!(report.is_success(), "{:#?}", report.failures());
    // 10 declared + telemetry for the function and the worker
    assert_eq!(report.planned, 12);
    assert_eq!(report.bindings.len(), 12);
    assert_eq!(report.bindings.iter().filter(|b| b.injected).count(), 2);
    assert_eq!(report.compliance_tier, ComplianceTier::Elevated);

    let catalog_fn = report.attachments_for(&ComponentId::new("catalog-fn")).unwrap();
    assert!(catalog_fn
        .access_statements
        .iter()
        .any(|s| s.principal.as_deref() == Some("apigateway.amazonaws.com")));
    assert_eq!(
        catalog_fn.environment_variables["SESSIONS_URL"],
        "rediss://sessions.cache.internal:6379"
    );
}

#[test]
fn test_error_completeness() {
    let report = driver(SynthesisOptions::default().without_observability())
        .synthesize(&parse(BROKEN))
        .unwrap();

    assert_eq!(report.failures().len(), 3);
    let kinds: Vec<BindingErrorKind> = report
        .failures()
        .iter()
        .filter_map(|f| f.as_binding_error().map(|e| e.kind()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            BindingErrorKind::ComplianceViolation,
            BindingErrorKind::BindingExecution,
            BindingErrorKind::StrategyNotFound,
        ]
    );

    let violation = &report.failures()[0];
    assert_eq!(violation.violations()[0].rule_id, "BASE-ADMIN-DATASTORE");
    assert!(!violation.violations()[0].remediation.is_empty());
    assert_eq!(violation.subject().target_component_id.as_str(), "ledger");

    assert_eq!(report.bindings.len(), 1);
    assert_eq!(report.metrics.errors, 2);
    assert_eq!(report.metrics.violations, 1);

    let by_class = report.failures_by_class();
    assert_eq!(by_class["StrategyNotFound"], 1);
    assert_eq!(by_class["ComplianceViolation"], 1);
    assert_eq!(by_class["BindingExecutionError"], 1);
}

#[test]
fn test_strategy_totality_over_fixture_pairs() {
    let d = driver(SynthesisOptions::default());
    let plan: SynthesisPlan = d.plan(&parse(MARKETPLACE)).unwrap();

    let forward = table_from(all_strategies());
    let mut reversed_order = all_strategies();
    reversed_order.reverse();
    let reversed = table_from(reversed_order);

    for planned in &plan.bindings {
        let capability = &planned.directive.capability;
        let candidates = forward.candidates(&planned.source_type, capability);
        assert_eq!(candidates.len(), 1, "{} -> {}", planned.source_type, capability);

        let a = forward.resolve(&planned.source_type, capability).map(|s| s.name().to_string());
        let b = reversed.resolve(&planned.source_type, capability).map(|s| s.name().to_string());
        assert!(a.is_some());
        assert_eq!(a, b);
    }
}

#[test]
fn test_tier_monotonicity() {
    let d = driver(SynthesisOptions::default());
    let enforcer = ComplianceEnforcer::standard(ComplianceSettings::default());
    let variants = [
        MARKETPLACE.to_string(),
        MARKETPLACE.replace("access: read-write", "access: admin"),
        MARKETPLACE.replace("port: 5432", "port: 5432\n            publiclyAccessible: true"),
        MARKETPLACE.replace("transportEncryption: true", "transportEncryption: false"),
    ];

    for yaml in &variants {
        let manifest = parse(yaml);
        let contexts_at = |tier: ComplianceTier| {
            let plan = d.plan(&manifest).unwrap();
            let plan = SynthesisPlan {
                compliance_tier: tier,
                ..plan
            };
            plan.bindings
                .iter()
                .map(|planned| plan.context(planned).unwrap())
                .collect::<Vec<_>>()
        };
        let baseline = contexts_at(ComplianceTier::Baseline);
        let elevated = contexts_at(ComplianceTier::Elevated);
        let strict = contexts_at(ComplianceTier::Strict);

        for ((low, mid), high) in baseline.iter().zip(&elevated).zip(&strict) {
            let at_strict = enforcer.enforce(high);
            if at_strict.is_approved() {
                assert!(enforcer.enforce(mid).is_approved());
                assert!(enforcer.enforce(low).is_approved());
            }

            let baseline_rules = |outcome: &capbind_core::application::EnforcementOutcome| {
                outcome
                    .violations
                    .iter()
                    .filter(|v| v.rule_id.starts_with("BASE-"))
                    .cloned()
                    .collect::<Vec<_>>()
            };
            let expected = baseline_rules(&enforcer.enforce(low));
            assert_eq!(baseline_rules(&enforcer.enforce(mid)), expected);
            assert_eq!(baseline_rules(&at_strict), expected);
        }
    }

    assert!(standard_rules().iter().any(|r| r.tier == ComplianceTier::Baseline));
}

#[test]
fn test_duplicate_binding_is_a_cache_hit() {
    let yaml = BROKEN.replace("access: admin", "access: read");
    let report = driver(SynthesisOptions::default().without_observability())
        .synthesize(&parse(&yaml))
        .unwrap();

    // api -> ledger (read) is now declared twice
    assert_eq!(report.metrics.cache_hits, 1);
    let ledger: Vec<_> = report
        .bindings
        .iter()
        .filter(|b| b.subject.target_component_id.as_str() == "ledger")
        .collect();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].fingerprint, ledger[1].fingerprint);
}

#[test]
fn test_runs_are_deterministic_and_independent() {
    let manifest = parse(MARKETPLACE);
    let d = driver(SynthesisOptions::default().with_tier(ComplianceTier::Strict));

    let first = d.synthesize(&manifest).unwrap();
    let second = d.synthesize(&manifest).unwrap();
    let fresh = driver(SynthesisOptions::default().with_tier(ComplianceTier::Strict))
        .synthesize(&manifest)
        .unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(fingerprints(&first), fingerprints(&second));
    assert_eq!(fingerprints(&first), fingerprints(&fresh));
    // The cache is cleared between runs, so the second run misses again.
    assert_eq!(second.metrics.cache_hits, 0);
    assert_eq!(second.metrics.cache_misses, first.metrics.cache_misses);
}

#[tokio::test]
async fn test_concurrent_synthesis_matches_sequential() {
    let manifest = parse(MARKETPLACE);
    let d = driver(SynthesisOptions::default());

    let sequential = d.synthesize(&manifest).unwrap();
    let concurrent = d.synthesize_concurrently(&manifest).await.unwrap();

    assert!(concurrent.is_success());
    assert_eq!(fingerprints(&sequential), fingerprints(&concurrent));
    assert_eq!(sequential.attachments, concurrent.attachments);
}

#[tokio::test]
async fn test_concurrent_synthesis_reports_all_failures() {
    let d = driver(SynthesisOptions::default().without_observability());
    let report = d.synthesize_concurrently(&parse(BROKEN)).await.unwrap();

    let classes: Vec<String> = report.failures().iter().map(|f| f.class()).collect();
    assert_eq!(
        classes,
        vec!["ComplianceViolation", "BindingExecutionError", "StrategyNotFound"]
    );
}

#[test]
fn test_synthesise_manifest_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MARKETPLACE.as_bytes()).unwrap();

    let manifest = ServiceManifestParser::parse_file(file.path()).unwrap();
    let report = driver(SynthesisOptions::default().with_environment("staging"))
        .synthesize(&manifest)
        .unwrap();

    assert_eq!(report.environment, "staging");
    assert_eq!(report.manifest, "marketplace");
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["manifest"], "marketplace");
    assert_eq!(json["failures"].as_array().map(Vec::len), Some(0));
}
