use std::path::Path;
use std::sync::{Arc, Mutex};

use lintbridge_core::{LOG_PREFIX, Plugin, PluginCreateInfo};
use lintbridge_engine::LintEngine;
use lintbridge_engine::test_utils::{MiniEngine, MiniParser, PanickingEngine};
use lintbridge_host::test_utils::{FixedService, MemoryHost, MemoryProject};
use lintbridge_host::{LanguageService, ServiceOps, SourceDocument};
use serde_json::json;
use tracing::Level;
use tracing_subscriber::prelude::*;

type Records = Arc<Mutex<Vec<(Level, String)>>>;

struct LogCollector(Records);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCollector {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            use std::fmt::Write;
            let _ = write!(self.0, "{:?}", value);
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0.push_str(value);
        }
    }
}

/// Creates a plugin over `config` and requests diagnostics for `/p/a.js`
/// once, returning every event logged meanwhile.
fn run_logged(config: &str, engine: Arc<dyn LintEngine>) -> Vec<(Level, String)> {
    let records: Records = Arc::default();
    let subscriber = tracing_subscriber::registry().with(LogCollector(Arc::clone(&records)));

    tracing::subscriber::with_default(subscriber, || {
        let service = Arc::new(FixedService::new());
        let plugin = Plugin::create(PluginCreateInfo {
            config: json!({ "projectDir": "/p", "deferredIgnoreCheck": "manual" }),
            service: ServiceOps::from_service(service),
            project: Arc::new(
                MemoryProject::new().with_document(SourceDocument::new("/p/a.js", "const x = 1")),
            ),
            config_host: Arc::new(MemoryHost::new().with_file("/p/.lintrc.json", config)),
            parser: Arc::new(MiniParser::new()),
            engine,
        });
        plugin.ops().get_semantic_diagnostics(Path::new("/p/a.js"));
    });

    let records = records.lock().unwrap().clone();
    records
}

fn at_least_warn(records: &[(Level, String)]) -> Vec<&(Level, String)> {
    records
        .iter()
        .filter(|(level, _)| *level <= Level::WARN)
        .collect()
}

#[test]
fn test_create_logs_config_with_prefix() {
    let records = run_logged(r#"{ "parser": "@lintbridge/parser" }"#, Arc::new(MiniEngine::new()));
    let prefix = format!("{} config:", LOG_PREFIX);
    assert!(
        records
            .iter()
            .any(|(level, message)| *level == Level::INFO && message.starts_with(&prefix)),
        "{records:?}"
    );
}

#[test]
fn test_foreign_parser_is_not_a_warning() {
    let records = run_logged(r#"{ "parser": "other-parser" }"#, Arc::new(MiniEngine::new()));
    assert!(at_least_warn(&records).is_empty(), "{records:?}");
    assert!(
        records.iter().any(|(level, message)| *level == Level::DEBUG
            && message.contains("Invalid parser")
            && message.contains("'other-parser'")),
        "{records:?}"
    );
}

#[test]
fn test_engine_panic_is_logged_as_error() {
    let records = run_logged(
        r#"{ "parser": "@lintbridge/parser", "rules": { "semi": "error" } }"#,
        Arc::new(PanickingEngine),
    );
    assert!(
        records.iter().any(|(level, message)| *level == Level::ERROR
            && message.contains("/p/a.js")
            && message.contains("engine blew up")),
        "{records:?}"
    );
}

#[test]
fn test_malformed_config_is_a_warning() {
    let records = run_logged(r#"{ "rules": "#, Arc::new(MiniEngine::new()));
    let warnings = at_least_warn(&records);
    assert!(
        warnings
            .iter()
            .any(|(level, message)| *level == Level::WARN && message.contains("empty config")),
        "{records:?}"
    );
    assert!(warnings.iter().all(|(level, _)| *level == Level::WARN), "{records:?}");
}
