//! Subcommand implementations.

use std::collections::BTreeMap;
use std::process;

use majorka_bus::{BusBackend, EventBus, RedisBackend};
use majorka_import::{ImportConfig, ImportReport, Importer, TracingSink, KNOWN_KINDS};
use majorka_storage::{AnalyticalStore, HttpStore};
use serde::Serialize;

use crate::{report_error, OutputFormat};

fn fail(msg: &str, output: OutputFormat, quiet: bool) -> ! {
    report_error(msg, output, quiet);
    process::exit(1);
}

fn connect(config: &ImportConfig, output: OutputFormat, quiet: bool) -> (HttpStore, EventBus<RedisBackend>) {
    let store = match HttpStore::connected(&config.store_settings()) {
        Ok(store) => store,
        Err(e) => fail(&e.to_string(), output, quiet),
    };
    let backend = match RedisBackend::connect(&config.bus.url) {
        Ok(backend) => backend,
        Err(e) => fail(&e.to_string(), output, quiet),
    };
    (store, EventBus::new(backend, KNOWN_KINDS))
}

// ── run ───────────────────────────────────────────────────────────────────────

pub(crate) fn cmd_run(
    config: &ImportConfig,
    entities: &[String],
    batch_limit: Option<u64>,
    output: OutputFormat,
    quiet: bool,
) {
    let kinds: &[String] = if entities.is_empty() {
        &config.import.entities
    } else {
        entities
    };
    // Unknown kinds are refused before anything is contacted.
    for kind in kinds {
        if !KNOWN_KINDS.contains(&kind.as_str()) {
            fail(
                &format!(
                    "unknown entity kind '{}'; importable kinds: {}",
                    kind,
                    KNOWN_KINDS.join(", ")
                ),
                output,
                quiet,
            );
        }
    }

    let (store, bus) = connect(config, output, quiet);
    let mut importer =
        Importer::new(bus, store).with_batch_limit(batch_limit.or(config.import.batch_limit));

    let (reports, failure) = import_kinds(&mut importer, kinds, output, quiet);
    // Reports of kinds that finished stay visible when a later kind fails.
    if output == OutputFormat::Json {
        print_json(&reports);
    }
    if let Some(msg) = failure {
        fail(&msg, output, quiet);
    }
}

/// Import `kinds` in order, stopping at the first failure.
fn import_kinds<B: BusBackend, S: AnalyticalStore>(
    importer: &mut Importer<B, S>,
    kinds: &[String],
    output: OutputFormat,
    quiet: bool,
) -> (Vec<ImportReport>, Option<String>) {
    let mut reports: Vec<ImportReport> = Vec::new();
    for kind in kinds {
        match importer.import_kind(kind, &mut TracingSink) {
            Ok(report) => {
                if output == OutputFormat::Text && !quiet {
                    println!("{}", report);
                }
                reports.push(report);
            }
            Err(e) => return (reports, Some(format!("import of {} failed: {}", kind, e))),
        }
    }
    (reports, None)
}

// ── check ─────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CheckReport<'a> {
    store: &'a str,
    database: &'a str,
    bus: &'a str,
    records: BTreeMap<String, u64>,
}

pub(crate) fn cmd_check(config: &ImportConfig, output: OutputFormat, quiet: bool) {
    let (_store, mut bus) = connect(config, output, quiet);
    let mut records = BTreeMap::new();
    for kind in &config.import.entities {
        match bus.count(kind) {
            Ok(count) => {
                records.insert(kind.clone(), count);
            }
            Err(e) => fail(&e.to_string(), output, quiet),
        }
    }

    match output {
        OutputFormat::Json => print_json(&CheckReport {
            store: &config.store.url,
            database: &config.store.database,
            bus: &config.bus.url,
            records,
        }),
        OutputFormat::Text => {
            if !quiet {
                println!("store ok: {} ({})", config.store.url, config.store.database);
                println!("bus ok: {}", config.bus.url);
                for (kind, count) in &records {
                    println!("  {}: {} record(s)", kind, count);
                }
            }
        }
    }
}

// ── config ────────────────────────────────────────────────────────────────────

pub(crate) fn cmd_config(config: &ImportConfig, output: OutputFormat) {
    match output {
        OutputFormat::Json => print_json(config),
        OutputFormat::Text => match toml::to_string_pretty(config) {
            Ok(text) => print!("{}", text),
            Err(e) => fail(&format!("serialization error: {}", e), output, false),
        },
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    let pretty =
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}
