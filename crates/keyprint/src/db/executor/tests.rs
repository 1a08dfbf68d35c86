use crate::{
    db::{
        Criteria, EntityInstance, Repository,
        executor::ExecutorError,
        fingerprint::{KeyError, KeyInput},
        store::{BackendError, MemoryBackend, Row, StorageValue},
    },
    error::Error,
    obs::sink::{MetricsEvent, MetricsSink, with_metrics_sink},
    schema::{AppType, ColumnDecl, EntityDecl, EntityMeta},
    transform::TransformError,
    types::{Date, DateTime},
    value::Value,
};
use std::{cell::Cell, rc::Rc};

fn day_repo() -> Repository<MemoryBackend> {
    let meta = EntityMeta::register(
        EntityDecl::new("day_data")
            .column(ColumnDecl::new("day", AppType::Date, "date").primary_key())
            .column(ColumnDecl::new("id1", AppType::Int, "int"))
            .column(ColumnDecl::new("quantity", AppType::Int, "int")),
    )
    .unwrap();

    Repository::new(meta, MemoryBackend::new())
}

fn event_repo(precision: u8) -> Repository<MemoryBackend> {
    let meta = EntityMeta::register(
        EntityDecl::new("event_log")
            .column(
                ColumnDecl::new("at", AppType::DateTime, "datetime")
                    .with_precision(precision)
                    .primary_key(),
            )
            .column(ColumnDecl::new("note", AppType::Text, "text")),
    )
    .unwrap();

    Repository::new(meta, MemoryBackend::new())
}

fn plain_event_repo() -> Repository<MemoryBackend> {
    let meta = EntityMeta::register(
        EntityDecl::new("event_log")
            .column(ColumnDecl::new("at", AppType::DateTime, "datetime").primary_key())
            .column(ColumnDecl::new("note", AppType::Text, "text")),
    )
    .unwrap();

    Repository::new(meta, MemoryBackend::new())
}

fn string_day_repo() -> Repository<MemoryBackend> {
    let meta = EntityMeta::register(
        EntityDecl::new("string_day")
            .column(ColumnDecl::new("day", AppType::Text, "date").primary_key())
            .column(ColumnDecl::new("note", AppType::Text, "text")),
    )
    .unwrap();

    Repository::new(meta, MemoryBackend::new())
}

fn ledger_repo() -> Repository<MemoryBackend> {
    let meta = EntityMeta::register(
        EntityDecl::new("ledger")
            .column(ColumnDecl::new("region", AppType::Text, "text").primary_key())
            .column(ColumnDecl::new("day", AppType::Date, "date").primary_key())
            .column(ColumnDecl::new("total", AppType::Int, "int")),
    )
    .unwrap();

    Repository::new(meta, MemoryBackend::new())
}

fn day(y: i32, m: u8, d: u8) -> Date {
    Date::new_checked(y, m, d).unwrap()
}

fn at(s: &str) -> DateTime {
    DateTime::parse(s).unwrap()
}

fn stored_rows(repo: &Repository<MemoryBackend>) -> Vec<Row> {
    repo.backend().rows(repo.meta().name())
}

fn text(s: &str) -> StorageValue {
    StorageValue::Text(s.to_string())
}

// ---- save ----

#[test]
fn save_inserts_then_updates_in_place() {
    let repo = day_repo();
    let first = EntityInstance::new()
        .with("day", day(2020, 4, 22))
        .with("id1", 1)
        .with("quantity", 10);
    repo.save(first).unwrap();

    let rows = stored_rows(&repo);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("day"), Some(&text("2020-04-22")));
    assert_eq!(rows[0].get("quantity"), Some(&StorageValue::Int(10)));

    let second = EntityInstance::new()
        .with("day", day(2020, 4, 22))
        .with("id1", 3)
        .with("quantity", 20);
    let saved = repo.save(second).unwrap();

    let rows = stored_rows(&repo);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("id1"), Some(&StorageValue::Int(3)));
    assert_eq!(rows[0].get("quantity"), Some(&StorageValue::Int(20)));
    assert_eq!(saved.get("day"), Some(&Value::Date(day(2020, 4, 22))));
    assert_eq!(saved.get("quantity"), Some(&Value::Int(20)));
}

#[test]
fn save_returns_canonical_values() {
    let repo = event_repo(3);
    let noisy = at("2020-05-04T09:32:19.271999729Z");

    let saved = repo
        .save(EntityInstance::new().with("at", noisy).with("note", "n"))
        .unwrap();

    // Truncated to the declared precision, never rounded.
    assert_eq!(
        saved.get("at"),
        Some(&Value::DateTime(at("2020-05-04T09:32:19.271Z")))
    );
}

#[test]
fn save_with_changed_key_inserts_a_second_row() {
    let repo = day_repo();
    repo.save(
        EntityInstance::new()
            .with("day", day(2020, 4, 22))
            .with("quantity", 10),
    )
    .unwrap();

    // Same payload under a new key lands in the insert lane.
    repo.save(
        EntityInstance::new()
            .with("day", day(2020, 4, 23))
            .with("quantity", 10),
    )
    .unwrap();

    let rows = stored_rows(&repo);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|r| r.get("day") == Some(&text("2020-04-22"))));
    assert!(rows.iter().any(|r| r.get("day") == Some(&text("2020-04-23"))));
}

#[test]
fn insert_rejects_an_existing_key() {
    let repo = day_repo();
    let instance = EntityInstance::new()
        .with("day", day(2020, 4, 22))
        .with("quantity", 10);
    repo.insert(instance.clone()).unwrap();

    let err = repo.insert(instance).unwrap_err();
    assert!(matches!(
        err,
        Error::Executor(ExecutorError::KeyExists { .. })
    ));
}

#[test]
fn update_requires_an_existing_row() {
    let repo = day_repo();

    let err = repo
        .update(
            EntityInstance::new()
                .with("day", day(2020, 4, 22))
                .with("quantity", 10),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Executor(ExecutorError::RowNotFound { .. })
    ));
}

#[test]
fn key_only_entities_resave_cleanly() {
    let meta = EntityMeta::register(
        EntityDecl::new("visit_log")
            .column(ColumnDecl::new("day", AppType::Date, "date").primary_key()),
    )
    .unwrap();
    let repo = Repository::new(meta, MemoryBackend::new());

    repo.save(EntityInstance::new().with("day", day(2020, 4, 22)))
        .unwrap();
    let saved = repo
        .save(EntityInstance::new().with("day", day(2020, 4, 22)))
        .unwrap();

    assert_eq!(stored_rows(&repo).len(), 1);
    assert_eq!(saved.get("day"), Some(&Value::Date(day(2020, 4, 22))));
}

#[test]
fn save_rejects_fields_that_name_no_column() {
    let repo = day_repo();

    let err = repo
        .save(
            EntityInstance::new()
                .with("day", day(2020, 4, 22))
                .with("qty", 10),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Transform(TransformError::UnknownColumn { .. })
    ));
    assert!(stored_rows(&repo).is_empty());
}

#[test]
fn save_requires_the_key_fields() {
    let repo = day_repo();

    let err = repo
        .save(EntityInstance::new().with("quantity", 10))
        .unwrap_err();
    assert!(matches!(err, Error::Key(KeyError::IncompleteKey { .. })));
}

#[test]
fn duplicate_stored_rows_fail_loudly() {
    let repo = day_repo();
    repo.backend().seed(
        "day_data",
        Row::new()
            .with("day", text("2020-04-22"))
            .with("quantity", StorageValue::Int(1)),
    );
    repo.backend().seed(
        "day_data",
        Row::new()
            .with("day", text("2020-04-22"))
            .with("quantity", StorageValue::Int(2)),
    );

    let err = repo
        .save(
            EntityInstance::new()
                .with("day", day(2020, 4, 22))
                .with("quantity", 3),
        )
        .unwrap_err();
    match err {
        Error::Executor(ExecutorError::DuplicateFingerprint { count, .. }) => {
            assert_eq!(count, 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = repo
        .find_one(day(2020, 4, 22), &Criteria::new())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Executor(ExecutorError::DuplicateFingerprint { .. })
    ));

    let err = repo.exists(day(2020, 4, 22)).unwrap_err();
    assert!(matches!(
        err,
        Error::Executor(ExecutorError::DuplicateFingerprint { .. })
    ));
}

#[test]
fn backend_errors_pass_through_verbatim() {
    let repo = day_repo();
    repo.backend().inject_failure(BackendError::Unavailable {
        message: "offline".to_string(),
    });

    let err = repo
        .save(
            EntityInstance::new()
                .with("day", day(2020, 4, 22))
                .with("quantity", 10),
        )
        .unwrap_err();
    match err {
        Error::Backend(BackendError::Unavailable { message }) => {
            assert_eq!(message, "offline");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ---- temporal keys ----

#[test]
fn instant_key_with_precision_six_stores_padded_text() {
    let repo = event_repo(6);
    repo.save(
        EntityInstance::new()
            .with("at", at("2020-05-04T09:32:19.271Z"))
            .with("note", "first"),
    )
    .unwrap();

    let rows = stored_rows(&repo);
    assert_eq!(rows[0].get("at"), Some(&text("2020-05-04 09:32:19.271000")));

    // Either parse form of the same instant finds the row.
    let found = repo
        .find_one(at("2020-05-04 09:32:19.271"), &Criteria::new())
        .unwrap();
    assert!(found.is_some());
}

#[test]
fn instant_key_without_precision_matches_any_subsecond() {
    let repo = plain_event_repo();
    repo.save(
        EntityInstance::new()
            .with("at", at("2020-05-04T09:32:19.271Z"))
            .with("note", "first"),
    )
    .unwrap();

    let rows = stored_rows(&repo);
    assert_eq!(rows[0].get("at"), Some(&text("2020-05-04 09:32:19")));

    let same_second = repo
        .find_one(at("2020-05-04T09:32:19.999Z"), &Criteria::new())
        .unwrap();
    assert!(same_second.is_some());

    let next_second = repo
        .find_one(at("2020-05-04T09:32:20Z"), &Criteria::new())
        .unwrap();
    assert!(next_second.is_none());
}

#[test]
fn instant_keys_on_the_first_carrier_day_round_trip() {
    let repo = plain_event_repo();
    let saved = repo
        .save(
            EntityInstance::new()
                .with("at", at("1677-09-21 12:00:00"))
                .with("note", "first"),
        )
        .unwrap();
    assert_eq!(
        saved.get("at"),
        Some(&Value::DateTime(at("1677-09-21 12:00:00")))
    );

    let rows = stored_rows(&repo);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("at"), Some(&text("1677-09-21 12:00:00")));

    let found = repo
        .find_one(at("1677-09-21 12:00:00"), &Criteria::new())
        .unwrap();
    assert!(found.is_some());
}

#[test]
fn text_date_keys_compare_verbatim() {
    let repo = string_day_repo();
    repo.save(
        EntityInstance::new()
            .with("day", "2020-04-22")
            .with("note", "n"),
    )
    .unwrap();

    assert_eq!(stored_rows(&repo)[0].get("day"), Some(&text("2020-04-22")));

    let exact = repo.find_one("2020-04-22", &Criteria::new()).unwrap();
    assert!(exact.is_some());

    // No temporal reinterpretation of string keys.
    let variant = repo.find_one("2020-4-22", &Criteria::new()).unwrap();
    assert!(variant.is_none());

    let err = repo
        .find_one(day(2020, 4, 22), &Criteria::new())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Transform(TransformError::TypeMismatch { .. })
    ));
}

// ---- find ----

#[test]
fn find_filters_on_encoded_criteria() {
    let repo = day_repo();
    for (d, quantity) in [(22, 10), (23, 20), (24, 20)] {
        repo.save(
            EntityInstance::new()
                .with("day", day(2020, 4, d))
                .with("quantity", quantity),
        )
        .unwrap();
    }

    let hits: Vec<EntityInstance> = repo
        .find(&Criteria::new().and("quantity", 20))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(hits.len(), 2);

    // Criteria on a key column go through the same canonical encoding.
    let by_day: Vec<EntityInstance> = repo
        .find(&Criteria::new().and("day", day(2020, 4, 23)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(by_day.len(), 1);
    assert_eq!(by_day[0].get("quantity"), Some(&Value::Int(20)));

    let all = repo.find(&Criteria::new()).unwrap();
    assert_eq!(all.len(), 3);

    assert_eq!(repo.count(&Criteria::new().and("quantity", 20)).unwrap(), 2);
}

#[test]
fn criteria_with_unknown_columns_are_rejected() {
    let repo = day_repo();

    let err = repo
        .find(&Criteria::new().and("quantiy", 1))
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Transform(TransformError::UnknownColumn { .. })
    ));
}

#[test]
fn result_sets_decode_row_by_row() {
    let repo = day_repo();
    repo.save(
        EntityInstance::new()
            .with("day", day(2020, 4, 22))
            .with("quantity", 10),
    )
    .unwrap();
    repo.backend()
        .seed("day_data", Row::new().with("day", text("not-a-date")));

    let results: Vec<Result<EntityInstance, Error>> =
        repo.find(&Criteria::new()).unwrap().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(Error::Transform(TransformError::MalformedStored { .. }))
    ));
}

#[test]
fn find_one_applies_extra_criteria() {
    let repo = day_repo();
    repo.save(
        EntityInstance::new()
            .with("day", day(2020, 4, 22))
            .with("quantity", 10),
    )
    .unwrap();

    let hit = repo
        .find_one(day(2020, 4, 22), &Criteria::new().and("quantity", 10))
        .unwrap();
    assert!(hit.is_some());

    let miss = repo
        .find_one(day(2020, 4, 22), &Criteria::new().and("quantity", 99))
        .unwrap();
    assert!(miss.is_none());
}

#[test]
fn exists_tracks_stored_keys() {
    let repo = day_repo();
    repo.save(
        EntityInstance::new()
            .with("day", day(2020, 4, 22))
            .with("quantity", 10),
    )
    .unwrap();

    assert!(repo.exists(day(2020, 4, 22)).unwrap());
    assert!(!repo.exists(day(2020, 4, 23)).unwrap());
}

#[test]
fn composite_keys_address_one_row() {
    let repo = ledger_repo();
    repo.save(
        EntityInstance::new()
            .with("region", "east")
            .with("day", day(2020, 4, 22))
            .with("total", 5),
    )
    .unwrap();
    repo.save(
        EntityInstance::new()
            .with("region", "west")
            .with("day", day(2020, 4, 22))
            .with("total", 7),
    )
    .unwrap();

    let east_key = KeyInput::composite([
        ("region", Value::from("east")),
        ("day", Value::from(day(2020, 4, 22))),
    ]);
    let east = repo
        .find_one(east_key.clone(), &Criteria::new())
        .unwrap()
        .unwrap();
    assert_eq!(east.get("total"), Some(&Value::Int(5)));

    let err = repo.find_one("east", &Criteria::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Key(KeyError::CompositeKeyRequiresMapping { .. })
    ));

    assert_eq!(repo.delete_by_key(east_key).unwrap(), 1);
    assert_eq!(stored_rows(&repo).len(), 1);
}

// ---- remove ----

#[test]
fn remove_detaches_key_fields() {
    let repo = day_repo();
    let saved = repo
        .save(
            EntityInstance::new()
                .with("day", day(2020, 4, 22))
                .with("quantity", 10),
        )
        .unwrap();

    let removed = repo.remove(saved).unwrap();
    assert!(!removed.contains("day"));
    assert_eq!(removed.get("quantity"), Some(&Value::Int(10)));
    assert!(stored_rows(&repo).is_empty());
    assert!(repo
        .find_one(day(2020, 4, 22), &Criteria::new())
        .unwrap()
        .is_none());
}

#[test]
fn removing_an_absent_row_is_success() {
    let repo = day_repo();

    let removed = repo
        .remove(
            EntityInstance::new()
                .with("day", day(2020, 4, 22))
                .with("quantity", 10),
        )
        .unwrap();
    assert!(!removed.contains("day"));
    assert_eq!(removed.get("quantity"), Some(&Value::Int(10)));
}

#[test]
fn delete_by_key_reports_affected_rows() {
    let repo = day_repo();
    repo.save(
        EntityInstance::new()
            .with("day", day(2020, 4, 22))
            .with("quantity", 10),
    )
    .unwrap();

    assert_eq!(repo.delete_by_key(day(2020, 4, 22)).unwrap(), 1);
    assert_eq!(repo.delete_by_key(day(2020, 4, 22)).unwrap(), 0);
}

// ---- batches ----

#[test]
fn save_many_is_fail_fast() {
    let repo = day_repo();
    let saved = repo
        .save_many([
            EntityInstance::new()
                .with("day", day(2020, 4, 22))
                .with("quantity", 10),
            EntityInstance::new()
                .with("day", day(2020, 4, 23))
                .with("quantity", 20),
        ])
        .unwrap();
    assert_eq!(saved.len(), 2);

    let err = repo
        .save_many([
            EntityInstance::new()
                .with("day", day(2020, 4, 24))
                .with("quantity", 30),
            EntityInstance::new().with("quantity", 40),
            EntityInstance::new()
                .with("day", day(2020, 4, 25))
                .with("quantity", 50),
        ])
        .unwrap_err();
    assert!(matches!(err, Error::Key(KeyError::IncompleteKey { .. })));

    // Earlier elements stay committed.
    assert_eq!(stored_rows(&repo).len(), 3);
}

// ---- instrumentation ----

#[derive(Default)]
struct RecordingSink {
    starts: Cell<u64>,
    rows_touched: Cell<u64>,
}

impl MetricsSink for RecordingSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::ExecStart { .. } => self.starts.set(self.starts.get() + 1),
            MetricsEvent::ExecFinish { rows_touched, .. } => {
                self.rows_touched.set(self.rows_touched.get() + rows_touched);
            }
            MetricsEvent::RowsScanned { .. } => {}
        }
    }
}

#[test]
fn executors_emit_metrics_events() {
    let repo = day_repo();
    let sink = Rc::new(RecordingSink::default());

    with_metrics_sink(sink.clone(), || {
        repo.save(
            EntityInstance::new()
                .with("day", day(2020, 4, 22))
                .with("quantity", 10),
        )
        .unwrap();
        repo.find_one(day(2020, 4, 22), &Criteria::new()).unwrap();
    });

    assert_eq!(sink.starts.get(), 2);
    // One row saved, one row loaded.
    assert_eq!(sink.rows_touched.get(), 2);
}

#[test]
fn debug_logging_does_not_disturb_results() {
    let repo = day_repo().with_debug();
    repo.save(
        EntityInstance::new()
            .with("day", day(2020, 4, 22))
            .with("quantity", 10),
    )
    .unwrap();

    assert!(repo.exists(day(2020, 4, 22)).unwrap());
}
