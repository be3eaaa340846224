//! Query builder against in-memory SQLite.

use chrono::NaiveDate;
use drift_core::{DriftError, Field, ModelSchema, Record, Result};
use drift_orm::{InsertValues, Migration, Model};
use drift_sqlite::{Migrator, SqliteStore};

#[derive(Debug, PartialEq)]
struct Giraffe {
    id: i64,
    name: Option<String>,
    date: NaiveDate,
}

impl Model for Giraffe {
    const NAME: &'static str = "Giraffe";

    fn define(schema: &mut ModelSchema) -> Result<()> {
        schema
            .add_field("id", Field::integer().primary_key())?
            .add_field("name", Field::string().min_length(0).max_length(10))?
            .add_field("date", Field::date())?;
        Ok(())
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: record.get("id")?,
            name: record.get("name")?,
            date: record.get("date")?,
        })
    }
}

async fn store_with<M: Model>() -> SqliteStore {
    let store = SqliteStore::in_memory().await.unwrap();
    Migrator::new(store.clone()).sync::<M>().await.unwrap();
    store
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_create_returns_generated_id() {
    let store = store_with::<Giraffe>().await;

    let giraffe = Giraffe::query()
        .create(
            &store,
            InsertValues::new().set("name", "Amazing").set("date", "2024-01-01"),
        )
        .await
        .unwrap();

    assert_eq!(
        giraffe,
        Giraffe {
            id: 1,
            name: Some("Amazing".to_string()),
            date: date(2024, 1, 1),
        }
    );
}

#[tokio::test]
async fn test_create_fills_defaults() {
    let store = store_with::<Giraffe>().await;

    let giraffe = Giraffe::query()
        .create(&store, InsertValues::new().set("name", "Spotty"))
        .await
        .unwrap();
    assert_eq!(giraffe.id, 1);
    assert!(giraffe.date > date(2000, 1, 1));
}

#[tokio::test]
async fn test_create_rejects_invalid_values() {
    let store = store_with::<Giraffe>().await;

    let err = Giraffe::query()
        .create(&store, InsertValues::new().set("name", "Much too long"))
        .await
        .unwrap_err();
    assert!(matches!(err, DriftError::Validation(_)));

    let mut query = Giraffe::query();
    assert_eq!(query.latest(&store).await.unwrap(), None);
}

#[tokio::test]
async fn test_latest_returns_most_recent() {
    let store = store_with::<Giraffe>().await;
    let query = Giraffe::query();
    for (name, day) in [("Old", "2023-01-01"), ("New", "2024-06-01"), ("Older", "2022-12-31")] {
        query
            .create(&store, InsertValues::new().set("name", name).set("date", day))
            .await
            .unwrap();
    }

    let mut query = Giraffe::query();
    let latest = query.latest(&store).await.unwrap().unwrap();
    assert_eq!(latest.date, date(2024, 6, 1));
    assert_eq!(latest.name.as_deref(), Some("New"));
    assert_eq!(query.cached_ordering_field(), Some("date"));

    let again = query.latest(&store).await.unwrap().unwrap();
    assert_eq!(again, latest);
}

#[tokio::test]
async fn test_latest_on_empty_table() {
    let store = store_with::<Giraffe>().await;
    let mut query = Giraffe::query();
    assert_eq!(query.latest(&store).await.unwrap(), None);
}

#[tokio::test]
async fn test_migrations_model() {
    let store = store_with::<Migration>().await;

    let first = Migration::record(&store, "init").await.unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(first.name, "init");

    let err = Migration::record(&store, "").await.unwrap_err();
    assert!(matches!(err, DriftError::Validation(_)));
    let err = Migration::record(&store, "much_too_long").await.unwrap_err();
    assert!(matches!(err, DriftError::Validation(_)));

    let last = Migration::last_applied(&store).await.unwrap().unwrap();
    assert_eq!(last.id, 1);
}
