use facesearch::{
    DomainError, DuckdbPhotoRepository, Embedding, EmbeddingConfig, PhotoRepository,
};
use tempfile::tempdir;

const DIMS: usize = 512;

fn config() -> EmbeddingConfig {
    EmbeddingConfig::new("test", DIMS)
}

fn query() -> Embedding {
    let mut v = vec![0.0; DIMS];
    v[0] = 1.0;
    Embedding::new(v)
}

/// Unit vector at cosine distance `distance` from `query()`.
fn at_distance(distance: f32) -> Embedding {
    let cos = 1.0 - distance;
    let sin = (1.0 - cos * cos).max(0.0).sqrt();
    let mut v = vec![0.0; DIMS];
    v[0] = cos;
    v[1] = sin;
    Embedding::new(v)
}

#[tokio::test]
async fn duckdb_photo_repository_round_trips_embeddings() {
    let dir = tempdir().expect("tempdir");
    let repo = DuckdbPhotoRepository::new(&dir.path().join("photos.duckdb"), config())
        .expect("duckdb init");

    let vector: Vec<f32> = (0..DIMS).map(|i| ((i as f32) * 0.37).sin() / 7.0).collect();
    let created = repo
        .create("uploads/a.jpg", &Embedding::new(vector.clone()))
        .await
        .expect("create");

    let loaded = repo
        .get(created.id())
        .await
        .expect("get")
        .expect("record exists");

    assert_eq!(loaded.file_path(), "uploads/a.jpg");
    assert_eq!(loaded.embedding().dimensions(), DIMS);
    for (stored, original) in loaded.embedding().vector().iter().zip(vector.iter()) {
        assert!((stored - original).abs() < 1e-6);
    }
    assert!(repo.get(created.id() + 100).await.expect("get").is_none());
}

#[tokio::test]
async fn duckdb_photo_repository_assigns_increasing_ids() {
    let repo = DuckdbPhotoRepository::in_memory(config()).expect("duckdb init");

    let a = repo.create("a.jpg", &at_distance(0.1)).await.expect("create a");
    let b = repo.create("a.jpg", &at_distance(0.2)).await.expect("create b");

    assert!(b.id() > a.id());
    assert_eq!(repo.count().await.expect("count"), 2);
}

#[tokio::test]
async fn duckdb_photo_repository_filters_and_orders_by_distance() {
    let repo = DuckdbPhotoRepository::in_memory(config()).expect("duckdb init");

    repo.create("far.jpg", &at_distance(0.6)).await.expect("create");
    repo.create("mid.jpg", &at_distance(0.4)).await.expect("create");
    repo.create("near.jpg", &at_distance(0.1)).await.expect("create");

    let results = repo
        .nearest_neighbors(&query(), 0.5, 10)
        .await
        .expect("search");

    let paths: Vec<&str> = results.iter().map(|n| n.record().file_path()).collect();
    assert_eq!(paths, vec!["near.jpg", "mid.jpg"]);
    assert!((results[0].distance() - 0.1).abs() < 1e-4);
    assert!((results[1].distance() - 0.4).abs() < 1e-4);
}

#[tokio::test]
async fn duckdb_photo_repository_respects_limit_and_ties() {
    let repo = DuckdbPhotoRepository::in_memory(config()).expect("duckdb init");

    let first = repo.create("1.jpg", &at_distance(0.2)).await.expect("create");
    let second = repo.create("2.jpg", &at_distance(0.2)).await.expect("create");
    repo.create("3.jpg", &at_distance(0.3)).await.expect("create");

    let results = repo
        .nearest_neighbors(&query(), 0.5, 2)
        .await
        .expect("search");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].record().id(), first.id());
    assert_eq!(results[1].record().id(), second.id());

    let again = repo
        .nearest_neighbors(&query(), 0.5, 2)
        .await
        .expect("search");
    assert_eq!(results, again);
}

#[tokio::test]
async fn duckdb_photo_repository_empty_result_is_not_an_error() {
    let repo = DuckdbPhotoRepository::in_memory(config()).expect("duckdb init");
    repo.create("far.jpg", &at_distance(0.9)).await.expect("create");

    let results = repo
        .nearest_neighbors(&query(), 0.5, 10)
        .await
        .expect("search");
    assert!(results.is_empty());
}

#[tokio::test]
async fn duckdb_photo_repository_rejects_wrong_dimensions() {
    let repo = DuckdbPhotoRepository::in_memory(config()).expect("duckdb init");

    let err = repo
        .create("a.jpg", &Embedding::new(vec![0.1; 3]))
        .await
        .expect_err("short embedding");
    assert!(matches!(err, DomainError::ValidationFailure(_)));

    let err = repo
        .nearest_neighbors(&Embedding::new(vec![0.1; 3]), 0.5, 10)
        .await
        .expect_err("short query");
    assert!(matches!(err, DomainError::ValidationFailure(_)));

    assert_eq!(repo.count().await.expect("count"), 0);
}

#[tokio::test]
async fn duckdb_photo_repository_persists_across_reopen() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("photos.duckdb");

    {
        let repo = DuckdbPhotoRepository::new(&db_path, config()).expect("duckdb init");
        repo.create("kept.jpg", &at_distance(0.1)).await.expect("create");
    }

    let repo = DuckdbPhotoRepository::new(&db_path, config()).expect("duckdb reopen");
    assert_eq!(repo.count().await.expect("count"), 1);
    drop(repo);

    let err = DuckdbPhotoRepository::new(&db_path, EmbeddingConfig::new("test", 128))
        .err()
        .expect("dimension mismatch");
    assert!(matches!(err, DomainError::DataCorruption(_)));
}
