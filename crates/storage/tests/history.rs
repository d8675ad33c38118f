use storage::{connect, migrate, HistoryStore, NewHistory};

#[tokio::test]
async fn full_scan_returns_rows_in_insertion_order() {
    let temp = tempfile::tempdir().unwrap();
    let db_path = temp.path().join("history.db");
    let pool = connect(&db_path.to_string_lossy()).await.unwrap();
    migrate(&pool).await.unwrap();
    // Running migrations twice must be harmless.
    migrate(&pool).await.unwrap();

    let store = HistoryStore::new(pool);
    let labels = ["Rendang", "Sate", "Gado-gado", "Nasi Goreng", "Bakso"];
    for (i, label) in labels.iter().enumerate() {
        store
            .insert(&NewHistory {
                image_uri: format!("file:///photos/{i}.jpg"),
                analyze_result: label.to_string(),
                nutrition: format!("{}", 100 + i),
                confidence_score: 50.0 + i as f32,
            })
            .await
            .unwrap();
    }

    let rows = store.all().await.unwrap();
    assert_eq!(rows.len(), labels.len());
    let got: Vec<&str> = rows.iter().map(|r| r.analyze_result.as_str()).collect();
    assert_eq!(got, labels);
    assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
    assert_eq!(rows[2].image_uri, "file:///photos/2.jpg");
    assert!((rows[4].confidence_score - 54.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn rows_survive_reconnect() {
    let temp = tempfile::tempdir().unwrap();
    let db_path = temp.path().join("nested").join("history.db");
    let url = db_path.to_string_lossy().into_owned();
    {
        let pool = connect(&url).await.unwrap();
        migrate(&pool).await.unwrap();
        HistoryStore::new(pool.clone())
            .insert(&NewHistory {
                image_uri: "content://media/1".into(),
                analyze_result: "Sate".into(),
                nutrition: "".into(),
                confidence_score: 0.0,
            })
            .await
            .unwrap();
        pool.close().await;
    }
    let pool = connect(&url).await.unwrap();
    let store = HistoryStore::new(pool);
    assert_eq!(store.count().await.unwrap(), 1);
}
