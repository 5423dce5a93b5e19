//! Store integration tests.
//!
//! These exercise the selector and claim semantics against a real Postgres
//! instance. They are ignored by default; run with a scratch database:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/neuroscan_test cargo test -p neuroscan-db -- --ignored
//! ```

use chrono::Utc;
use neuroscan_core::models::{
    ClinicalRecord, NewClinicalRecord, RecordMetadata, ScanAnalysis, ScanStatus, VolumetricData,
    ANALYSIS_MODEL_NAME, MRI_SUMMARY_RECORD_TYPE,
};
use neuroscan_core::ScanStore;
use neuroscan_db::PgStore;
use uuid::Uuid;

async fn connect() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("failed to connect to test database");
    let store = PgStore::new(pool);
    store.migrate().await.expect("migrations failed");
    store
}

async fn insert_scan(store: &PgStore, patient_id: &str, retry_count: i32) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO mri_scans (patient_id, original_filename, storage_path, status, retry_count)
        VALUES ($1, 'brain.nii.gz', 'https://blob.test/brain.nii.gz', 'pending', $2)
        RETURNING id
        "#,
    )
    .bind(patient_id)
    .bind(retry_count)
    .fetch_one(store.pool())
    .await
    .expect("failed to insert scan")
}

#[tokio::test]
#[ignore]
async fn selector_excludes_scans_at_retry_limit() {
    let store = connect().await;
    let patient = format!("it-{}", Uuid::new_v4());

    let eligible_id = insert_scan(&store, &patient, 2).await;
    let exhausted_id = insert_scan(&store, &patient, 3).await;

    let scans = store.fetch_eligible(100, 3).await.unwrap();
    let ids: Vec<Uuid> = scans.iter().map(|s| s.id).collect();

    assert!(ids.contains(&eligible_id));
    assert!(!ids.contains(&exhausted_id));
}

#[tokio::test]
#[ignore]
async fn selector_returns_oldest_first() {
    let store = connect().await;
    let patient = format!("it-{}", Uuid::new_v4());

    let first = insert_scan(&store, &patient, 0).await;
    let second = insert_scan(&store, &patient, 0).await;

    let scans = store.fetch_eligible(1000, 3).await.unwrap();
    let pos_first = scans.iter().position(|s| s.id == first).unwrap();
    let pos_second = scans.iter().position(|s| s.id == second).unwrap();
    assert!(pos_first < pos_second, "older scan must come first");

    let mut sorted = scans.clone();
    sorted.sort_by_key(|s| s.created_at);
    assert_eq!(
        scans.iter().map(|s| s.id).collect::<Vec<_>>(),
        sorted.iter().map(|s| s.id).collect::<Vec<_>>()
    );
}

#[tokio::test]
#[ignore]
async fn claim_is_exclusive() {
    let store = connect().await;
    let patient = format!("it-{}", Uuid::new_v4());
    let id = insert_scan(&store, &patient, 0).await;

    let won = store
        .transition(id, ScanStatus::Pending, ScanStatus::Processing)
        .await
        .unwrap();
    assert!(won, "first claim must win");

    let won_again = store
        .transition(id, ScanStatus::Pending, ScanStatus::Processing)
        .await
        .unwrap();
    assert!(!won_again, "second claim must lose without error");
}

#[tokio::test]
#[ignore]
async fn completion_stores_analysis_and_exactly_one_record() {
    let store = connect().await;
    let patient = format!("it-{}", Uuid::new_v4());
    let id = insert_scan(&store, &patient, 0).await;
    store
        .transition(id, ScanStatus::Pending, ScanStatus::Processing)
        .await
        .unwrap();

    let analysis = ScanAnalysis {
        job_id: "J-int".to_string(),
        model: ANALYSIS_MODEL_NAME.to_string(),
        patient_age: 50,
        patient_sex: "Male".to_string(),
        volumetric_data: VolumetricData::default(),
        findings: vec!["integration finding".to_string()],
        pdf_report_url: None,
        csv_report_url: None,
        processed_at: Utc::now(),
    };
    let record = NewClinicalRecord {
        patient_id: patient.clone(),
        doctor_id: None,
        scan_id: id,
        session_id: None,
        record_type: MRI_SUMMARY_RECORD_TYPE.to_string(),
        summary: "MRI analysis completed: 1 findings, 0 structural observations".to_string(),
        detailed_notes: "notes".to_string(),
        content: "content".to_string(),
        metadata: RecordMetadata {
            model: ANALYSIS_MODEL_NAME.to_string(),
            job_id: "J-int".to_string(),
            volumetric_data: VolumetricData::default(),
            patient_age: 50,
            patient_sex: "Male".to_string(),
        },
    };

    store.complete(id, &analysis, &record).await.unwrap();

    let scans = store.fetch_eligible(1000, 3).await.unwrap();
    assert!(
        !scans.iter().any(|s| s.id == id),
        "completed scan must leave the queue"
    );

    let records: Vec<ClinicalRecord> = sqlx::query_as(
        r#"
        SELECT id, patient_id, doctor_id, mri_scan_id, session_id, record_type,
               summary, detailed_notes, content, metadata, created_at
        FROM doctor_records
        WHERE mri_scan_id = $1
        "#,
    )
    .bind(id)
    .fetch_all(store.pool())
    .await
    .unwrap();

    assert_eq!(records.len(), 1, "exactly one derived record");
    assert_eq!(records[0].record_type, MRI_SUMMARY_RECORD_TYPE);
    assert_eq!(records[0].metadata["job_id"], "J-int");
}
