use materials_analyzer::config::ConfigBuilder;
use materials_analyzer::enrich::MaterialEnricher;
use materials_analyzer::material::Material;
use materials_analyzer::report::CsvReporter;
use serde_json::json;
use tempfile::TempDir;
use tokio::fs;

fn fixture_dump() -> serde_json::Value {
    json!([
        {
            "_id": {"$oid": "64db1f1e2f8fb814c8f1b001"},
            "materialType": "lecture",
            "text": "<!-- internal note -->\n# VLANs\nA VLAN segments a switch.\n![vlan diagram](img/vlan.png)\nRead [the standard](https://example.com/8021q) too.",
            "completed": true
        },
        {
            "_id": {"$oid": "64db1f1e2f8fb814c8f1b002"},
            "materialType": "course",
            "title": "Networking Basics"
        },
        {
            "_id": {"$oid": "64db1f1e2f8fb814c8f1b003"},
            "materialType": "test",
            "questions": [
                {
                    "question": "Match each protocol to its port",
                    "answerType": "matching",
                    "options": [{"option": "HTTP"}, {"option": "SSH"}],
                    "answers": [{"answer": "80"}, {"answer": "22"}]
                }
            ],
            "score": 87
        },
        {
            "_id": {"$oid": "64db1f1e2f8fb814c8f1b004"},
            "materialType": "lab"
        }
    ])
}

fn offline_enricher() -> MaterialEnricher {
    let config = ConfigBuilder::new().enable_video_lookup(false).build();
    MaterialEnricher::new(config).unwrap()
}

#[tokio::test]
async fn test_end_to_end_enrichment_and_write_back() {
    let temp_dir = TempDir::new().unwrap();
    let dump_path = temp_dir.path().join("materials.json");
    fs::write(&dump_path, fixture_dump().to_string()).await.unwrap();

    let stats = offline_enricher()
        .enrich_file(&dump_path, true)
        .await
        .unwrap();

    assert_eq!(stats.total, 4);
    assert_eq!(stats.enriched, 2); // lecture + test
    assert_eq!(stats.skipped, 1); // course
    assert_eq!(stats.failed, 1); // lab without text

    let written = fs::read_to_string(&dump_path).await.unwrap();
    assert!(written.contains("    \"_id\""), "expects 4-space indent");

    let materials: Vec<Material> = serde_json::from_str(&written).unwrap();

    // "VLANs A VLAN segments a switch Read too"
    assert_eq!(materials[0].words, Some(8));
    assert_eq!(materials[0].pics, Some(1));
    assert_eq!(materials[0].links, Some(1));
    assert_eq!(materials[0].video_minutes, Some(0));
    assert_eq!(
        materials[0].extra.get("completed"),
        Some(&serde_json::Value::from(true))
    );

    // Container untouched
    assert!(materials[1].words.is_none());

    // "Match each protocol to its port HTTP SSH 80 22"
    assert_eq!(materials[2].words, Some(10));
    assert_eq!(
        materials[2].extra.get("score"),
        Some(&serde_json::Value::from(87))
    );

    // Failed material keeps its record, gains no metadata
    assert!(materials[3].words.is_none());
}

#[tokio::test]
async fn test_directory_mode_walks_all_dumps() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("dev_materials.json"),
        fixture_dump().to_string(),
    )
    .await
    .unwrap();
    fs::write(
        temp_dir.path().join("prod_materials.json"),
        fixture_dump().to_string(),
    )
    .await
    .unwrap();

    let stats = offline_enricher()
        .enrich_path(temp_dir.path(), false)
        .await
        .unwrap();

    assert_eq!(stats.files, 2);
    assert_eq!(stats.total, 8);
    assert_eq!(stats.enriched, 4);
}

#[tokio::test]
async fn test_enriched_dump_exports_to_csv() {
    let temp_dir = TempDir::new().unwrap();
    let dump_path = temp_dir.path().join("materials.json");
    let csv_path = temp_dir.path().join("materials.csv");
    fs::write(&dump_path, fixture_dump().to_string()).await.unwrap();

    offline_enricher()
        .enrich_file(&dump_path, true)
        .await
        .unwrap();

    let reporter = CsvReporter::from_config(&Default::default());
    let stats = reporter.write_report(&dump_path, &csv_path).await.unwrap();
    assert_eq!(stats.rows, 4);

    let data = fs::read_to_string(&csv_path).await.unwrap();
    let mut reader = csv::Reader::from_reader(data.as_bytes());
    let header: Vec<String> = reader
        .headers()
        .unwrap()
        .iter()
        .map(String::from)
        .collect();

    assert_eq!(header[0], "_id.$oid");
    assert!(header.contains(&"materialType".to_string()));
    assert!(header.contains(&"words".to_string()));
    assert!(header.contains(&"estimated_minutes".to_string()));
    assert!(header.contains(&"score".to_string()));
    assert!(!header.iter().any(|c| c.starts_with("text")));

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 4);

    let words_col = header.iter().position(|c| c == "words").unwrap();
    assert_eq!(&rows[0][words_col], "8");
    // Containers and failed materials export with empty metadata cells
    assert_eq!(&rows[1][words_col], "");
    assert_eq!(&rows[3][words_col], "");
}
