use municipal_metrics::data::loader::{load_file, parse_json_records};
use municipal_metrics::stats;
use municipal_metrics::{DashboardState, EngineConfig, Selection};

fn radiance_payload() -> String {
    let mut rows = Vec::new();
    for (m, base) in [("Toluca", 30.0), ("Metepec", 40.0), ("Lerma", 10.0)] {
        for year in 2019..=2021 {
            for month in [1, 6] {
                rows.push(serde_json::json!({
                    "Municipio": m,
                    "Fecha": format!("{year}-{month:02}-01"),
                    "Media_de_radianza": base + (year - 2019) as f64,
                    "Suma_de_radianza": (base + (year - 2019) as f64) * 10.0,
                }));
            }
        }
    }
    // rows the engine must skip without complaint
    rows.push(serde_json::json!({ "Municipio": "Lerma", "Fecha": "2020-01-01", "Media_de_radianza": 0, "Suma_de_radianza": "" }));
    rows.push(serde_json::json!({ "Municipio": "Lerma", "Fecha": "sin fecha", "Media_de_radianza": "NaN", "Suma_de_radianza": 5 }));
    serde_json::json!({ "success": true, "data": rows, "total_records": rows.len() }).to_string()
}

#[test]
fn api_payload_to_every_view() {
    let records = parse_json_records(&radiance_payload()).unwrap();
    assert_eq!(records.len(), 20);

    let mut state = DashboardState::new(EngineConfig::default());
    state.set_records(records);

    let boxes = state.box_summaries("Media_de_radianza").to_vec();
    let order: Vec<&str> = boxes.iter().map(|b| b.group.as_str()).collect();
    assert_eq!(order, vec!["Metepec", "Toluca", "Lerma"]);
    assert!(boxes.iter().all(|b| b.count == 6));
    for b in &boxes {
        assert!(b.min <= b.q1 && b.q1 <= b.median && b.median <= b.q3 && b.q3 <= b.max);
    }

    let daily = state.daily_series("Media_de_radianza").to_vec();
    assert_eq!(daily.len(), 6);
    assert_eq!(daily[0].key, "2019-01-01");
    assert!((daily[0].value - 80.0 / 3.0).abs() < 1e-9);

    let table = state.year_group_sums("Suma_de_radianza").clone();
    assert_eq!(table.groups, vec!["Lerma", "Metepec", "Toluca"]);
    assert_eq!(table.rows.iter().map(|r| r.year).collect::<Vec<_>>(), vec![2019, 2020, 2021]);
    assert_eq!(table.rows[1].get("Toluca"), Some(620.0));
    // the undated Lerma row has no year and must not appear anywhere
    assert_eq!(table.rows[0].get("Lerma"), Some(200.0));

    let histogram = state.histogram("Media_de_radianza").to_vec();
    assert_eq!(histogram.len(), 20);
    assert_eq!(histogram.iter().map(|b| b.count).sum::<usize>(), 18);

    let ranking = state.ranking("Media_de_radianza", 2).to_vec();
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking[0].group, "Metepec");
}

#[test]
fn selection_narrows_filtered_views_only() {
    let mut state = DashboardState::default();
    state.set_records(parse_json_records(&radiance_payload()).unwrap());
    state.set_selection(Selection {
        groups: ["toluca".to_string()].into_iter().collect(),
        year: Some(2021),
        date_range: None,
    });

    let summary = state.series_summary("Media_de_radianza").cloned().unwrap();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.mean, 32.0);

    assert_eq!(state.box_summaries("Media_de_radianza").len(), 3);

    let table = state.year_group_sums("Suma_de_radianza");
    assert_eq!(table.groups, vec!["Toluca"]);
    assert_eq!(table.rows.len(), 1);
}

#[test]
fn combined_csv_scatter_with_nulls_for_missing_years() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("combinado.csv");
    let mut csv = String::from("municipio,fecha,pib_mun,Media_de_radianza\n");
    for i in 0..1200 {
        csv.push_str(&format!("Toluca,2020-01-01,{},{}\n", 1000 + i, 1 + i % 7));
    }
    csv.push_str("Lerma,2021-01-01,500,2\n");
    csv.push_str("Lerma,2021-01-01,0,2\n");
    std::fs::write(&path, csv).unwrap();

    let records = load_file(&path).unwrap();
    let config = EngineConfig::default();
    let scatter = stats::scatter_by_group(
        &records.records,
        &config.fields.category,
        &config.fields.gdp,
        &config.fields.radiance,
        config.scatter.max_points_per_group,
    );
    assert_eq!(scatter["Toluca"].len(), 400);
    assert_eq!(scatter["Lerma"].len(), 1);

    let table = stats::year_group_sums(
        &records.records,
        &config.fields.date,
        &config.fields.category,
        &config.fields.gdp,
        &config.years,
    );
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].get("Lerma"), None);
    assert_eq!(table.rows[1].get("Toluca"), None);
    assert_eq!(table.rows[1].get("Lerma"), Some(500.0));

    let json = serde_json::to_value(&table.rows[0]).unwrap();
    assert!(json["Lerma"].is_null());
}
