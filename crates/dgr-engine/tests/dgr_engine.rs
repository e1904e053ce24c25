//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
use std::fs;

use chrono::NaiveDate;
use dgr_common::config::AppConfig;
use dgr_engine::{
    build_report, generate_report,
    model::{CustomerProfile, CustomerRegistry, DaySelection},
    source::{JsonDirectorySource, MemorySource},
    DataStatus, DgrError, TelemetryDocument,
};
use serde_json::json;
use tempfile::tempdir;

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn fleet() -> CustomerRegistry {
    CustomerRegistry::from_config(&AppConfig::embedded().unwrap()).unwrap()
}

fn reading(timestamp: &str, fields: &[(&str, f64)]) -> TelemetryDocument {
    fields.iter().fold(
        TelemetryDocument::new().with("timestamp", timestamp),
        |doc, (column, value)| doc.with(*column, *value),
    )
}

#[test]
fn kasturi_month_to_date_report() {
    let registry = fleet();
    let source = MemorySource::new().with_collection(
        "Kasturi",
        vec![
            reading(
                "2025-11-01 18:00",
                &[("Daily_Generation_INV1", 4800.0), ("Daily_Generation_INV2", 6700.0)],
            ),
            reading(
                "2025-11-14 18:00",
                &[("Daily_Generation_INV1", 200.0), ("Daily_Generation_INV2", 300.0)],
            ),
        ],
    );

    let report = generate_report(&registry, &source, "Kasturi", date("2025-11-15")).unwrap();

    assert_eq!(report.status, DataStatus::Available);
    assert_eq!(report.data_day, date("2025-11-14"));
    assert_eq!(report.kpis.total_daily_generation, 500.0);
    assert_eq!(report.kpis.total_monthly_generation, 12000.0);
    assert!((report.kpis.plf - 500.0 / 1656.0).abs() < 1e-12);
    assert!((report.kpis.plf_percent() - 30.19).abs() < 0.01);

    let labels: Vec<_> = report.rows.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, vec!["Inverter-1", "Inverter-2"]);
    assert_eq!(report.daily_irradiation, None);
}

#[test]
fn imagica_uses_fixed_columns_only() {
    let registry = fleet();
    let source = MemorySource::new().with_collection(
        "opcua_data",
        vec![reading(
            "2025-11-14 17:45",
            &[
                ("T1_INV1_Generation", 600.0),
                ("T2_INV1_Generation", 400.0),
                ("T1_Feeder_Energy", 9999.0),
            ],
        )],
    );

    let report = generate_report(&registry, &source, "Imagica", date("2025-11-15")).unwrap();
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.kpis.total_daily_generation, 1000.0);
    assert!((report.kpis.plf - 1000.0 / 1321.92).abs() < 1e-12);
    assert!((report.kpis.plf_percent() - 75.65).abs() < 0.01);
}

#[test]
fn missing_days_contribute_zero_to_month_total() {
    let profile = CustomerProfile::new("Dunung", 3.04, 13);
    let documents: Vec<_> = (1..=14)
        .filter(|day| ![3, 7, 9].contains(day))
        .map(|day| {
            reading(
                &format!("2025-11-{day:02} 18:00"),
                &[("Daily_Generation_INV1", 10.0)],
            )
        })
        .collect();

    let dense: Vec<_> = (1..=14)
        .map(|day| {
            let value = if [3, 7, 9].contains(&day) { 0.0 } else { 10.0 };
            reading(
                &format!("2025-11-{day:02} 18:00"),
                &[("Daily_Generation_INV1", value)],
            )
        })
        .collect();

    let sparse_report = build_report(&profile, &documents, date("2025-11-15")).unwrap();
    let dense_report = build_report(&profile, &dense, date("2025-11-15")).unwrap();
    assert_eq!(sparse_report.window.len(), 14);
    assert_eq!(sparse_report.rows[0].daily, 10.0);
    assert_eq!(sparse_report.rows[0].monthly, 110.0);
    assert_eq!(sparse_report.rows, dense_report.rows);
}

#[test]
fn rank_selection_picks_tenth_newest_sample() {
    let registry = fleet();
    let day_of_twelve: Vec<_> = (0..12)
        .map(|hour| {
            reading(
                &format!("2025-11-14 {hour:02}:00"),
                &[("Daily_Generation_INV1", hour as f64 * 10.0)],
            )
        })
        .collect();
    let source = MemorySource::new().with_collection("Caspro", day_of_twelve);
    let report = generate_report(&registry, &source, "Caspro", date("2025-11-15")).unwrap();
    // Newest first: 11:00 is rank 0, 02:00 is rank 9.
    assert_eq!(report.rows[0].daily, 20.0);

    let day_of_three: Vec<_> = (9..12)
        .map(|hour| {
            reading(
                &format!("2025-11-14 {hour:02}:00"),
                &[("Daily_Generation_INV1", hour as f64 * 10.0)],
            )
        })
        .collect();
    let source = MemorySource::new().with_collection("Caspro", day_of_three);
    let report = generate_report(&registry, &source, "Caspro", date("2025-11-15")).unwrap();
    assert_eq!(report.rows[0].daily, 110.0);
}

#[test]
fn rank_selection_applies_per_day_to_month_and_irradiation() {
    let profile = CustomerProfile::new("Caspro", 3.04, 11)
        .with_day_selection(DaySelection::Rank { index: 9 });
    let documents: Vec<_> = ["2025-11-13", "2025-11-14"]
        .iter()
        .flat_map(|day| {
            (0..12).map(move |hour| {
                reading(
                    &format!("{day} {hour:02}:00"),
                    &[
                        ("Daily_Generation_INV1", hour as f64),
                        ("Irradiation_GHI", hour as f64),
                    ],
                )
            })
        })
        .collect();

    let report = build_report(&profile, &documents, date("2025-11-15")).unwrap();
    // Rank 9 newest first is the 02:00 sample on each day.
    assert_eq!(report.rows[0].daily, 2.0);
    assert_eq!(report.rows[0].monthly, 4.0);
    assert_eq!(report.daily_irradiation, Some(2.0));
    let mean = report.monthly_irradiation.unwrap();
    assert!((mean - 4.0 / 14.0).abs() < 1e-12);
}

#[test]
fn single_total_plant_is_scaled_to_kwh() {
    let registry = fleet();
    let source = MemorySource::new().with_collection(
        "PGCIL",
        vec![
            reading("2025-11-13 18:00", &[("Total_Generation_MWh", 2.0)]),
            reading("2025-11-14 18:00", &[("Total_Generation_MWh", 1.5)]),
        ],
    );

    let report = generate_report(&registry, &source, "PGCIL", date("2025-11-15")).unwrap();
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].label, "Plant Total Generation");
    assert_eq!(report.rows[0].daily, 1500.0);
    assert_eq!(report.rows[0].monthly, 3500.0);
}

#[test]
fn irradiation_is_averaged_over_the_whole_window() {
    let profile = CustomerProfile::new("TMD", 3.04, 9);
    let documents = vec![
        reading(
            "2025-11-01 18:00",
            &[("Daily_Generation_INV1", 1.0), ("Irradiation_GHI", 8.0)],
        ),
        reading(
            "2025-11-14 18:00",
            &[("Daily_Generation_INV1", 1.0), ("Irradiation_GHI", 6.0)],
        ),
    ];

    let report = build_report(&profile, &documents, date("2025-11-15")).unwrap();
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.daily_irradiation, Some(6.0));
    assert_eq!(report.monthly_irradiation, Some(1.0));
}

#[test]
fn no_data_is_stable_across_runs() {
    let registry = fleet();
    let source = MemorySource::new();
    let first = generate_report(&registry, &source, "Mauryaa", date("2025-11-15")).unwrap();
    let second = generate_report(&registry, &source, "Mauryaa", date("2025-11-15")).unwrap();

    assert!(first.is_no_data());
    assert_eq!(first.summary(), second.summary());
    assert_eq!(first.rows, second.rows);
    assert_eq!(first.kpis.total_daily_generation, 0.0);
    assert_eq!(first.kpis.plf, 0.0);
}

#[test]
fn first_of_month_reports_previous_month() {
    let registry = fleet();
    let source = MemorySource::new().with_collection(
        "Vinathi_4",
        vec![
            reading("2025-11-30 18:00", &[("Daily_Generation_INV1", 70.0)]),
            reading("2025-12-01 09:00", &[("Daily_Generation_INV1", 5.0)]),
        ],
    );

    let report = generate_report(&registry, &source, "Vinathi_4", date("2025-12-01")).unwrap();
    assert_eq!(report.data_day, date("2025-11-30"));
    assert_eq!(report.window.start, date("2025-11-01"));
    assert_eq!(report.window.len(), 30);
    assert_eq!(report.rows[0].daily, 70.0);
    assert_eq!(report.rows[0].monthly, 70.0);
}

#[test]
fn unknown_customer_fails_fast() {
    let err = generate_report(&fleet(), &MemorySource::new(), "Nowhere", date("2025-11-15"))
        .unwrap_err();
    assert!(matches!(err, DgrError::UnknownCustomer(ref id) if id == "Nowhere"));
}

#[test]
fn directory_source_end_to_end_with_export() {
    let data = tempdir().unwrap();
    let lines = [
        json!({"_id": {"$oid": "1"}, "timestamp": {"$date": "2025-11-13T12:30:00Z"}, "Meter_Generation": 800.0}),
        json!({"_id": {"$oid": "2"}, "timestamp": {"$date": {"$numberLong": "1763123400000"}}, "Meter_Generation": {"$numberDouble": "900.5"}}),
        json!({"_id": {"$oid": "3"}, "timestamp": "14/11/2025", "Meter_Generation": 5000.0}),
    ];
    let body: String = lines.iter().map(|line| format!("{line}\n")).collect();
    fs::write(data.path().join("BEL2.jsonl"), body).unwrap();

    let source = JsonDirectorySource::new(data.path());
    let report = generate_report(&fleet(), &source, "BEL2", date("2025-11-15")).unwrap();

    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].label, "Meter Generation");
    assert_eq!(report.rows[0].daily, 900.5);
    assert_eq!(report.rows[0].monthly, 1700.5);

    let out = tempdir().unwrap();
    let files = report.exporter().export_all(out.path()).unwrap();
    let table = fs::read_to_string(files.table).unwrap();
    assert!(table.contains("Meter Generation,900.50,1700.50"));
    assert!(files.json.exists());
    assert!(files.summary.exists());
}
