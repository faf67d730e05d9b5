use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use favorita_core::IntegrityError;
use favorita_runner::{
    process, read_manifest, LoadError, OutputFormat, PipelineConfig, RunError,
};
use polars::prelude::*;

fn write_fixture(dir: &Path) {
    fs::write(
        dir.join("train.csv"),
        "id,date,store_nbr,item_nbr,unit_sales,onpromotion\n\
         0,2014-12-31,1,20,3.0,\n\
         1,2015-01-01,1,10,5.0,False\n\
         2,2015-01-03,1,10,7.0,True\n\
         3,2015-01-02,2,10,4.0,False\n\
         4,2015-01-04,2,10,-1.0,False\n",
    )
    .unwrap();
    fs::write(
        dir.join("stores.csv"),
        "store_nbr,city,state,type,cluster\n\
         1,Quito,Pichincha,D,13\n\
         2,Santo Domingo,Santo Domingo de los Tsachilas,D,4\n",
    )
    .unwrap();
    fs::write(
        dir.join("items.csv"),
        "item_nbr,family,class,perishable\n\
         10,GROCERY I,1040,0\n\
         20,BREAD/BAKERY,2712,1\n",
    )
    .unwrap();
    fs::write(
        dir.join("oil.csv"),
        "date,dcoilwtico\n\
         2014-12-31,53.45\n\
         2015-01-01,\n\
         2015-01-02,52.72\n",
    )
    .unwrap();
    fs::write(
        dir.join("transactions.csv"),
        "date,store_nbr,transactions\n\
         2015-01-01,1,2111\n",
    )
    .unwrap();
    fs::write(
        dir.join("holidays_events.csv"),
        "date,type,locale,locale_name,description,transferred\n\
         2015-01-01,Holiday,National,Ecuador,Primer dia del ano,False\n\
         2015-01-03,Holiday,Local,Quito,Traslado Fundacion de Quito,True\n",
    )
    .unwrap();
}

fn config(dir: &Path, output: &str) -> PipelineConfig {
    PipelineConfig {
        data_folder: dir.to_path_buf(),
        output_path: Some(dir.join("out").join(output)),
        start_date: NaiveDate::from_ymd_opt(2015, 1, 1),
        end_date: NaiveDate::from_ymd_opt(2015, 2, 1),
    }
}

#[test]
fn csv_run_writes_table_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let summary = process(&config(dir.path(), "consolidated.csv")).unwrap();

    assert_eq!(summary.format, OutputFormat::Csv);
    assert_eq!(summary.report.filter.dropped_trajectories, 1);
    assert_eq!(summary.report.trajectories, 1);
    assert_eq!(summary.report.synthetic_rows, 1);

    let mut rdr = csv::Reader::from_path(&summary.output_path).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    let ids: Vec<&str> = rows.iter().map(|r| &r[0]).collect();
    assert_eq!(
        ids,
        vec!["1_10_2015-01-01", "1_10_2015-01-02", "1_10_2015-01-03"]
    );

    // day 1: open, oil seeded from before the window, national holiday
    assert_eq!(&rows[0][7], "1");
    assert_eq!(&rows[0][9], "53.45");
    assert_eq!(&rows[0][10], "Quito");
    assert_eq!(&rows[0][17], "2111");
    assert_eq!(&rows[0][21], "Primer dia del ano");
    // day 2: synthetic, carried sales
    assert_eq!(&rows[1][5], "5");
    assert_eq!(&rows[1][7], "0");
    assert_eq!(&rows[1][9], "52.72");
    assert_eq!(&rows[1][17], "-1");
    // day 3: transferred local holiday ignored
    assert_eq!(&rows[2][8], "1");
    assert_eq!(&rows[2][23], "");

    let manifest = read_manifest(&summary.manifest_path).unwrap();
    assert_eq!(manifest, summary.manifest);
    assert_eq!(manifest.rows, 3);
    assert_eq!(manifest.warnings, 0);
    assert_eq!(manifest.joins.len(), 7);
}

#[test]
fn parquet_run_matches_csv_run() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let csv_run = process(&config(dir.path(), "consolidated.csv")).unwrap();
    let pq_run = process(&config(dir.path(), "consolidated.parquet")).unwrap();

    assert_eq!(pq_run.format, OutputFormat::Parquet);
    assert_eq!(pq_run.manifest.table_hash, csv_run.manifest.table_hash);

    let file = fs::File::open(&pq_run.output_path).unwrap();
    let df = ParquetReader::new(file).finish().unwrap();
    assert_eq!(df.height(), 3);
    assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
}

#[test]
fn missing_column_names_relation_and_column() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    fs::write(
        dir.path().join("stores.csv"),
        "store,city,state,type,cluster\n1,Quito,Pichincha,D,13\n",
    )
    .unwrap();

    let err = process(&config(dir.path(), "consolidated.csv")).unwrap_err();
    match err {
        RunError::Load(LoadError::Integrity(IntegrityError::MissingColumn { relation, column })) => {
            assert_eq!(relation, "stores");
            assert_eq!(column, "store_nbr");
        }
        other => panic!("expected MissingColumn, got {other:?}"),
    }
    assert!(!dir.path().join("out").join("consolidated.csv").exists());
}

#[test]
fn inverted_window_fails_before_loading() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path(), "consolidated.csv");
    cfg.end_date = cfg.start_date;
    assert!(matches!(process(&cfg), Err(RunError::Config(_))));
}

#[test]
fn reruns_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let first = process(&config(dir.path(), "a.csv")).unwrap();
    let second = process(&config(dir.path(), "b.csv")).unwrap();
    assert_eq!(first.manifest.table_hash, second.manifest.table_hash);
    assert_eq!(
        fs::read(&first.output_path).unwrap(),
        fs::read(&second.output_path).unwrap()
    );
}
