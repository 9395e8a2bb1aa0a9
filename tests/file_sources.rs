use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use parquet::data_type::{ByteArray, ByteArrayType, DoubleType, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;
use tempfile::tempdir;

use polars::prelude::*;
use ranking_dataset::constants::columns::{EXCLUDED_ARTICLE_COLUMNS, ITEM_CATALOG_COLUMNS};
use ranking_dataset::{
    CsvSource, DatasetError, FeatureSourceExt, FrameExt, MonthFeatureSource, ParquetSource,
    RankingDatasetBuilder, column_names,
};

fn write_transactions_parquet(path: &Path, rows: &[(i64, &str, f64)]) {
    let schema = Arc::new(
        parse_message_type(
            "message transactions {
                REQUIRED INT64 article_id;
                REQUIRED BINARY customer_id (UTF8);
                REQUIRED DOUBLE price;
            }",
        )
        .unwrap(),
    );
    let props = Arc::new(WriterProperties::builder().build());
    let file = File::create(path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();
    let mut row_group = writer.next_row_group().unwrap();

    if let Some(mut col_writer) = row_group.next_column().unwrap() {
        let values = rows.iter().map(|(article, _, _)| *article).collect::<Vec<_>>();
        col_writer
            .typed::<Int64Type>()
            .write_batch(&values, None, None)
            .unwrap();
        col_writer.close().unwrap();
    }

    if let Some(mut col_writer) = row_group.next_column().unwrap() {
        let values = rows
            .iter()
            .map(|(_, customer, _)| ByteArray::from(*customer))
            .collect::<Vec<_>>();
        col_writer
            .typed::<ByteArrayType>()
            .write_batch(&values, None, None)
            .unwrap();
        col_writer.close().unwrap();
    }

    if let Some(mut col_writer) = row_group.next_column().unwrap() {
        let values = rows.iter().map(|(_, _, price)| *price).collect::<Vec<_>>();
        col_writer
            .typed::<DoubleType>()
            .write_batch(&values, None, None)
            .unwrap();
        col_writer.close().unwrap();
    }

    assert!(row_group.next_column().unwrap().is_none());
    row_group.close().unwrap();
    writer.close().unwrap();
}

fn write_articles_csv(path: &Path, ids: &[i64]) {
    let mut header: Vec<&str> = ITEM_CATALOG_COLUMNS.to_vec();
    header.extend(EXCLUDED_ARTICLE_COLUMNS);
    let mut contents = header.join(",");
    contents.push('\n');
    for id in ids {
        let mut record = vec![id.to_string()];
        record.extend(ITEM_CATALOG_COLUMNS[1..].iter().map(|column| format!("{column}_{id}")));
        record.extend(EXCLUDED_ARTICLE_COLUMNS.iter().map(|_| String::new()));
        contents.push_str(&record.join(","));
        contents.push('\n');
    }
    fs::write(path, contents).unwrap();
}

fn dtypes(frame: &DataFrame) -> Vec<(String, DataType)> {
    frame
        .get_columns()
        .iter()
        .map(|column| (column.name().to_string(), column.dtype().clone()))
        .collect()
}

#[test]
fn parquet_source_reads_typed_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("transactions.parquet");
    write_transactions_parquet(&path, &[(10, "c1", 0.03), (20, "c2", 0.05)]);

    let source = ParquetSource::new("transactions", &path);
    let frame = source.read().unwrap();
    assert_eq!(
        dtypes(&frame),
        vec![
            ("article_id".to_string(), DataType::Int64),
            ("customer_id".to_string(), DataType::String),
            ("price".to_string(), DataType::Float64),
        ]
    );
    let customers: Vec<Option<&str>> = frame.column("customer_id").unwrap().str().unwrap().into_iter().collect();
    assert_eq!(customers, vec![Some("c1"), Some("c2")]);
    let prices: Vec<Option<f64>> = frame.column("price").unwrap().f64().unwrap().into_iter().collect();
    assert_eq!(prices, vec![Some(0.03), Some(0.05)]);

    let projected = source.select(["customer_id"]).read().unwrap();
    assert_eq!(column_names(&projected), vec!["customer_id"]);
}

#[test]
fn empty_parquet_file_keeps_its_column_types() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("transactions.parquet");
    write_transactions_parquet(&path, &[]);

    let frame = ParquetSource::new("transactions", &path).read().unwrap();
    assert_eq!(frame.height(), 0);
    assert_eq!(frame.column("article_id").unwrap().dtype(), &DataType::Int64);
    assert_eq!(frame.column("price").unwrap().dtype(), &DataType::Float64);
}

#[test]
fn empty_parquet_transactions_build_a_header_only_table() {
    let dir = tempdir().unwrap();
    let transactions_path = dir.path().join("transactions.parquet");
    let articles_path = dir.path().join("articles.csv");
    let customers_path = dir.path().join("customers.csv");
    let mut empty = df!(
        "article_id" => Vec::<i64>::new(),
        "customer_id" => Vec::<String>::new(),
        "month_sin" => Vec::<f64>::new(),
        "month_cos" => Vec::<f64>::new(),
    )
    .unwrap();
    ParquetWriter::new(File::create(&transactions_path).unwrap())
        .finish(&mut empty)
        .unwrap();
    write_articles_csv(&articles_path, &[10, 20]);
    fs::write(&customers_path, "customer_id,age\nc1,24\n").unwrap();

    let transactions = ParquetSource::new("transactions", &transactions_path);
    let articles = CsvSource::new("articles", &articles_path);
    let customers = CsvSource::new("customers", &customers_path);
    let dataset = RankingDatasetBuilder::new(&transactions, &articles, &customers)
        .build()
        .unwrap();
    assert_eq!(dataset.table.height(), 0);
    assert_eq!(dataset.table.column("article_id").unwrap().dtype(), &DataType::Int64);
}

#[test]
fn missing_parquet_file_is_unavailable() {
    let dir = tempdir().unwrap();
    let source = ParquetSource::new("articles", dir.path().join("absent.parquet"));
    assert!(matches!(
        source.read(),
        Err(DatasetError::SourceUnavailable { ref source_id, .. }) if source_id == "articles"
    ));
}

#[test]
fn csv_source_infers_types_and_keeps_pinned_identifiers_as_text() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("customers.csv");
    fs::write(&path, "customer_id,age,postal_code\n0042,24,\n0043,,x9\n").unwrap();

    let inferred = CsvSource::new("customers", &path).read().unwrap();
    assert_eq!(inferred.column("customer_id").unwrap().dtype(), &DataType::Int64);

    let pinned = CsvSource::new("customers", &path)
        .with_column_type("customer_id", DataType::String)
        .read()
        .unwrap();
    assert_eq!(
        dtypes(&pinned),
        vec![
            ("customer_id".to_string(), DataType::String),
            ("age".to_string(), DataType::Int64),
            ("postal_code".to_string(), DataType::String),
        ]
    );
    let ids: Vec<Option<&str>> = pinned.column("customer_id").unwrap().str().unwrap().into_iter().collect();
    assert_eq!(ids, vec![Some("0042"), Some("0043")]);
    let ages: Vec<Option<i64>> = pinned.column("age").unwrap().i64().unwrap().into_iter().collect();
    assert_eq!(ages, vec![Some(24), None]);
    let postal: Vec<Option<&str>> = pinned.column("postal_code").unwrap().str().unwrap().into_iter().collect();
    assert_eq!(postal, vec![None, Some("x9")]);
}

#[test]
fn csv_rows_with_extra_fields_are_inconsistent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("customers.csv");
    fs::write(&path, "customer_id,age\nc1,24\nc2,51,extra\n").unwrap();
    assert!(matches!(
        CsvSource::new("customers", &path).read(),
        Err(DatasetError::SourceInconsistent { .. })
    ));
}

#[test]
fn builds_from_mixed_file_sources_with_derived_months() {
    let dir = tempdir().unwrap();
    let transactions_path = dir.path().join("transactions.csv");
    let articles_path = dir.path().join("articles.csv");
    let customers_path = dir.path().join("customers.csv");
    fs::write(
        &transactions_path,
        "t_dat,customer_id,article_id,price\n\
         2020-01-15,c1,10,0.03\n\
         2020-07-02,c2,20,0.05\n\
         2020-12-31,c2,10,0.02\n",
    )
    .unwrap();
    write_articles_csv(&articles_path, &[10, 20]);
    fs::write(&customers_path, "customer_id,age\nc1,24\nc2,51\n").unwrap();

    let transactions =
        MonthFeatureSource::new(CsvSource::new("transactions", &transactions_path), "t_dat");
    let articles = CsvSource::new("articles", &articles_path);
    let customers = CsvSource::new("customers", &customers_path);

    let first = RankingDatasetBuilder::new(&transactions, &articles, &customers)
        .build()
        .unwrap();
    let second = RankingDatasetBuilder::new(&transactions, &articles, &customers)
        .build()
        .unwrap();
    assert_eq!(first.table.height(), 33);
    assert_eq!(
        first.table.fingerprint().unwrap(),
        second.table.fingerprint().unwrap()
    );

    let month_cos = first.table.column("month_cos").unwrap().f64().unwrap().get(0).unwrap();
    assert!((month_cos - (std::f64::consts::TAU / 12.0).cos()).abs() < 1e-12);
    let month_sin = first.table.column("month_sin").unwrap().f64().unwrap().get(2).unwrap();
    assert!(month_sin.abs() < 1e-12);

    let output = dir.path().join("out").join("ranking.csv");
    first.table.write_csv_path(&output).unwrap();
    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written.lines().count(), 34);
    assert!(written.starts_with("customer_id,age,month_sin,month_cos,article_id,label,"));
}
