use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array, Int32Array,
    Int64Array, StringArray,
};
use arrow::datatypes::{
    DataType, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use chrono::NaiveDateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{FieldValue, Record, RecordSet};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a record set from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one scalar column per field
/// * `.json`    – `[{...}, ...]` or the API envelope `{"success": true, "data": [...]}`
/// * `.csv`     – header row, one column per field
pub fn load_file(path: &Path) -> Result<RecordSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let set = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!(
        "Loaded {} records with columns {:?} from {}",
        set.len(),
        set.column_names,
        path.display()
    );
    Ok(set)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<RecordSet> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json_records(&text)
}

/// Parse an API payload into a record set.
///
/// Accepted shapes (records-oriented, as the data API emits them):
///
/// ```json
/// [ { "Municipio": "Toluca", "Fecha": "2021-05-01", "Media_de_radianza": 3.2 }, ... ]
/// ```
///
/// or the response envelope
///
/// ```json
/// { "success": true, "data": [ ... ], "total_records": 123 }
/// ```
///
/// An envelope with `"success": false` is an error carrying the API's
/// message.
pub fn parse_json_records(text: &str) -> Result<RecordSet> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows = match &root {
        JsonValue::Array(rows) => rows,
        JsonValue::Object(envelope) => {
            if envelope.get("success").and_then(JsonValue::as_bool) == Some(false) {
                let msg = envelope
                    .get("error")
                    .and_then(JsonValue::as_str)
                    .unwrap_or("unknown error");
                bail!("API reported failure: {msg}");
            }
            envelope
                .get("data")
                .and_then(JsonValue::as_array)
                .context("Expected a `data` array in the response envelope")?
        }
        _ => bail!("Expected top-level JSON array or response envelope"),
    };

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let fields = obj
            .iter()
            .map(|(key, val)| (key.clone(), json_to_field(val)))
            .collect::<BTreeMap<_, _>>();
        records.push(Record::new(fields));
    }

    Ok(RecordSet::from_records(records))
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RecordSet> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// CSV layout: header row with column names, one record per row.
/// Cell types are guessed per cell; empty cells become `Null`.
pub fn read_csv<R: Read>(input: R) -> Result<RecordSet> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let fields = headers
            .iter()
            .zip(row.iter())
            .map(|(col, value)| (col.clone(), guess_field_type(value)))
            .collect::<BTreeMap<_, _>>();
        records.push(Record::new(fields));
    }

    Ok(RecordSet::from_records(records))
}

fn guess_field_type(s: &str) -> FieldValue {
    if s.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return FieldValue::Float(f);
    }
    if s == "true" || s == "false" {
        return FieldValue::Bool(s == "true");
    }
    FieldValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file whose columns are scalar record fields
/// (strings, ints, floats, bools, dates and timestamps).
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RecordSet> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let columns: Vec<(String, &Arc<dyn Array>)> = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name().clone(), batch.column(i)))
            .collect();

        for row in 0..batch.num_rows() {
            let fields = columns
                .iter()
                .map(|(name, col)| (name.clone(), extract_field_value(col, row)))
                .collect::<BTreeMap<_, _>>();
            records.push(Record::new(fields));
        }
    }

    Ok(RecordSet::from_records(records))
}

// -- Parquet / Arrow helpers --

/// Layout of timestamp columns once read; the time part is kept so day keys
/// and year extraction see an ordinary ISO datetime.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Extract a single field value from an Arrow column at a given row.
/// Unsupported column types are rendered as their type name.
fn extract_field_value(col: &Arc<dyn Array>, row: usize) -> FieldValue {
    if col.is_null(row) {
        return FieldValue::Null;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| FieldValue::Text(s.value(row).to_string())),
        DataType::LargeUtf8 => Some(FieldValue::Text(col.as_string::<i64>().value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| FieldValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| FieldValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| FieldValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| FieldValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| FieldValue::Bool(a.value(row))),
        DataType::Date32 => any
            .downcast_ref::<Date32Array>()
            .and_then(|a| a.value_as_date(row))
            .map(|d| FieldValue::Text(d.format("%Y-%m-%d").to_string())),
        DataType::Date64 => any
            .downcast_ref::<Date64Array>()
            .and_then(|a| a.value_as_date(row))
            .map(|d| FieldValue::Text(d.format("%Y-%m-%d").to_string())),
        DataType::Timestamp(unit, _) => timestamp_at(col, unit, row)
            .map(|dt| FieldValue::Text(dt.format(TIMESTAMP_FORMAT).to_string())),
        _ => None,
    };
    value.unwrap_or_else(|| FieldValue::Text(format!("{:?}", col.data_type())))
}

/// Timestamp at `row` as a UTC wall-clock datetime, whatever the unit.
/// Pandas writes `datetime64[ns]` columns as `Timestamp(Nanosecond, _)`.
fn timestamp_at(col: &Arc<dyn Array>, unit: &TimeUnit, row: usize) -> Option<NaiveDateTime> {
    match unit {
        TimeUnit::Second => col.as_primitive::<TimestampSecondType>().value_as_datetime(row),
        TimeUnit::Millisecond => col
            .as_primitive::<TimestampMillisecondType>()
            .value_as_datetime(row),
        TimeUnit::Microsecond => col
            .as_primitive::<TimestampMicrosecondType>()
            .value_as_datetime(row),
        TimeUnit::Nanosecond => col
            .as_primitive::<TimestampNanosecondType>()
            .value_as_datetime(row),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::{TimestampMillisecondArray, TimestampNanosecondArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    #[test]
    fn parses_bare_json_array() {
        let set = parse_json_records(
            r#"[{"Municipio": "Toluca", "Media_de_radianza": 3.5, "Cantidad": 4, "ok": true, "x": null}]"#,
        )
        .unwrap();
        let rec = &set.records[0];
        assert_eq!(rec.get("Municipio"), Some(&FieldValue::Text("Toluca".into())));
        assert_eq!(rec.get("Media_de_radianza"), Some(&FieldValue::Float(3.5)));
        assert_eq!(rec.get("Cantidad"), Some(&FieldValue::Integer(4)));
        assert_eq!(rec.get("ok"), Some(&FieldValue::Bool(true)));
        assert_eq!(rec.get("x"), Some(&FieldValue::Null));
    }

    #[test]
    fn parses_api_envelope() {
        let set = parse_json_records(
            r#"{"success": true, "data": [{"pib_mun": "12.5"}, {"pib_mun": ""}], "total_records": 2}"#,
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.column_names, vec!["pib_mun".to_string()]);
    }

    #[test]
    fn failed_envelope_is_an_error() {
        let err = parse_json_records(r#"{"success": false, "error": "blob missing"}"#).unwrap_err();
        assert!(format!("{err:#}").contains("blob missing"));
        assert!(parse_json_records("[1, 2]").is_err());
        assert!(parse_json_records("42").is_err());
    }

    #[test]
    fn csv_cells_are_typed() {
        let data = "Municipio,Fecha,Media_de_radianza,Suma_de_radianza\n\
                    Toluca,2021-05-01,3.25,40\n\
                    Metepec,2021-05-02,,n/a\n";
        let set = read_csv(data.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        let first = &set.records[0];
        assert_eq!(first.get("Media_de_radianza"), Some(&FieldValue::Float(3.25)));
        assert_eq!(first.get("Suma_de_radianza"), Some(&FieldValue::Integer(40)));
        let second = &set.records[1];
        assert_eq!(second.get("Media_de_radianza"), Some(&FieldValue::Null));
        assert_eq!(second.get("Suma_de_radianza"), Some(&FieldValue::Text("n/a".into())));
    }

    #[test]
    fn load_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("radianza.json");
        std::fs::File::create(&json_path)
            .unwrap()
            .write_all(br#"[{"Municipio": "Lerma"}]"#)
            .unwrap();
        assert_eq!(load_file(&json_path).unwrap().len(), 1);

        let csv_path = dir.path().join("pib.CSV");
        std::fs::write(&csv_path, "municipio,pib_mun\nLerma,10\n").unwrap();
        assert_eq!(load_file(&csv_path).unwrap().len(), 1);

        let other = dir.path().join("data.xlsx");
        std::fs::write(&other, "").unwrap();
        assert!(load_file(&other).is_err());
    }

    #[test]
    fn reads_scalar_parquet_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Municipio", DataType::Utf8, false),
            Field::new("Media_de_radianza", DataType::Float64, true),
            Field::new("anio", DataType::Int32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Toluca", "Lerma"])),
                Arc::new(Float64Array::from(vec![Some(2.5), None])),
                Arc::new(Int32Array::from(vec![2020, 2021])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radianza.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let set = load_file(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.records[0].get("Media_de_radianza"), Some(&FieldValue::Float(2.5)));
        assert_eq!(set.records[1].get("Media_de_radianza"), Some(&FieldValue::Null));
        assert_eq!(set.records[1].get("anio"), Some(&FieldValue::Integer(2021)));
    }

    #[test]
    fn reads_pandas_timestamp_columns() {
        // 2021-05-01T13:45:00 and 2019-12-31T00:00:00
        let nanos = vec![Some(1_619_876_700_000_000_000i64), Some(1_577_750_400_000_000_000), None];
        let schema = Arc::new(Schema::new(vec![
            Field::new("Municipio", DataType::Utf8, false),
            Field::new("Fecha", DataType::Timestamp(TimeUnit::Nanosecond, None), true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Toluca", "Lerma", "Metepec"])),
                Arc::new(TimestampNanosecondArray::from(nanos)),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radianza_pandas.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let set = load_file(&path).unwrap();
        let fecha = |i: usize| set.records[i].get("Fecha").cloned();
        assert_eq!(fecha(0), Some(FieldValue::Text("2021-05-01T13:45:00".into())));
        assert_eq!(fecha(1), Some(FieldValue::Text("2019-12-31T00:00:00".into())));
        assert_eq!(fecha(2), Some(FieldValue::Null));
    }

    #[test]
    fn zoned_timestamps_and_date64_are_dates() {
        let zoned: Arc<dyn Array> = Arc::new(
            TimestampMillisecondArray::from(vec![1_609_459_200_000i64]).with_timezone("UTC"),
        );
        assert_eq!(
            extract_field_value(&zoned, 0),
            FieldValue::Text("2021-01-01T00:00:00".into())
        );

        let date64: Arc<dyn Array> = Arc::new(Date64Array::from(vec![1_609_459_200_000i64]));
        assert_eq!(extract_field_value(&date64, 0), FieldValue::Text("2021-01-01".into()));
    }
}
