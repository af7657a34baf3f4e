//! Parquet-backed session store
//!
//! The outcome recorder appends sessions with [`write_sessions`]; the
//! decision engine only ever reads.

use super::store::SessionStore;
use super::types::{SessionFeature, SessionRecord, StoreError};
use crate::signal::Direction;
use arrow::array::{
    Array, ArrayRef, BooleanArray, Int8Array, StringArray, TimestampMicrosecondArray, UInt8Array,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Session record schema
pub fn session_schema() -> Schema {
    Schema::new(vec![
        Field::new(
            "recorded_at",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
        Field::new("direction", DataType::Utf8, false),
        Field::new("won", DataType::Boolean, false),
        Field::new("price_bucket", DataType::UInt8, false),
        Field::new("time_bucket", DataType::UInt8, false),
        Field::new("rsi_bucket", DataType::UInt8, false),
        Field::new("cvd_bucket", DataType::Int8, false),
        Field::new("trend_bucket", DataType::Int8, false),
    ])
}

/// Write `records` to a new Parquet file at `path`
pub fn write_sessions(path: &Path, records: &[SessionRecord]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let schema = Arc::new(session_schema());
    let file = File::create(path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

    let recorded_at: Vec<i64> = records
        .iter()
        .map(|r| r.recorded_at.timestamp_micros())
        .collect();
    let directions: Vec<&str> = records
        .iter()
        .map(|r| match r.direction {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        })
        .collect();
    let won: Vec<bool> = records.iter().map(|r| r.won).collect();
    let unsigned = |get: fn(&SessionFeature) -> u8| -> Vec<u8> {
        records.iter().map(|r| get(&r.features)).collect()
    };
    let signed = |get: fn(&SessionFeature) -> i8| -> Vec<i8> {
        records.iter().map(|r| get(&r.features)).collect()
    };

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(TimestampMicrosecondArray::from(recorded_at).with_timezone("UTC")) as ArrayRef,
            Arc::new(StringArray::from(directions)) as ArrayRef,
            Arc::new(BooleanArray::from(won)) as ArrayRef,
            Arc::new(UInt8Array::from(unsigned(|x| x.price_bucket))) as ArrayRef,
            Arc::new(UInt8Array::from(unsigned(|x| x.time_bucket))) as ArrayRef,
            Arc::new(UInt8Array::from(unsigned(|x| x.rsi_bucket))) as ArrayRef,
            Arc::new(Int8Array::from(signed(|x| x.cvd_bucket))) as ArrayRef,
            Arc::new(Int8Array::from(signed(|x| x.trend_bucket))) as ArrayRef,
        ],
    )?;

    writer.write(&batch)?;
    writer.close()?;

    tracing::debug!(path = ?path, count = records.len(), "Wrote sessions to Parquet");
    Ok(())
}

fn column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a T, StoreError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| StoreError::Schema(format!("missing or mistyped column {}", name)))
}

fn parse_direction(value: &str) -> Result<Direction, StoreError> {
    match value {
        "LONG" => Ok(Direction::Long),
        "SHORT" => Ok(Direction::Short),
        other => Err(StoreError::Schema(format!("unknown direction {:?}", other))),
    }
}

/// Read every session from a Parquet file, oldest first
pub fn read_sessions(path: &Path) -> Result<Vec<SessionRecord>, StoreError> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch?;
        let recorded_at = column::<TimestampMicrosecondArray>(&batch, "recorded_at")?;
        let directions = column::<StringArray>(&batch, "direction")?;
        let won = column::<BooleanArray>(&batch, "won")?;
        let price = column::<UInt8Array>(&batch, "price_bucket")?;
        let time = column::<UInt8Array>(&batch, "time_bucket")?;
        let rsi = column::<UInt8Array>(&batch, "rsi_bucket")?;
        let cvd = column::<Int8Array>(&batch, "cvd_bucket")?;
        let trend = column::<Int8Array>(&batch, "trend_bucket")?;

        for i in 0..batch.num_rows() {
            let at = DateTime::from_timestamp_micros(recorded_at.value(i))
                .ok_or_else(|| StoreError::Schema("timestamp out of range".to_string()))?;
            records.push(SessionRecord {
                recorded_at: at,
                direction: parse_direction(directions.value(i))?,
                features: SessionFeature {
                    price_bucket: price.value(i),
                    time_bucket: time.value(i),
                    rsi_bucket: rsi.value(i),
                    cvd_bucket: cvd.value(i),
                    trend_bucket: trend.value(i),
                },
                won: won.value(i),
            });
        }
    }

    records.sort_by_key(|r| r.recorded_at);
    Ok(records)
}

/// Session store loaded from a Parquet file
pub struct ParquetSessionStore {
    path: PathBuf,
    records: Vec<SessionRecord>,
}

impl ParquetSessionStore {
    /// Load the file; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut records = if path.exists() {
            read_sessions(&path)?
        } else {
            tracing::warn!(path = %path.display(), "Session store not found, starting empty");
            Vec::new()
        };
        records.sort_by_key(|r| r.recorded_at);
        tracing::info!(path = %path.display(), sessions = records.len(), "Loaded session store");
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SessionStore for ParquetSessionStore {
    fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(self.records.iter().rev().take(limit).cloned().collect())
    }
}
