//! Derive the timestamp spec and dimensions from a parquet footer.

use std::ops::Range;

use bytes::Bytes;
use parquet::basic::{LogicalType, TimeUnit, Type as PhysicalType};
use parquet::file::metadata::ParquetMetaDataReader;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::schema::types::{ColumnDescriptor, SchemaDescriptor};
use tracing::debug;

use crate::error::DruidError;
use crate::spec::{Dimension, DimensionType, TimestampFormat, TimestampSpec};

pub use parquet::file::FOOTER_SIZE;

/// Map the leaf columns of a whole parquet file.
///
/// The timestamp column is the TIMESTAMP column named `date` (any case),
/// otherwise the first TIMESTAMP column. Every other column becomes a
/// dimension.
pub fn infer_from_parquet(
    data: impl Into<Bytes>,
) -> Result<(TimestampSpec, Vec<Dimension>), DruidError> {
    let reader = SerializedFileReader::new(data.into())?;
    Ok(map_schema(reader.metadata().file_metadata().schema_descr()))
}

/// Where the footer metadata sits, given the file size and the file's last
/// [`FOOTER_SIZE`] bytes.
pub fn footer_metadata_range(file_size: usize, tail: &[u8]) -> Result<Range<usize>, DruidError> {
    let tail: &[u8; FOOTER_SIZE] = tail.try_into().map_err(|_| {
        DruidError::Malformed(format!(
            "parquet footer is {FOOTER_SIZE} bytes, got {}",
            tail.len()
        ))
    })?;
    let metadata_len = ParquetMetaDataReader::decode_footer(tail)?;

    let end = file_size
        .checked_sub(FOOTER_SIZE)
        .ok_or_else(|| DruidError::Malformed(format!("{file_size} bytes is too short for parquet")))?;
    let start = end.checked_sub(metadata_len).ok_or_else(|| {
        DruidError::Malformed(format!(
            "parquet metadata of {metadata_len} bytes does not fit in {file_size} bytes"
        ))
    })?;
    Ok(start..end)
}

/// Same as [`infer_from_parquet`], from the footer metadata bytes alone.
pub fn infer_from_footer(metadata: &[u8]) -> Result<(TimestampSpec, Vec<Dimension>), DruidError> {
    let metadata = ParquetMetaDataReader::decode_metadata(metadata)?;
    Ok(map_schema(metadata.file_metadata().schema_descr()))
}

fn map_schema(schema: &SchemaDescriptor) -> (TimestampSpec, Vec<Dimension>) {
    let columns: Vec<&ColumnDescriptor> = schema.columns().iter().map(|c| c.as_ref()).collect();

    let timestamp = timestamp_spec(&columns);
    let dimensions = columns
        .iter()
        .filter(|c| c.name() != timestamp.column)
        .map(|c| dimension(c))
        .collect::<Vec<_>>();

    debug!(
        timestamp = %timestamp.column,
        dimensions = dimensions.len(),
        "parquet schema mapped"
    );
    (timestamp, dimensions)
}

fn timestamp_unit(column: &ColumnDescriptor) -> Option<TimeUnit> {
    match column.logical_type() {
        Some(LogicalType::Timestamp { unit, .. }) => Some(unit),
        _ => None,
    }
}

fn timestamp_spec(columns: &[&ColumnDescriptor]) -> TimestampSpec {
    let candidates: Vec<(&ColumnDescriptor, TimeUnit)> = columns
        .iter()
        .filter_map(|c| timestamp_unit(c).map(|unit| (*c, unit)))
        .collect();

    let chosen = candidates
        .iter()
        .find(|(c, _)| c.name().eq_ignore_ascii_case("date"))
        .or_else(|| candidates.first());

    match chosen {
        Some((column, unit)) => {
            let format = match unit {
                TimeUnit::MILLIS(_) => TimestampFormat::Millis,
                _ => TimestampFormat::Nano,
            };
            TimestampSpec::new(column.name(), format)
        }
        None => TimestampSpec::default(),
    }
}

fn dimension(column: &ColumnDescriptor) -> Dimension {
    let kind = match column.physical_type() {
        PhysicalType::INT32 | PhysicalType::INT64 | PhysicalType::BOOLEAN => {
            Some(DimensionType::Long)
        }
        PhysicalType::DOUBLE => Some(DimensionType::Double),
        PhysicalType::FLOAT => Some(DimensionType::Float),
        _ => None,
    };
    match kind {
        Some(kind) => Dimension::typed(column.name(), kind),
        None => Dimension::Name(column.name().to_string()),
    }
}
