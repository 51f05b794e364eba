use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array,
    Int64Array, LargeStringArray, RecordBatch, StringArray, StringViewArray,
    TimestampMicrosecondArray, TimestampNanosecondArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, TimeUnit};
use fyq_common::{ColumnInfo, FyqError, QueryResult, Result};
use serde_json::Value;

/// Convert collected record batches into the engine's row/record shape,
/// enforcing the mandatory row cap.
pub fn batches_to_result(batches: &[RecordBatch], max_rows: usize) -> Result<QueryResult> {
    let columns = match batches.first() {
        Some(batch) => batch
            .schema()
            .fields()
            .iter()
            .map(|f| ColumnInfo {
                name: f.name().clone(),
                data_type: f.data_type().to_string(),
            })
            .collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    let mut truncated = false;
    'outer: for batch in batches {
        for row_idx in 0..batch.num_rows() {
            if rows.len() >= max_rows {
                truncated = true;
                break 'outer;
            }
            let mut row = Vec::with_capacity(batch.num_columns());
            for col_idx in 0..batch.num_columns() {
                row.push(array_value_to_json(batch.column(col_idx), row_idx)?);
            }
            rows.push(row);
        }
    }

    let row_count = rows.len();
    Ok(QueryResult {
        columns,
        rows,
        row_count,
        truncated,
    })
}

/// Convert one Arrow array cell to JSON.
fn array_value_to_json(array: &ArrayRef, index: usize) -> Result<Value> {
    if array.is_null(index) {
        return Ok(Value::Null);
    }

    let value = match array.data_type() {
        DataType::Utf8 => {
            let arr = downcast::<StringArray>(array)?;
            Value::String(arr.value(index).to_string())
        }
        DataType::LargeUtf8 => {
            let arr = downcast::<LargeStringArray>(array)?;
            Value::String(arr.value(index).to_string())
        }
        DataType::Utf8View => {
            let arr = downcast::<StringViewArray>(array)?;
            Value::String(arr.value(index).to_string())
        }
        DataType::Int32 => {
            let arr = downcast::<Int32Array>(array)?;
            Value::Number(arr.value(index).into())
        }
        DataType::Int64 => {
            let arr = downcast::<Int64Array>(array)?;
            Value::Number(arr.value(index).into())
        }
        DataType::UInt32 => {
            let arr = downcast::<UInt32Array>(array)?;
            Value::Number(arr.value(index).into())
        }
        DataType::UInt64 => {
            let arr = downcast::<UInt64Array>(array)?;
            Value::Number(arr.value(index).into())
        }
        DataType::Float32 => {
            let arr = downcast::<Float32Array>(array)?;
            float_to_json(arr.value(index) as f64)
        }
        DataType::Float64 => {
            let arr = downcast::<Float64Array>(array)?;
            float_to_json(arr.value(index))
        }
        DataType::Boolean => {
            let arr = downcast::<BooleanArray>(array)?;
            Value::Bool(arr.value(index))
        }
        DataType::Date32 => {
            let arr = downcast::<Date32Array>(array)?;
            match arr.value_as_date(index) {
                Some(d) => Value::String(d.to_string()),
                None => Value::Null,
            }
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let arr = downcast::<TimestampMicrosecondArray>(array)?;
            match arr.value_as_datetime(index) {
                Some(ts) => Value::String(ts.to_string()),
                None => Value::Null,
            }
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            let arr = downcast::<TimestampNanosecondArray>(array)?;
            match arr.value_as_datetime(index) {
                Some(ts) => Value::String(ts.to_string()),
                None => Value::Null,
            }
        }
        other => {
            return Err(FyqError::Execution(format!(
                "unsupported result column type: {other}"
            )))
        }
    };
    Ok(value)
}

fn float_to_json(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| FyqError::Execution("result column downcast failed".to_string()))
}
