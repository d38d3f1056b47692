//! Normalization of values read from the container.
//!
//! Rules, applied in order:
//! 1. One-dimensional, one-element, non-record arrays unwrap to their scalar.
//! 2. Byte strings decode to text. A text scalar shaped like `{...}` is a
//!    dictionary written by an old writer and is parsed back as a literal.
//! 3. Record arrays outside the observation/variable tables get their
//!    byte-string fields re-typed to text fields of `byte width / 4` chars.

use log::{trace, warn};
use ndarray::ArrayD;

use crate::h5ad::codec::{literal, text};
use crate::h5ad::options::ReadOptions;
use crate::h5ad::types::error::{H5adError, Result};
use crate::h5ad::types::models::{RecordArray, RecordField, Scalar, TypedArray, Value};

use super::aliases;

/// Applies the postprocessing rules to `(key, value)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Postprocessor {
    recover_dict_strings: bool,
}

impl Default for Postprocessor {
    fn default() -> Self {
        Self {
            recover_dict_strings: true,
        }
    }
}

impl Postprocessor {
    pub fn new(options: &ReadOptions) -> Self {
        Self {
            recover_dict_strings: options.recover_dict_strings,
        }
    }

    /// Normalizes `value`, stored under `key` at container path `path`.
    ///
    /// Values that are already scalars, literals, matrices or mappings come
    /// back unchanged, so applying this twice is the same as applying it once.
    pub fn apply(&self, path: &str, key: &str, value: Value) -> Result<(String, Value)> {
        let value = unwrap_single(value);

        let was_bytes = matches!(
            value,
            Value::Array(TypedArray::Bytes { .. }) | Value::Scalar(Scalar::Bytes(_))
        );
        let mut value = decode_byte_strings(path, value)?;

        if was_bytes
            && self.recover_dict_strings
            && let Value::Scalar(Scalar::Text(s)) = &value
            && s.starts_with('{')
            && s.ends_with('}')
        {
            warn!("Recovering dictionary stored as text at '{}'", path);
            value = Value::Literal(literal::parse(path, s)?);
        }

        let value = match value {
            Value::Array(TypedArray::Record(records)) if !aliases::keeps_byte_fields(key) => {
                trace!("Re-typing byte-string fields of record array '{}'", path);
                Value::Array(TypedArray::Record(retype_byte_fields(path, records)?))
            }
            other => other,
        };

        Ok((key.to_string(), value))
    }
}

/// [`Postprocessor::apply`] with default options.
pub fn postprocess(path: &str, key: &str, value: Value) -> Result<(String, Value)> {
    Postprocessor::default().apply(path, key, value)
}

fn unwrap_single(value: Value) -> Value {
    match value {
        Value::Array(array) if array.ndim() == 1 && array.len() == 1 && !array.is_record() => {
            match array.first() {
                Some(scalar) => Value::Scalar(scalar),
                None => Value::Array(array),
            }
        }
        other => other,
    }
}

fn decode_byte_strings(path: &str, value: Value) -> Result<Value> {
    Ok(match value {
        Value::Scalar(Scalar::Bytes(bytes)) => Value::Scalar(Scalar::Text(text::decode_utf8(path, &bytes)?)),
        Value::Array(TypedArray::Bytes { width, values }) => Value::Array(TypedArray::Text {
            width,
            values: decode_array(path, &values, |s| s)?,
        }),
        other => other,
    })
}

fn decode_array(path: &str, values: &ArrayD<Vec<u8>>, finish: impl Fn(String) -> String) -> Result<ArrayD<String>> {
    let decoded = values
        .iter()
        .map(|bytes| text::decode_utf8(path, bytes).map(&finish))
        .collect::<Result<Vec<_>>>()?;
    ArrayD::from_shape_vec(values.raw_dim(), decoded)
        .map_err(|e| H5adError::format(path, format!("cannot reshape decoded strings: {}", e)))
}

/// Rewrites every `S<n>` field as text of `n / 4` characters, truncating the
/// decoded values to that width. Fields narrower than four bytes end up as
/// empty strings.
fn retype_byte_fields(path: &str, records: RecordArray) -> Result<RecordArray> {
    let RecordArray { shape, fields } = records;
    let fields = fields
        .into_iter()
        .map(|field| {
            let values = match field.values {
                TypedArray::Bytes { width, values } => {
                    let chars = width / 4;
                    let field_path = format!("{}[{}]", path, field.name);
                    let values = decode_array(&field_path, &values, |s| text::truncate_chars(s, chars))?;
                    TypedArray::Text { width: chars, values }
                }
                other => other,
            };
            Ok(RecordField {
                name: field.name,
                values,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RecordArray { shape, fields })
}
