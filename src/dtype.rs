//! Storage types, shapes and fill values for planned fields.
//!
//! Storage type is resolved once, at plan time, into a statically
//! dispatched writer per column. There is no per-value dispatch once a
//! chunk starts filling.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
}

impl IntWidth {
    pub fn min_value(self) -> i64 {
        match self {
            IntWidth::I8 => i8::MIN as i64,
            IntWidth::I16 => i16::MIN as i64,
            IntWidth::I32 => i32::MIN as i64,
            IntWidth::I64 => i64::MIN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F32,
    F64,
}

/// The storage representation chosen for a planned field.
#[derive(Debug, Clone, PartialEq)]
pub enum DType {
    Int(IntWidth),
    Float(FloatWidth),
    Bool,
    /// Fixed-width byte string, NUL-padded/truncated to `width`.
    FixedString(usize),
    /// Variable-length, lossless UTF-8 string.
    VarString,
}

impl DType {
    /// Parse a caller-supplied type override token: numpy-style width
    /// codes (`i1`/`i2`/`i4`/`i8`, `f4`/`f8`), `S<k>` fixed strings,
    /// `object`/`String` for variable strings, and `bool`.
    ///
    /// Genotype pseudo-types (`genotype/...`, `genotype_ac/...`) are
    /// handled by [`crate::plan`], which strips the prefix before calling
    /// this parser on the remaining width token.
    pub fn parse_override(token: &str) -> Result<DType> {
        match token {
            "i1" | "int8" => Ok(DType::Int(IntWidth::I8)),
            "i2" | "int16" => Ok(DType::Int(IntWidth::I16)),
            "i4" | "int32" | "Integer" => Ok(DType::Int(IntWidth::I32)),
            "i8" | "int64" => Ok(DType::Int(IntWidth::I64)),
            "f4" | "float32" => Ok(DType::Float(FloatWidth::F32)),
            "f8" | "float64" | "Float" => Ok(DType::Float(FloatWidth::F64)),
            "bool" | "Flag" => Ok(DType::Bool),
            "object" | "String" | "str" => Ok(DType::VarString),
            other if other.starts_with('S') => {
                let width: usize = other[1..]
                    .parse()
                    .map_err(|_| Error::InvalidPlan(format!("invalid fixed-width type '{other}'")))?;
                Ok(DType::FixedString(width))
            }
            other => Err(Error::InvalidPlan(format!("unknown type token '{other}'"))),
        }
    }

    /// Default storage type for a header-declared scalar/vector field.
    pub fn default_for(ty: crate::header::ValueType) -> DType {
        match ty {
            crate::header::ValueType::Integer => DType::Int(IntWidth::I32),
            crate::header::ValueType::Float => DType::Float(FloatWidth::F32),
            crate::header::ValueType::Flag => DType::Bool,
            crate::header::ValueType::Character => DType::FixedString(1),
            crate::header::ValueType::String => DType::VarString,
        }
    }
}

/// The sentinel value written for an absent cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FillValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl FillValue {
    pub fn default_for(dtype: &DType) -> FillValue {
        match dtype {
            DType::Int(_) => FillValue::Int(-1),
            DType::Float(_) => FillValue::Float(f64::NAN),
            DType::Bool => FillValue::Bool(false),
            DType::FixedString(_) => FillValue::Str(String::new()),
            DType::VarString => FillValue::Str(String::new()),
        }
    }

    pub fn as_int(&self) -> i64 {
        match self {
            FillValue::Int(v) => *v,
            FillValue::Float(v) => *v as i64,
            FillValue::Bool(v) => *v as i64,
            FillValue::Str(_) => -1,
        }
    }

    pub fn as_float(&self) -> f64 {
        match self {
            FillValue::Float(v) => *v,
            FillValue::Int(v) => *v as f64,
            FillValue::Bool(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            FillValue::Str(_) => f64::NAN,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            FillValue::Bool(v) => *v,
            FillValue::Int(v) => *v != 0,
            FillValue::Float(v) => *v != 0.0,
            FillValue::Str(s) => !s.is_empty(),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FillValue::Str(s) => s.as_str(),
            _ => "",
        }
    }
}
