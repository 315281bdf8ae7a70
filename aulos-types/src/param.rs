//! Parameter handles and values.

use serde::{Deserialize, Serialize};

/// Value class of a synthesizer parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Float,
    Int,
    Bool,
}

/// Stable handle to one engine parameter.
///
/// Resolved once from the parameter's protocol address (`/param/<name>`) and
/// valid for the life of the process. Distinct from the address string so the
/// realtime path never touches strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterRef {
    pub index: usize,
    pub kind: ParamKind,
}

/// One realtime parameter change crossing into the audio thread.
#[derive(Debug, Clone, Copy)]
pub struct ParamUpdate {
    pub param: ParameterRef,
    pub value: f32,
}

/// A typed parameter value as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Int(i32),
    Bool(bool),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Bool(_) => ParamKind::Bool,
        }
    }

    /// Wire encoding for outbound state messages. Booleans go out as
    /// `"0"`/`"1"`, ints and floats as decimal strings.
    pub fn to_wire_string(&self) -> String {
        match self {
            ParamValue::Float(v) => v.to_string(),
            ParamValue::Int(v) => v.to_string(),
            ParamValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        }
    }
}
