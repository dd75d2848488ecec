use thiserror::Error;

use crate::controls::Control;

/// Errors raised while loading or validating a [`crate::SimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid range for control `{control}`: {reason}")]
    InvalidRange { control: Control, reason: String },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn value(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue { field, reason: reason.into() }
    }
}

/// Errors raised while capturing patient bounds from asset geometry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoundsError {
    #[error("bounding box coordinate on axis {axis} is not finite")]
    NonFinite { axis: usize },

    #[error("bounding box is inverted on axis {axis}: min {min} > max {max}")]
    Inverted { axis: usize, min: f64, max: f64 },

    #[error("bounding box has zero extent on every axis")]
    Empty,

    #[error("vertex buffer is empty")]
    NoVertices,

    #[error("vertex buffer length {len} is not a multiple of {dim}")]
    RaggedBuffer { len: usize, dim: usize },
}

/// Errors raised while reading a patient asset.
#[cfg(feature = "gltf")]
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to parse glTF asset: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("glTF asset contains no mesh primitives")]
    NoPrimitives,

    #[error(transparent)]
    Bounds(#[from] BoundsError),
}
