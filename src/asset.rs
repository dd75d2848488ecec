//! Patient bounds straight from a glTF or GLB asset.
//!
//! Only the `POSITION` accessor bounds are read, so no vertex data is decoded. Node
//! transforms are ignored on purpose: the box is the raw local-space box the asset was
//! authored in.

use gltf::Semantic;

use crate::bounds::{BoundingBox, PatientBounds};
use crate::error::AssetError;

fn accessor_corner(value: Option<gltf::json::Value>) -> Option<[f64; 3]> {
    let value = value?;
    let values = value.as_array()?;
    if values.len() < 3 {
        return None;
    }
    Some([values[0].as_f64()?, values[1].as_f64()?, values[2].as_f64()?])
}

/// Union of the position bounds of every mesh primitive in the document.
pub fn mesh_bounds(slice: &[u8]) -> Result<BoundingBox<3>, AssetError> {
    let gltf = gltf::Gltf::from_slice(slice)?;
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    let mut found = false;
    for mesh in gltf.meshes() {
        for primitive in mesh.primitives() {
            let Some(accessor) = primitive.get(&Semantic::Positions) else {
                continue;
            };
            let (Some(lo), Some(hi)) = (accessor_corner(accessor.min()), accessor_corner(accessor.max())) else {
                log::debug!("mesh {:?} has a position accessor without min/max", mesh.name());
                continue;
            };
            for i in 0..3 {
                min[i] = min[i].min(lo[i]);
                max[i] = max[i].max(hi[i]);
            }
            found = true;
        }
    }
    if !found {
        return Err(AssetError::NoPrimitives);
    }
    Ok(BoundingBox::new(min, max))
}

/// Captures [`PatientBounds`] from a glTF or GLB byte slice.
pub fn capture_patient_bounds(slice: &[u8]) -> Result<PatientBounds, AssetError> {
    let bbox = mesh_bounds(slice)?;
    Ok(PatientBounds::capture(bbox.min, bbox.max)?)
}
