use crate::vector::{self, Vec3};

/// Determinant magnitude below which a transform is treated as non-invertible.
pub const SINGULAR_EPS: f64 = 1e-12;

/// Affine transform in 3D: a 3x3 linear part (row-major) followed by a translation.
///
/// This covers every joint of the gantry (rotations and translations) as well as the
/// host-supplied patient placement, which may carry a uniform or non-uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub linear: [[f64; 3]; 3],
    pub translation: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        linear: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        translation: [0.0, 0.0, 0.0],
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::IDENTITY }
    }

    pub fn from_scale(s: f64) -> Self {
        Self {
            linear: [[s, 0.0, 0.0], [0.0, s, 0.0], [0.0, 0.0, s]],
            translation: [0.0, 0.0, 0.0],
        }
    }

    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            linear: [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]],
            translation: [0.0, 0.0, 0.0],
        }
    }

    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            linear: [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
            translation: [0.0, 0.0, 0.0],
        }
    }

    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            linear: [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0, 0.0, 0.0],
        }
    }

    /// Rotation about an arbitrary unit axis (Rodrigues' formula).
    pub fn rotation_axis(axis: Vec3, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let [x, y, z] = axis;
        Self {
            linear: [
                [t * x * x + c, t * x * y - s * z, t * x * z + s * y],
                [t * x * y + s * z, t * y * y + c, t * y * z - s * x],
                [t * x * z - s * y, t * y * z + s * x, t * z * z + c],
            ],
            translation: [0.0, 0.0, 0.0],
        }
    }

    /// Euler rotation in degrees using the XYZ order of common scene graphs (`Rx * Ry * Rz`).
    pub fn from_euler_xyz_deg(angles: Vec3) -> Self {
        Self::rotation_x(angles[0].to_radians())
            .then(&Self::rotation_y(angles[1].to_radians()))
            .then(&Self::rotation_z(angles[2].to_radians()))
    }

    /// Rotation taking the local +Y axis onto the unit vector `dir`.
    pub fn align_y(dir: Vec3) -> Self {
        let up = [0.0, 1.0, 0.0];
        let d = vector::dot(up, dir).clamp(-1.0, 1.0);
        if d > 1.0 - 1e-12 {
            return Self::IDENTITY;
        }
        if d < -1.0 + 1e-12 {
            return Self::rotation_x(std::f64::consts::PI);
        }
        let axis = vector::scale(vector::cross(up, dir), 1.0 / (1.0 - d * d).sqrt());
        Self::rotation_axis(axis, d.acos())
    }

    /// Composition `self * child`: applies `child` first, then `self`.
    ///
    /// Walking a kinematic chain from the root, each node's world transform is
    /// `parent_world.then(&local)`.
    pub fn then(&self, child: &Transform) -> Transform {
        let a = &self.linear;
        let b = &child.linear;
        let mut linear = [[0.0; 3]; 3];
        for (i, row) in linear.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        Transform {
            linear,
            translation: vector::add(self.transform_vector(child.translation), self.translation),
        }
    }

    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        let m = &self.linear;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        vector::add(self.transform_vector(p), self.translation)
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.linear;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse transform, or `None` when the linear part is singular or not finite.
    pub fn inverse(&self) -> Option<Transform> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPS {
            return None;
        }
        let m = &self.linear;
        let inv_det = 1.0 / det;
        let linear = [
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
            ],
        ];
        let inv = Transform { linear, translation: [0.0, 0.0, 0.0] };
        let t = inv.transform_vector(self.translation);
        Some(Transform {
            linear,
            translation: [-t[0], -t[1], -t[2]],
        })
    }

    /// Column-major 4x4 matrix, the layout expected by WebGL scene graphs.
    pub fn to_cols_array(&self) -> [f64; 16] {
        let m = &self.linear;
        let t = &self.translation;
        [
            m[0][0], m[1][0], m[2][0], 0.0,
            m[0][1], m[1][1], m[2][1], 0.0,
            m[0][2], m[1][2], m[2][2], 0.0,
            t[0], t[1], t[2], 1.0,
        ]
    }

    /// Reads a column-major 4x4 matrix. The projective row is ignored.
    pub fn from_cols_array(cols: &[f64; 16]) -> Self {
        Self {
            linear: [
                [cols[0], cols[4], cols[8]],
                [cols[1], cols[5], cols[9]],
                [cols[2], cols[6], cols[10]],
            ],
            translation: [cols[12], cols[13], cols[14]],
        }
    }

    pub fn is_finite(&self) -> bool {
        self.linear.iter().all(|row| vector::is_finite(*row)) && vector::is_finite(self.translation)
    }
}
