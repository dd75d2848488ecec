//! Small helpers for `[f64; 3]` points and directions.

pub type Vec3 = [f64; 3];

/// One of the three coordinate axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn unit(self) -> Vec3 {
        let mut v = [0.0; 3];
        v[self.index()] = 1.0;
        v
    }
}

#[inline]
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn scale(a: Vec3, k: f64) -> Vec3 {
    [a[0] * k, a[1] * k, a[2] * k]
}

#[inline]
pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn length_sq(a: Vec3) -> f64 {
    dot(a, a)
}

#[inline]
pub fn length(a: Vec3) -> f64 {
    length_sq(a).sqrt()
}

#[inline]
pub fn distance_sq(a: Vec3, b: Vec3) -> f64 {
    length_sq(sub(a, b))
}

/// Point at fraction `t` of the way from `a` to `b`.
#[inline]
pub fn lerp(a: Vec3, b: Vec3, t: f64) -> Vec3 {
    add(a, scale(sub(b, a), t))
}

/// Unit vector along `a`, or `None` when its length is below `eps`.
pub fn normalize(a: Vec3, eps: f64) -> Option<Vec3> {
    let len = length(a);
    if !(len >= eps) {
        return None;
    }
    Some(scale(a, 1.0 / len))
}

pub fn is_finite(a: Vec3) -> bool {
    a.iter().all(|v| v.is_finite())
}
