use glam::{DMat4, DVec3, DVec4};
use rand::Rng;

/// Error types for the transforms module.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransformError {
    /// The rotation axis has a near-zero norm.
    #[error("cannot compute a rotation matrix from a zero-norm axis")]
    DegenerateAxis,

    /// The reference point cloud is empty, so its centroid is undefined.
    #[error("cannot sample a transform for an empty point cloud")]
    EmptyPointCloud,
}

/// Compute the rotation matrix from an axis and angle (Rodrigues formula).
///
/// The axis does not need to be a unit vector; it is normalized internally.
/// A near-zero-norm axis is rejected with [`TransformError::DegenerateAxis`].
///
/// # Arguments
///
/// * `axis` - The axis of rotation.
/// * `angle` - The angle of rotation in radians.
///
/// # Returns
///
/// The rotation matrix.
pub fn axis_angle_to_rotation_matrix(
    axis: &[f64; 3],
    angle: f64,
) -> Result<[[f64; 3]; 3], TransformError> {
    // normalize the vector
    let axis_norm = {
        let magnitude = (axis[0].powi(2) + axis[1].powi(2) + axis[2].powi(2)).sqrt();
        match magnitude < 1e-10 {
            true => return Err(TransformError::DegenerateAxis),
            false => [
                axis[0] / magnitude,
                axis[1] / magnitude,
                axis[2] / magnitude,
            ],
        }
    };

    let x = axis_norm[0];
    let y = axis_norm[1];
    let z = axis_norm[2];

    let c = angle.cos();
    let s = angle.sin();
    let t = 1.0 - c;

    let m00 = c + x * x * t;
    let m11 = c + y * y * t;
    let m22 = c + z * z * t;

    let tmp1 = x * y * t;
    let tmp2 = z * s;

    let m10 = tmp1 + tmp2;
    let m01 = tmp1 - tmp2;

    let tmp3 = x * z * t;
    let tmp4 = y * s;

    let m20 = tmp3 - tmp4;
    let m02 = tmp3 + tmp4;

    let tmp5 = y * z * t;
    let tmp6 = x * s;

    let m12 = tmp5 - tmp6;
    let m21 = tmp5 + tmp6;

    Ok([[m00, m01, m02], [m10, m11, m12], [m20, m21, m22]])
}

/// A 4x4 homogeneous transform.
///
/// Holds a 3x3 rotation block (optionally with a uniform scale folded in)
/// and a 3x1 translation block. Composition is matrix product, applied
/// right-to-left to points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    mat: DMat4,
}

impl Transform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            mat: DMat4::IDENTITY,
        }
    }

    /// Create a transform from a rotation matrix and a translation vector.
    pub fn from_rotation_translation(rotation: &[[f64; 3]; 3], translation: &[f64; 3]) -> Self {
        let mat = DMat4::from_cols(
            DVec4::new(rotation[0][0], rotation[1][0], rotation[2][0], 0.0),
            DVec4::new(rotation[0][1], rotation[1][1], rotation[2][1], 0.0),
            DVec4::new(rotation[0][2], rotation[1][2], rotation[2][2], 0.0),
            DVec4::new(translation[0], translation[1], translation[2], 1.0),
        );
        Self { mat }
    }

    /// Create a uniform scaling transform.
    pub fn from_uniform_scale(scale: f64) -> Self {
        Self {
            mat: DMat4::from_scale(DVec3::splat(scale)),
        }
    }

    /// Create a pure translation transform.
    pub fn from_translation(translation: &[f64; 3]) -> Self {
        Self {
            mat: DMat4::from_translation(DVec3::from_array(*translation)),
        }
    }

    /// Compose two transforms as the matrix product `self * rhs`.
    ///
    /// The resulting transform applies `rhs` first, then `self`.
    pub fn compose(&self, rhs: &Transform) -> Transform {
        Transform {
            mat: self.mat * rhs.mat,
        }
    }

    /// Invert the transform.
    pub fn inverse(&self) -> Transform {
        Transform {
            mat: self.mat.inverse(),
        }
    }

    /// Apply the transform to a single point.
    pub fn transform_point(&self, point: &[f64; 3]) -> [f64; 3] {
        self.mat
            .transform_point3(DVec3::from_array(*point))
            .to_array()
    }

    /// Apply the transform to a set of points.
    ///
    /// PRECONDITION: `dst_points` is a pre-allocated slice of the same size
    /// as `src_points`.
    pub fn transform_points(&self, src_points: &[[f64; 3]], dst_points: &mut [[f64; 3]]) {
        assert_eq!(src_points.len(), dst_points.len());
        for (src, dst) in src_points.iter().zip(dst_points.iter_mut()) {
            *dst = self.transform_point(src);
        }
    }

    /// Apply the transform to a set of points in place.
    pub fn transform_points_inplace(&self, points: &mut [[f64; 3]]) {
        for point in points.iter_mut() {
            *point = self.transform_point(point);
        }
    }

    /// Export the transform as a row-major 4x4 array.
    pub fn rows(&self) -> [[f64; 4]; 4] {
        self.mat.transpose().to_cols_array_2d()
    }
}

/// Sample a random homogeneous transform for a point cloud.
///
/// The rotation axis is drawn uniformly from `[-0.5, 0.5)^3` and the angle
/// uniformly from `[-rotation_range_deg / 2, rotation_range_deg / 2]`
/// degrees. The translation of the rotation block is `-R * centroid`, so
/// the transform rotates the cloud about its centroid and re-centers it at
/// the origin. An optional uniform scale from `scale_range` is composed
/// after the rotation, and an optional per-axis translation drawn from
/// `translation_range` is composed last:
/// `T = T_rot * T_scale * T_translation`.
///
/// Draws mutate `rng`; callers are expected to supply a worker-local
/// generator when running items in parallel.
///
/// # Errors
///
/// Returns [`TransformError::EmptyPointCloud`] when `points` is empty and
/// [`TransformError::DegenerateAxis`] when the axis draw has a near-zero
/// norm.
pub fn sample_random_transform(
    points: &[[f64; 3]],
    rng: &mut impl Rng,
    rotation_range_deg: f64,
    scale_range: Option<(f64, f64)>,
    translation_range: Option<(f64, f64)>,
) -> Result<Transform, TransformError> {
    if points.is_empty() {
        return Err(TransformError::EmptyPointCloud);
    }

    let axis = [
        rng.random::<f64>() - 0.5,
        rng.random::<f64>() - 0.5,
        rng.random::<f64>() - 0.5,
    ];
    let angle = rotation_range_deg * std::f64::consts::PI / 180.0 * (rng.random::<f64>() - 0.5);
    let rotation = axis_angle_to_rotation_matrix(&axis, angle)?;

    let centroid = {
        let mut sum = [0.0; 3];
        for point in points {
            sum[0] += point[0];
            sum[1] += point[1];
            sum[2] += point[2];
        }
        let inv_len = 1.0 / points.len() as f64;
        [sum[0] * inv_len, sum[1] * inv_len, sum[2] * inv_len]
    };

    // translation re-centers the cloud at the origin before rotating
    let mut translation = [0.0; 3];
    for (i, row) in rotation.iter().enumerate() {
        translation[i] = -(row[0] * centroid[0] + row[1] * centroid[1] + row[2] * centroid[2]);
    }

    let t_rot = Transform::from_rotation_translation(&rotation, &translation);

    let t_scale = match scale_range {
        Some((min, max)) => Transform::from_uniform_scale(rng.random_range(min..max)),
        None => Transform::identity(),
    };

    let t_translation = match translation_range {
        Some((min, max)) => {
            let offset = [
                rng.random_range(min..max),
                rng.random_range(min..max),
                rng.random_range(min..max),
            ];
            Transform::from_translation(&offset)
        }
        None => Transform::identity(),
    };

    Ok(t_rot.compose(&t_scale).compose(&t_translation))
}
