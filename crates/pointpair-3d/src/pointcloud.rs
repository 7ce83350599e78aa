/// A point cloud with points and optional per-point colors.
///
/// Colors double as placeholder feature vectors in the pairing pipeline,
/// so they are stored as floating point triples.
#[derive(Debug, Clone)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
    // Optional per-point colors (or feature placeholders).
    colors: Option<Vec<[f64; 3]>>,
}

impl PointCloud {
    /// Create a new point cloud from points and optional colors.
    pub fn new(points: Vec<[f64; 3]>, colors: Option<Vec<[f64; 3]>>) -> Self {
        Self { points, colors }
    }

    /// Create a point cloud with every color set to `[1.0, 1.0, 1.0]`.
    pub fn with_unit_colors(points: Vec<[f64; 3]>) -> Self {
        let colors = vec![[1.0, 1.0, 1.0]; points.len()];
        Self {
            points,
            colors: Some(colors),
        }
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get as mutable reference the points in the point cloud.
    pub fn points_mut(&mut self) -> &mut [[f64; 3]] {
        &mut self.points
    }

    /// Get as reference the colors of the points in the point cloud.
    pub fn colors(&self) -> Option<&[[f64; 3]]> {
        self.colors.as_deref()
    }

    /// Compute the centroid of the point cloud.
    ///
    /// Returns `None` for an empty cloud.
    pub fn centroid(&self) -> Option<[f64; 3]> {
        if self.points.is_empty() {
            return None;
        }
        let mut sum = [0.0; 3];
        for point in &self.points {
            sum[0] += point[0];
            sum[1] += point[1];
            sum[2] += point[2];
        }
        let inv_len = 1.0 / self.points.len() as f64;
        Some([sum[0] * inv_len, sum[1] * inv_len, sum[2] * inv_len])
    }

    /// Build a new point cloud keeping only the points at `indices`, in
    /// the given order.
    ///
    /// Colors are re-indexed by the same list so points and colors stay
    /// consistent.
    ///
    /// # Panics
    /// Panics if any index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> PointCloud {
        let points = indices.iter().map(|&i| self.points[i]).collect();
        let colors = self
            .colors
            .as_ref()
            .map(|colors| indices.iter().map(|&i| colors[i]).collect());
        PointCloud { points, colors }
    }
}
