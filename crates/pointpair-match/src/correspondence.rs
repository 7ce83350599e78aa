use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

use pointpair_3d::transforms::Transform;

/// Point-index pairs between two fragments, or the explicit absence of any.
///
/// Indices are valid into the post-quantization point arrays of the two
/// fragments. An empty result is a legitimate terminal state and is kept
/// distinct from a matched set; any sentinel padding a fixed-shape consumer
/// needs is the batch collator's decision, not this type's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrespondenceSet {
    /// At least one `[source_index, target_index]` pair was found.
    Matched(Vec<[u32; 2]>),
    /// No point pair fell within the search radius.
    Empty,
}

impl CorrespondenceSet {
    /// Wrap a raw pair list, mapping an empty list to [`CorrespondenceSet::Empty`].
    pub fn from_pairs(pairs: Vec<[u32; 2]>) -> Self {
        if pairs.is_empty() {
            Self::Empty
        } else {
            Self::Matched(pairs)
        }
    }

    /// Get the number of correspondence pairs.
    pub fn len(&self) -> usize {
        match self {
            Self::Matched(pairs) => pairs.len(),
            Self::Empty => 0,
        }
    }

    /// Check if no correspondences were found.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Get the pairs as a slice (empty for [`CorrespondenceSet::Empty`]).
    pub fn pairs(&self) -> &[[u32; 2]] {
        match self {
            Self::Matched(pairs) => pairs,
            Self::Empty => &[],
        }
    }
}

/// Find all point-index pairs within `radius` after aligning `source` onto
/// the target frame.
///
/// `source_to_target` is applied to the source points, a k-d tree is built
/// over the target points, and every source point is queried for all
/// target points within `radius` (Euclidean, inclusive boundary). Source
/// points are visited in array order, which fixes the output order for a
/// given input. When `max_per_source` is given, only the first matches per
/// source point are kept, in the tree's natural radius-query order.
///
/// A source point with no neighbors contributes nothing; an empty source
/// or target yields [`CorrespondenceSet::Empty`].
pub fn find_radius_correspondences(
    source: &[[f64; 3]],
    target: &[[f64; 3]],
    source_to_target: &Transform,
    radius: f64,
    max_per_source: Option<usize>,
) -> CorrespondenceSet {
    if source.is_empty() || target.is_empty() {
        return CorrespondenceSet::Empty;
    }

    let mut aligned = vec![[0.0; 3]; source.len()];
    source_to_target.transform_points(source, &mut aligned);

    let kdtree: ImmutableKdTree<f64, u32, 3, 32> = ImmutableKdTree::new_from_slice(target);

    let radius_sq = radius * radius;
    // kiddo's within_unsorted uses strict `<`; widen the query by an
    // epsilon and post-filter with `<=` to include the exact boundary
    let query_radius_sq = radius_sq + f64::EPSILON * radius_sq.max(1.0);

    let mut pairs = Vec::new();
    for (source_index, point) in aligned.iter().enumerate() {
        let neighbors = kdtree.within_unsorted::<SquaredEuclidean>(point, query_radius_sq);
        let mut kept = 0usize;
        for neighbor in neighbors {
            if neighbor.distance > radius_sq {
                continue;
            }
            if let Some(max) = max_per_source {
                if kept >= max {
                    break;
                }
            }
            pairs.push([source_index as u32, neighbor.item]);
            kept += 1;
        }
    }

    log::debug!(
        "radius search: {} source x {} target points -> {} pairs",
        source.len(),
        target.len(),
        pairs.len()
    );

    CorrespondenceSet::from_pairs(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_points(n: usize, seed: u64) -> Vec<[f64; 3]> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                [
                    rng.random::<f64>(),
                    rng.random::<f64>(),
                    rng.random::<f64>(),
                ]
            })
            .collect()
    }

    #[test]
    fn test_identity_self_matches() {
        let points = random_points(100, 5);
        let matches = find_radius_correspondences(
            &points,
            &points,
            &Transform::identity(),
            1e-9,
            None,
        );

        let pairs: std::collections::HashSet<_> = matches.pairs().iter().copied().collect();
        for i in 0..points.len() as u32 {
            assert!(pairs.contains(&[i, i]), "missing self match for {i}");
        }
    }

    #[test]
    fn test_radius_monotonicity() {
        let source = random_points(50, 1);
        let target = random_points(50, 2);

        let mut previous = 0usize;
        for radius in [0.05, 0.1, 0.2, 0.4] {
            let matches = find_radius_correspondences(
                &source,
                &target,
                &Transform::identity(),
                radius,
                None,
            );
            assert!(
                matches.len() >= previous,
                "doubling the radius must not lose pairs"
            );
            previous = matches.len();
        }
    }

    #[test]
    fn test_empty_target_yields_empty() {
        let source = random_points(10, 3);
        let matches =
            find_radius_correspondences(&source, &[], &Transform::identity(), 1.0, None);
        assert_eq!(matches, CorrespondenceSet::Empty);
        assert_eq!(matches.len(), 0);
    }

    #[test]
    fn test_empty_source_yields_empty() {
        let target = random_points(10, 4);
        let matches =
            find_radius_correspondences(&[], &target, &Transform::identity(), 1.0, None);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let source = vec![[0.0, 0.0, 0.0]];
        let target = vec![[1.0, 0.0, 0.0], [5.0, 0.0, 0.0]];
        let matches =
            find_radius_correspondences(&source, &target, &Transform::identity(), 1.0, None);
        assert_eq!(matches.pairs(), &[[0, 0]]);
    }

    #[test]
    fn test_max_per_source_cap() {
        let source = vec![[0.0, 0.0, 0.0]];
        let target = vec![
            [0.1, 0.0, 0.0],
            [0.0, 0.1, 0.0],
            [0.0, 0.0, 0.1],
            [0.1, 0.1, 0.0],
        ];
        let matches =
            find_radius_correspondences(&source, &target, &Transform::identity(), 1.0, Some(2));
        assert_eq!(matches.len(), 2);
        for pair in matches.pairs() {
            assert_eq!(pair[0], 0);
        }
    }

    #[test]
    fn test_alignment_under_known_transform() {
        // the target is the source shifted by one unit along x
        let source = random_points(30, 9);
        let target: Vec<[f64; 3]> = source
            .iter()
            .map(|p| [p[0] + 1.0, p[1], p[2]])
            .collect();

        let source_to_target = Transform::from_translation(&[1.0, 0.0, 0.0]);
        let matches = find_radius_correspondences(
            &source,
            &target,
            &source_to_target,
            1e-9,
            None,
        );

        let pairs: std::collections::HashSet<_> = matches.pairs().iter().copied().collect();
        for i in 0..source.len() as u32 {
            assert!(pairs.contains(&[i, i]));
        }
    }

    #[test]
    fn test_source_order_is_preserved() {
        let source = vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [20.0, 0.0, 0.0]];
        let target = source.clone();
        let matches =
            find_radius_correspondences(&source, &target, &Transform::identity(), 0.5, None);

        let sources: Vec<u32> = matches.pairs().iter().map(|p| p[0]).collect();
        assert_eq!(sources, vec![0, 1, 2]);
    }

    #[test]
    fn test_from_pairs_tags_empty() {
        assert!(CorrespondenceSet::from_pairs(vec![]).is_empty());
        assert!(!CorrespondenceSet::from_pairs(vec![[0, 0]]).is_empty());
    }
}
