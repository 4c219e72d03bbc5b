//! Dense distance matrix over the problem's node layout.

use super::DistanceMetric;
use crate::models::Location;

/// Row-major n×n matrix indexed by node position.
///
/// Built once per problem. Entries are computed from coordinates, so the
/// matrix is symmetric with a zero diagonal.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Location, LocationId};
/// use u_gvrp::distance::{DistanceMatrix, DistanceMetric};
///
/// let nodes = vec![
///     Location::new(LocationId::Depot(0), 0.0, 0.0),
///     Location::new(LocationId::Customer(1), 3.0, 4.0),
///     Location::new(LocationId::Station(0), 6.0, 8.0),
/// ];
/// let dm = DistanceMatrix::from_locations(&nodes, DistanceMetric::Euclidean);
/// assert!((dm.get(0, 2) - 10.0).abs() < 1e-10);
/// assert_eq!(dm.nearest_neighbor(1, &[0, 2]), Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Measures every pair of `locations` with `metric`.
    pub fn from_locations(locations: &[Location], metric: DistanceMetric) -> Self {
        let size = locations.len();
        let data = locations
            .iter()
            .flat_map(|from| locations.iter().map(move |to| metric.measure(from, to)))
            .collect();
        Self { data, size }
    }

    /// Distance from node `from` to node `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Closest of `candidates` to `from`; ties go to the earlier candidate.
    pub fn nearest_neighbor(&self, from: usize, candidates: &[usize]) -> Option<usize> {
        candidates
            .iter()
            .copied()
            .min_by(|&a, &b| self.get(from, a).total_cmp(&self.get(from, b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationId;

    fn nodes() -> Vec<Location> {
        vec![
            Location::new(LocationId::Depot(0), 0.0, 0.0),
            Location::new(LocationId::Customer(1), 3.0, 4.0),
            Location::new(LocationId::Station(0), 0.0, 8.0),
        ]
    }

    #[test]
    fn test_euclidean_entries() {
        let dm = DistanceMatrix::from_locations(&nodes(), DistanceMetric::Euclidean);
        assert_eq!(dm.size(), 3);
        assert!((dm.get(0, 1) - 5.0).abs() < 1e-10);
        assert!((dm.get(2, 0) - 8.0).abs() < 1e-10);
        assert!(dm.get(1, 1).abs() < 1e-10);
        assert!((dm.get(1, 2) - dm.get(2, 1)).abs() < 1e-10);
    }

    #[test]
    fn test_manhattan_entries() {
        let dm = DistanceMatrix::from_locations(&nodes(), DistanceMetric::Manhattan);
        assert!((dm.get(0, 1) - 7.0).abs() < 1e-10);
        assert!((dm.get(1, 2) - 7.0).abs() < 1e-10);
    }

    #[test]
    fn test_nearest_neighbor() {
        let dm = DistanceMatrix::from_locations(&nodes(), DistanceMetric::Euclidean);
        assert_eq!(dm.nearest_neighbor(0, &[2, 1]), Some(1));
        assert_eq!(dm.nearest_neighbor(0, &[2]), Some(2));
        assert_eq!(dm.nearest_neighbor(0, &[]), None);
        // 1 is 5 away from both 0 and 2
        assert_eq!(dm.nearest_neighbor(1, &[2, 0]), Some(2));
    }
}
