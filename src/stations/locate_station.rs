use crate::types::station::Station;
use haversine::{distance, Location as HaversineLocation, Units as DistanceUnits};
use ordered_float::OrderedFloat;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Great-circle distance in metres between two points given in decimal degrees.
pub fn distance_m(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    distance(
        HaversineLocation {
            latitude: lat_a,
            longitude: lon_a,
        },
        HaversineLocation {
            latitude: lat_b,
            longitude: lon_b,
        },
        DistanceUnits::Kilometers,
    ) * 1000.0
}

/// Point on the unit sphere for a latitude/longitude in degrees. Straight-line
/// (chord) distance between such points grows with great-circle distance, so
/// the R-tree's nearest-neighbour order is great-circle order.
fn unit_vector(latitude: f64, longitude: f64) -> [f64; 3] {
    let (lat, lon) = (latitude.to_radians(), longitude.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

/// A station position in the R-tree. `index` points back into the slice the
/// locator was built from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StationPoint {
    position: [f64; 3],
    latitude: f64,
    longitude: f64,
    index: usize,
}

impl RTreeObject for StationPoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for StationPoint {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        self.position
            .iter()
            .zip(point)
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

/// Nearest-station search over the stations that have coordinates.
#[derive(Debug, Clone)]
pub struct StationLocator {
    rtree: RTree<StationPoint>,
}

impl StationLocator {
    pub fn new(stations: &[Station]) -> Self {
        let points = stations
            .iter()
            .enumerate()
            .filter_map(|(index, station)| {
                station.location.map(|loc| StationPoint {
                    position: unit_vector(loc.latitude, loc.longitude),
                    latitude: loc.latitude,
                    longitude: loc.longitude,
                    index,
                })
            })
            .collect();
        Self {
            rtree: RTree::bulk_load(points),
        }
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// Up to `n_results` stations closest to the point, nearest first, as
    /// `(index, metres)`. `max_distance_m` drops anything farther away.
    /// Pass `usize::MAX` for every station in range.
    pub fn query(
        &self,
        latitude: f64,
        longitude: f64,
        n_results: usize,
        max_distance_m: Option<f64>,
    ) -> Vec<(usize, f64)> {
        let mut results: Vec<(usize, f64)> = self
            .rtree
            .nearest_neighbor_iter(&unit_vector(latitude, longitude))
            .map(|point| {
                let dist = distance_m(latitude, longitude, point.latitude, point.longitude);
                (point.index, dist)
            })
            .take_while(|(_, dist)| max_distance_m.map_or(true, |max| *dist <= max))
            .take(n_results)
            .collect();

        // Haversine and chord order agree up to rounding; settle ties by index.
        results.sort_by_key(|&(index, dist)| (OrderedFloat(dist), index));
        results
    }
}
