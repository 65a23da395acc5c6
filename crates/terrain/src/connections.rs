//! Reachability between the road network, parking lots and buildings.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use bevy::prelude::*;

use crate::buildings::BuildingId;
use crate::city::CityGrid;
use crate::geometry::{ADJACENT_DX, ADJACENT_DZ};
use crate::parking::LotId;
use crate::point::Point2;

/// A route from a map-edge road vertex to a parking lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadConnection {
    pub destination: LotId,
    /// Road vertices from the map-edge source to the lot, inclusive.
    pub polyline: Vec<Point2>,
}

/// A walking route from a building entry point to a parking lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConnection {
    pub building: BuildingId,
    pub lot: LotId,
    /// Path cells from the entry point to the lot, inclusive.
    pub polyline: Vec<Point2>,
}

/// Cached connectivity over the whole map, replaced wholesale by
/// [`ConnectivityGraph::recompute`].
///
/// Sources are visited in sorted coordinate order and each search expands
/// neighbors north, east, south, west, so the first route found to a
/// destination is always the same one for the same map.
#[derive(Resource, Debug, Clone, Default)]
pub struct ConnectivityGraph {
    road_connections: HashMap<LotId, Vec<RoadConnection>>,
    path_connections: HashMap<BuildingId, Vec<PathConnection>>,
}

impl ConnectivityGraph {
    /// Road routes reaching the lot. Empty when the lot is unknown or
    /// unreached.
    pub fn road_connections(&self, lot: LotId) -> &[RoadConnection] {
        self.road_connections
            .get(&lot)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Walking routes from the building to any lot. Empty when unreached.
    pub fn path_connections(&self, building: BuildingId) -> &[PathConnection] {
        self.path_connections
            .get(&building)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Recomputes both connection tables from scratch and swaps them in.
    ///
    /// Every road vertex on the outer map edge seeds a breadth-first search
    /// over the road lattice; the first source to reach a lot owns its
    /// connection. Building entry points that sit on a path seed the walking
    /// searches the same way.
    pub fn recompute(&mut self, city: &CityGrid) {
        let road_started = Instant::now();
        let road_connections = compute_road_connections(city);
        let road_elapsed = road_started.elapsed();

        let path_started = Instant::now();
        let path_connections = compute_path_connections(city);
        let path_elapsed = path_started.elapsed();

        info!(
            "recomputed connectivity: {} road connections in {:?}, {} path connections in {:?}",
            road_connections.values().map(Vec::len).sum::<usize>(),
            road_elapsed,
            path_connections.values().map(Vec::len).sum::<usize>(),
            path_elapsed,
        );

        self.road_connections = road_connections;
        self.path_connections = path_connections;
    }
}

/// Road vertices on the outer edge of the map, in sorted order.
fn road_sources(city: &CityGrid) -> Vec<Point2> {
    let max_x = city.count_x() as i32;
    let max_z = city.count_z() as i32;

    let mut sources = Vec::new();
    for x in 0..=max_x {
        for z in 0..=max_z {
            if x == 0 || z == 0 || x == max_x || z == max_z {
                let p = Point2::new(x, z);
                if city.roads.at_vertex(p) {
                    sources.push(p);
                }
            }
        }
    }
    sources.sort();
    sources
}

fn compute_road_connections(city: &CityGrid) -> HashMap<LotId, Vec<RoadConnection>> {
    let mut connections: HashMap<LotId, Vec<RoadConnection>> = HashMap::new();
    let mut reached: HashSet<LotId> = HashSet::new();

    for source in road_sources(city) {
        let mut queue = VecDeque::new();
        let mut prev: HashMap<Point2, Point2> = HashMap::new();
        queue.push_back(source);
        prev.insert(source, Point2::NULL);

        while let Some(cur) = queue.pop_front() {
            // A road vertex standing on a lot cell is the arrival point.
            if city.field.cell_in_bounds(cur.x, cur.z) {
                if let Some(lot) = city.lot_at(cur) {
                    if reached.insert(lot) {
                        connections.entry(lot).or_default().push(RoadConnection {
                            destination: lot,
                            polyline: retrace(&prev, cur),
                        });
                    }
                }
            }

            for i in 0..4 {
                let next = Point2::new(cur.x + ADJACENT_DX[i], cur.z + ADJACENT_DZ[i]);
                if city.roads.vertex_in_bounds(next)
                    && city.roads.at_vertex(next)
                    && !prev.contains_key(&next)
                {
                    prev.insert(next, cur);
                    queue.push_back(next);
                }
            }
        }
    }

    connections
}

fn compute_path_connections(city: &CityGrid) -> HashMap<BuildingId, Vec<PathConnection>> {
    let mut connections: HashMap<BuildingId, Vec<PathConnection>> = HashMap::new();

    for building_id in city.buildings.building_ids() {
        let Some(building) = city.buildings.building(building_id) else {
            continue;
        };
        let mut reached: HashSet<LotId> = HashSet::new();

        let mut entries = building.entry_points.clone();
        entries.sort();
        for entry in entries {
            if !city.field.cell_in_bounds(entry.x, entry.z) || !city.paths.at(entry) {
                continue;
            }

            let mut queue = VecDeque::new();
            let mut prev: HashMap<Point2, Point2> = HashMap::new();
            queue.push_back(entry);
            prev.insert(entry, Point2::NULL);

            while let Some(cur) = queue.pop_front() {
                if let Some(lot) = city.lot_at(cur) {
                    if reached.insert(lot) {
                        connections
                            .entry(building_id)
                            .or_default()
                            .push(PathConnection {
                                building: building_id,
                                lot,
                                polyline: retrace(&prev, cur),
                            });
                    }
                }

                for i in 0..4 {
                    let next = Point2::new(cur.x + ADJACENT_DX[i], cur.z + ADJACENT_DZ[i]);
                    if city.field.cell_in_bounds(next.x, next.z)
                        && city.paths.at(next)
                        && !prev.contains_key(&next)
                    {
                        prev.insert(next, cur);
                        queue.push_back(next);
                    }
                }
            }
        }
    }

    connections
}

/// Walks the predecessor map back from `end` and returns the polyline in
/// source-to-destination order.
fn retrace(prev: &HashMap<Point2, Point2>, end: Point2) -> Vec<Point2> {
    let mut polyline = Vec::new();
    let mut cur = end;
    while !cur.is_null() {
        polyline.push(cur);
        cur = prev[&cur];
    }
    polyline.reverse();
    polyline
}
