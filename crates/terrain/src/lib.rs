//! Editable heightfield terrain with occupancy layers and connectivity.
//!
//! The [`city::CityGrid`] resource owns the height field, the anchor-aware
//! editor and the path/road/parking/building layers, and is the single entry
//! point for placement, destruction and safe height edits. The
//! [`connections::ConnectivityGraph`] resource derives reachability from it,
//! and [`mesh::build_mesh`] turns the field into render geometry.

pub mod buildings;
pub mod city;
pub mod config;
pub mod connections;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod grid2;
pub mod heightfield;
pub mod mesh;
pub mod parking;
pub mod paths;
pub mod point;
pub mod roads;
pub mod tiles;

pub use city::{CityGrid, GridUse};
pub use connections::ConnectivityGraph;
pub use error::TerrainError;
pub use point::{Point2, Point3};
