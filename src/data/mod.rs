pub mod axis;
pub mod chart;
pub mod curve;
pub mod curve_look;
pub mod decimate;
pub mod group;
pub mod player;
pub mod signal;
