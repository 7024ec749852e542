pub mod calibration;
pub mod comparison;
pub mod config;
pub mod domain;
pub mod numerics;
pub mod peaks;
pub mod report;
pub mod spectrum;
