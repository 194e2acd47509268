//! Titan Battle - tactical hex battles for a fantasy wargame

pub mod battle;
pub mod core;
