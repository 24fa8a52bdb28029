// Mosaic: story correlation for open-source intelligence feeds
//
// This is the library root. Stories flow through entity extraction, then
// clustering and the connection index, then out to reporting.

pub mod config;
pub mod correlation;
pub mod entities;
pub mod output;
pub mod stories;
