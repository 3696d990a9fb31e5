// Domain layer: row/result models, vendor payloads, and the ports the core depends on.

pub mod model;
pub mod payload;
pub mod ports;
