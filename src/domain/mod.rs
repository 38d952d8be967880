// Domain layer: migration records, inferred schemas and ports (interfaces).
// No AWS types leak into this layer; adapters own the attribute conversion.

pub mod model;
pub mod ports;
pub mod schema;
