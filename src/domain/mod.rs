// Domain layer: models, notifications and the ports the core talks through.

pub mod model;
pub mod notification;
pub mod ports;
