//! Port registry for the controller board
//!
//! The board exposes four sensor ports (1-4) and four motor ports (A-D).
//! Port ids are one-hot bitmasks so that multiple motor ports can be
//! addressed with a single command by OR-ing their ids together. The
//! registries are fixed at compile time; their order is both iteration
//! and display order.

use std::fmt;

/// Sensor port 1 id
pub const PORT_1: u8 = 0x01;
/// Sensor port 2 id
pub const PORT_2: u8 = 0x02;
/// Sensor port 3 id
pub const PORT_3: u8 = 0x04;
/// Sensor port 4 id
pub const PORT_4: u8 = 0x08;

/// Motor port A id
pub const PORT_A: u8 = 0x01;
/// Motor port B id
pub const PORT_B: u8 = 0x02;
/// Motor port C id
pub const PORT_C: u8 = 0x04;
/// Motor port D id
pub const PORT_D: u8 = 0x08;

/// Kind of physical connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Sensor connector (ports 1-4)
    Sensor,
    /// Motor connector (ports A-D)
    Motor,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortKind::Sensor => write!(f, "sensor"),
            PortKind::Motor => write!(f, "motor"),
        }
    }
}

/// One addressable connector on the controller board
///
/// Identity is the `id` bitmask; `name` is for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    /// One-hot bitmask identifying the port on the wire
    pub id: u8,
    /// Display name ("1".."4" for sensors, "A".."D" for motors)
    pub name: &'static str,
    /// Connector kind
    pub kind: PortKind,
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Sensor port registry, in display order
pub const SENSOR_PORTS: [Port; 4] = [
    Port { id: PORT_1, name: "1", kind: PortKind::Sensor },
    Port { id: PORT_2, name: "2", kind: PortKind::Sensor },
    Port { id: PORT_3, name: "3", kind: PortKind::Sensor },
    Port { id: PORT_4, name: "4", kind: PortKind::Sensor },
];

/// Motor port registry, in display order
pub const MOTOR_PORTS: [Port; 4] = [
    Port { id: PORT_A, name: "A", kind: PortKind::Motor },
    Port { id: PORT_B, name: "B", kind: PortKind::Motor },
    Port { id: PORT_C, name: "C", kind: PortKind::Motor },
    Port { id: PORT_D, name: "D", kind: PortKind::Motor },
];

/// Resolve a port kind to its registry
///
/// Total mapping: an unregistered kind would map to an empty slice rather
/// than panic, and callers treat an empty set as an error.
pub fn registry_for(kind: PortKind) -> &'static [Port] {
    match kind {
        PortKind::Sensor => &SENSOR_PORTS,
        PortKind::Motor => &MOTOR_PORTS,
    }
}

/// Combined id bitmask of a set of ports
pub fn port_mask(ports: &[Port]) -> u8 {
    ports.iter().fold(0, |mask, p| mask | p.id)
}

/// Every port of `set` except `leader`, compared by port id
pub fn other_ports(set: &[Port], leader: Port) -> Vec<Port> {
    set.iter().copied().filter(|p| p.id != leader.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_and_ids() {
        let names: Vec<&str> = MOTOR_PORTS.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
        assert_eq!(MOTOR_PORTS[0].id, PORT_A);
        assert_eq!(MOTOR_PORTS[3].id, PORT_D);
        assert_eq!(SENSOR_PORTS[2].id, PORT_3);
    }

    #[test]
    fn test_port_mask() {
        assert_eq!(port_mask(&MOTOR_PORTS), PORT_A | PORT_B | PORT_C | PORT_D);
        assert_eq!(port_mask(&MOTOR_PORTS[1..3]), PORT_B | PORT_C);
        assert_eq!(port_mask(&[]), 0);
    }

    #[test]
    fn test_other_ports_excludes_by_id() {
        let others = other_ports(&MOTOR_PORTS, MOTOR_PORTS[1]);
        assert_eq!(others.len(), 3);
        assert!(others.iter().all(|p| p.id != PORT_B));
        // Order of the remaining ports is preserved
        let names: Vec<&str> = others.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["A", "C", "D"]);
    }
}
