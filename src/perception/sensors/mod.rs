//! Range sensor readings and the index-to-zone table

use crate::config::SensorLayout;

/// One sonar sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Slot number around the chassis
    pub index: usize,
    /// Distance to the detected point
    pub range: f64,
    /// Whether the sensor reported a detection at all
    pub detected: bool,
}

impl SensorReading {
    /// A detection at `range`
    pub fn hit(index: usize, range: f64) -> Self {
        SensorReading {
            index,
            range,
            detected: true,
        }
    }

    /// No detection from this slot
    pub fn clear(index: usize) -> Self {
        SensorReading {
            index,
            range: f64::INFINITY,
            detected: false,
        }
    }
}

/// Zones a single sensor slot contributes to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorZones {
    pub front: bool,
    pub left: bool,
    pub right: bool,
}

impl SensorLayout {
    /// Zone membership of a slot; unmapped slots belong to no zone
    pub fn zones(&self, index: usize) -> SensorZones {
        SensorZones {
            front: self.front.contains(&index),
            left: self.left.contains(&index),
            right: self.right.contains(&index),
        }
    }
}
