use serde::Deserialize;

/// Whether a call at a port loads or unloads cargo.
#[derive(Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PickupType {
    Pickup,
    Delivery,
}

impl PickupType {
    pub(crate) fn index(self) -> usize {
        match self {
            PickupType::Pickup => 0,
            PickupType::Delivery => 1,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Port {
    pub name: String,
    pub pickup_demand: i32,
    pub delivery_demand: i32,
    // paid to a spot carrier whenever the port is not served; visiting avoids it
    pub pickup_penalty: f64,
    pub delivery_penalty: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct VesselClass {
    pub name: String,
    pub capacity: i32,
}
