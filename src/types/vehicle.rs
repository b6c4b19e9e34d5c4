//! Vehicle types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vehicle reference data pushed in by the platform (read-only here).
/// The plate is carried as a hint in live feed messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub vehicle_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default = "default_in_service")]
    pub in_service: bool,
}

fn default_in_service() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_record_minimal() {
        let json = r#"{
            "vehicleId": "123e4567-e89b-12d3-a456-426614174000",
            "name": "Bus 14"
        }"#;

        let vehicle: VehicleRecord = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.name, "Bus 14");
        assert!(vehicle.plate.is_none());
        assert!(vehicle.in_service);
    }

    #[test]
    fn test_vehicle_record_serialize() {
        let vehicle = VehicleRecord {
            vehicle_id: Uuid::nil(),
            name: "Bus 7".to_string(),
            plate: Some("51B-123.45".to_string()),
            in_service: false,
        };

        let json = serde_json::to_string(&vehicle).unwrap();
        assert!(json.contains("\"plate\":\"51B-123.45\""));
        assert!(json.contains("\"inService\":false"));
    }
}
