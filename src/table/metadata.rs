use indexmap::IndexMap;

use crate::element::Device;
use crate::table::{Cell, Lookup};

/// Device metadata keyed by address, ready for [`crate::table::Table::left_join`].
///
/// Devices without a location get `NaN` coordinates.
pub fn device_metadata(devices: &[Device]) -> Lookup {
    devices
        .iter()
        .map(|device| (device.name.clone(), metadata_row(device)))
        .collect()
}

fn metadata_row(device: &Device) -> IndexMap<String, Cell> {
    let (longitude, latitude) = device.coordinates();

    let mut row = IndexMap::new();
    row.insert("decentlab_id".to_string(), Cell::from(device.decentlab_id().map(i64::from)));
    row.insert("longitude".to_string(), Cell::Float(longitude));
    row.insert("latitude".to_string(), Cell::Float(latitude));
    for (path, value) in device.flat_fields() {
        row.insert(path, Cell::from(&value));
    }
    row
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_device_metadata() {
        let devices: Vec<Device> = serde_json::from_value(json!([
            {
                "id": "3f3b0c4e-0a0c-4c3e-b0a1-54a600000000",
                "name": "DEC0054A6",
                "location": {"type": "Point", "coordinates": [7.4652, 51.5136]},
                "fields": {"gerateinformation": {"standort": "Westfalenpark"}},
            },
            {
                "id": "3f3b0c4e-0a0c-4c3e-b0a1-54b000000000",
                "name": "PARK-0001",
            },
        ]))
        .unwrap();

        let lookup = device_metadata(&devices);

        let a = &lookup["DEC0054A6"];
        assert_eq!(a["decentlab_id"], Cell::Int(21670));
        assert_eq!(a["longitude"], Cell::Float(7.4652));
        assert_eq!(a["latitude"], Cell::Float(51.5136));
        assert_eq!(
            a["gerateinformation.standort"],
            Cell::from("Westfalenpark")
        );

        let b = &lookup["PARK-0001"];
        assert_eq!(b["decentlab_id"], Cell::Null);
        assert!(matches!(b["longitude"], Cell::Float(v) if v.is_nan()));
        assert!(matches!(b["latitude"], Cell::Float(v) if v.is_nan()));
    }
}
