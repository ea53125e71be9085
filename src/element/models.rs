use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Envelope every Element API response is wrapped in.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    pub body: T,

    #[serde(default = "default_ok")]
    pub ok: bool,

    #[serde(default = "default_status")]
    pub status: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieve_after_id: Option<String>,
}

fn default_ok() -> bool {
    true
}

fn default_status() -> u16 {
    200
}

/// A folder, called "tag" by the API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Folder {
    #[serde(default)]
    pub id: Option<Uuid>,

    pub slug: String,

    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Location {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// GeoJSON order: longitude, latitude.
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Device {
    pub id: Uuid,

    /// Platform address, e.g. `DEC0054B0`.
    pub name: String,

    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default)]
    pub tags: Vec<Folder>,

    #[serde(default)]
    pub location: Option<Location>,

    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Device {
    /// Longitude and latitude, `NaN` for both when the device has no location.
    pub fn coordinates(&self) -> (f64, f64) {
        match &self.location {
            Some(location) => (location.coordinates[0], location.coordinates[1]),
            None => (f64::NAN, f64::NAN),
        }
    }

    pub fn decentlab_id(&self) -> Option<u32> {
        decentlab_id_from_name(&self.name)
    }

    /// `fields` flattened into dot-separated paths, e.g. `gerateinformation.hersteller`.
    pub fn flat_fields(&self) -> IndexMap<String, Value> {
        let mut flat = IndexMap::new();
        flatten_into(&mut flat, None, &self.fields);
        flat
    }
}

/// Decentlab devices are registered as `DEC` followed by their ID in hex.
pub fn decentlab_id_from_name(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?;
    if !prefix.eq_ignore_ascii_case("DEC") {
        return None;
    }

    let digits = &name[3..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

fn flatten_into(flat: &mut IndexMap<String, Value>, prefix: Option<&str>, map: &Map<String, Value>) {
    for (key, value) in map {
        let path = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };

        match value {
            Value::Object(inner) => flatten_into(flat, Some(&path), inner),
            other => {
                flat.insert(path, other.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketType {
    Up,
    Down,
}

impl PacketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PacketType::Up => "up",
            PacketType::Down => "down",
        }
    }
}

/// One raw transmission as stored by the platform.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Packet {
    pub id: Uuid,

    pub device_id: Uuid,

    pub inserted_at: DateTime<Utc>,

    #[serde(default)]
    pub transceived_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub packet_type: Option<PacketType>,

    /// Hex-encoded payload.
    #[serde(default)]
    pub payload: Option<String>,

    #[serde(default)]
    pub meta: Value,
}

/// A reading decoded by the platform itself.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Reading {
    #[serde(default)]
    pub id: Option<Uuid>,

    #[serde(default)]
    pub device_id: Option<Uuid>,

    #[serde(default)]
    pub packet_id: Option<Uuid>,

    pub measured_at: DateTime<Utc>,

    #[serde(default)]
    pub inserted_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub data: IndexMap<String, Value>,
}

impl Reading {
    /// The Decentlab ID the station reported in this reading.
    pub fn decentlab_id(&self) -> Option<u32> {
        self.data
            .get("device_id")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn device(value: Value) -> Device {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decentlab_id_from_name() {
        assert_eq!(decentlab_id_from_name("DEC0054B0"), Some(21680));
        assert_eq!(decentlab_id_from_name("dec0054a6"), Some(21670));
        assert_eq!(decentlab_id_from_name("DEC"), None);
        assert_eq!(decentlab_id_from_name("PARK-0042"), None);
        assert_eq!(decentlab_id_from_name("DÉC"), None);
        assert_eq!(decentlab_id_from_name("DEC+54B0"), None);
        assert_eq!(decentlab_id_from_name("DEC-54B0"), None);
        assert_eq!(decentlab_id_from_name("DEC 54B0"), None);
    }

    #[test]
    fn test_coordinates() {
        let d = device(json!({
            "id": "6b1e4d6e-4a4c-4b7a-9c1a-0a0b0c0d0e0f",
            "name": "DEC0054B0",
            "location": {"type": "Point", "coordinates": [7.4652, 51.5136]},
        }));
        assert_eq!(d.coordinates(), (7.4652, 51.5136));
    }

    #[test]
    fn test_missing_location_is_nan() {
        let d = device(json!({
            "id": "6b1e4d6e-4a4c-4b7a-9c1a-0a0b0c0d0e0f",
            "name": "DEC0054B0",
            "location": null,
        }));
        let (lon, lat) = d.coordinates();
        assert!(lon.is_nan());
        assert!(lat.is_nan());
    }

    #[test]
    fn test_flat_fields() {
        let d = device(json!({
            "id": "6b1e4d6e-4a4c-4b7a-9c1a-0a0b0c0d0e0f",
            "name": "DEC0054B0",
            "fields": {
                "gerateinformation": {"hersteller": "Decentlab", "sensor": {"typ": "DL-SHT35"}},
                "hoehe": 2.5,
            },
        }));

        let flat = d.flat_fields();
        assert_eq!(flat["gerateinformation.hersteller"], json!("Decentlab"));
        assert_eq!(flat["gerateinformation.sensor.typ"], json!("DL-SHT35"));
        assert_eq!(flat["hoehe"], json!(2.5));
    }

    #[test]
    fn test_reading_decentlab_id() {
        let r: Reading = serde_json::from_value(json!({
            "measured_at": "2024-08-13T13:06:03.622052Z",
            "data": {"device_id": 21670, "battery_voltage": 3.095},
        }))
        .unwrap();
        assert_eq!(r.decentlab_id(), Some(21670));
    }

    #[test]
    fn test_packet_with_null_payload() {
        let p: Packet = serde_json::from_value(json!({
            "id": "0f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f0",
            "device_id": "6b1e4d6e-4a4c-4b7a-9c1a-0a0b0c0d0e0f",
            "inserted_at": "2024-08-13T13:06:03.622052Z",
            "packet_type": "up",
            "payload": null,
        }))
        .unwrap();
        assert_eq!(p.payload, None);
        assert_eq!(p.packet_type, Some(PacketType::Up));
    }
}
