use std::collections::HashMap;

use anyhow::{Context as _, Result};
use element_iot_api::decentlab::{DecodeOptions, SensorFamily, decode};
use element_iot_api::element::{
    Device, ElementApi, PacketSource, PacketType, PacketsQuery, ReadingsQuery,
};
use element_iot_api::table::{Cell, Table, device_metadata, measurement_cells};
use tracing::{info, warn};
use uuid::Uuid;

const ADDRESS: &str = "address";

/// Uplink packets of `folder`, decoded as `family` and joined with device metadata.
///
/// Packets without payload or failing to decode are skipped.
pub async fn export_packets(
    api: &ElementApi,
    folder: &str,
    family: SensorFamily,
    query: &PacketsQuery,
    options: &DecodeOptions,
) -> Result<Table> {
    let devices = api
        .get_devices(folder)
        .await
        .with_context(|| format!("failed to get devices of {folder}"))?;
    let addresses: HashMap<Uuid, &str> = devices
        .iter()
        .map(|d| (d.id, d.name.as_str()))
        .collect();

    let query = PacketsQuery {
        packet_type: Some(PacketType::Up),
        ..query.clone()
    };
    let packets = api
        .get_packets(&PacketSource::Folder(folder.to_string()), &query)
        .await
        .with_context(|| format!("failed to get packets of {folder}"))?;

    let mut table = Table::new("inserted_at");
    let mut skipped = 0;
    for packet in &packets {
        let Some(payload) = &packet.payload else {
            skipped += 1;
            continue;
        };

        let measurement = match decode(family, payload.as_bytes(), true, options) {
            Ok(m) => m,
            Err(err) => {
                warn!(packet_id = %packet.id, %family, "failed to decode packet: {err}");
                skipped += 1;
                continue;
            }
        };

        let address = Cell::from(addresses.get(&packet.device_id).copied());
        let row = std::iter::once((ADDRESS.to_string(), address))
            .chain(measurement_cells(&measurement));
        table.push_row(packet.inserted_at, row);
    }
    table.sort_by_index();

    info!(
        folder,
        packets = packets.len(),
        rows = table.len(),
        skipped,
        "decoded packets"
    );

    Ok(join_metadata(&table, &devices))
}

/// Platform readings of every device in `folder`, joined with device metadata.
pub async fn export_readings(api: &ElementApi, folder: &str, query: &ReadingsQuery) -> Result<Table> {
    let devices = api
        .get_devices(folder)
        .await
        .with_context(|| format!("failed to get devices of {folder}"))?;

    let mut tables = Vec::with_capacity(devices.len());
    for device in &devices {
        let table = api
            .get_readings_table(&device.name, query)
            .await
            .with_context(|| format!("failed to get readings of {}", device.name))?;
        if table.is_empty() {
            continue;
        }
        tables.push(table.with_constant(ADDRESS, Cell::from(device.name.as_str())));
    }

    let table = if tables.is_empty() {
        Table::new("measured_at")
    } else {
        Table::concat(tables)
    };
    info!(folder, devices = devices.len(), rows = table.len(), "fetched readings");

    Ok(join_metadata(&table, &devices))
}

fn join_metadata(table: &Table, devices: &[Device]) -> Table {
    table.left_join(ADDRESS, &device_metadata(devices))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use element_iot_api::element::{ApiError, Transport};
    use serde_json::json;

    use super::*;

    /// Serves canned bodies by URL path.
    struct FakeTransport {
        bodies: HashMap<&'static str, String>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        fn new(bodies: Vec<(&'static str, serde_json::Value)>) -> Self {
            Self {
                bodies: bodies.into_iter().map(|(k, v)| (k, v.to_string())).collect(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(&self, url: &str) -> Result<String, ApiError> {
            self.requested.lock().unwrap().push(url.to_string());
            let path = url
                .trim_start_matches("https://testing.element-iot.com/api/v1/")
                .split('?')
                .next()
                .unwrap();
            self.bodies.get(path).cloned().ok_or_else(|| ApiError::Http {
                status: 404,
                message: format!("no fixture for {path}"),
            })
        }

        async fn get_lines(&self, url: &str) -> Result<Vec<String>, ApiError> {
            Err(ApiError::Stream(format!("unexpected stream request: {url}")))
        }
    }

    const FOLDER: &str = "stadt-dortmund-klimasensoren-aktiv-sht35";

    fn devices() -> serde_json::Value {
        json!({"body": [
            {
                "id": "3f3b0c4e-0a0c-4c3e-b0a1-54a600000000",
                "name": "DEC0054A6",
                "location": {"type": "Point", "coordinates": [7.4652, 51.5136]},
            },
            {
                "id": "3f3b0c4e-0a0c-4c3e-b0a1-54b000000000",
                "name": "DEC0054B0",
                "location": null,
            },
        ]})
    }

    fn api(transport: FakeTransport) -> ElementApi {
        ElementApi::with_transport(
            "https://testing.element-iot.com/api/v1",
            "123456789ABCDEFG",
            Arc::new(transport),
        )
    }

    #[tokio::test]
    async fn test_export_packets() {
        let transport = FakeTransport::new(vec![
            ("tags/stadt-dortmund-klimasensoren-aktiv-sht35/devices", devices()),
            (
                "tags/stadt-dortmund-klimasensoren-aktiv-sht35/packets",
                json!({"body": [
                    {
                        "id": "0f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f1",
                        "device_id": "3f3b0c4e-0a0c-4c3e-b0a1-54b000000000",
                        "inserted_at": "2024-08-13T13:11:04Z",
                        "packet_type": "up",
                        "payload": "0254b00003783f596e0c17",
                    },
                    {
                        "id": "0f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f0",
                        "device_id": "3f3b0c4e-0a0c-4c3e-b0a1-54a600000000",
                        "inserted_at": "2024-08-13T13:06:03Z",
                        "packet_type": "up",
                        "payload": "0254a60003783f596e0c17",
                    },
                    {
                        "id": "0f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f2",
                        "device_id": "3f3b0c4e-0a0c-4c3e-b0a1-54a600000000",
                        "inserted_at": "2024-08-13T13:07:00Z",
                        "packet_type": "up",
                        "payload": null,
                    },
                    {
                        "id": "0f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f3",
                        "device_id": "3f3b0c4e-0a0c-4c3e-b0a1-54a600000000",
                        "inserted_at": "2024-08-13T13:08:00Z",
                        "packet_type": "up",
                        "payload": "0254a6",
                    },
                ]}),
            ),
        ]);

        let api = api(transport);
        let query = PacketsQuery {
            start: Some(Utc.with_ymd_and_hms(2024, 8, 13, 13, 5, 0).unwrap()),
            ..Default::default()
        };
        let table = export_packets(
            &api,
            FOLDER,
            SensorFamily::Sht35,
            &query,
            &DecodeOptions::default(),
        )
        .await
        .unwrap();

        // null and truncated payloads are skipped, rows sorted by time
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.column("address").unwrap(),
            &[Cell::from("DEC0054A6"), Cell::from("DEC0054B0")]
        );
        assert_eq!(
            table.column("device_id").unwrap(),
            &[Cell::Int(21670), Cell::Int(21680)]
        );
        assert_eq!(
            table.column("decentlab_id").unwrap(),
            &[Cell::Int(21670), Cell::Int(21680)]
        );
        assert_eq!(table.column("longitude").unwrap()[0], Cell::Float(7.4652));
        assert!(matches!(table.column("longitude").unwrap()[1], Cell::Float(v) if v.is_nan()));
    }

    #[tokio::test]
    async fn test_export_readings() {
        let transport = FakeTransport::new(vec![
            ("tags/stadt-dortmund-klimasensoren-aktiv-sht35/devices", devices()),
            (
                "devices/by-name/DEC0054A6/readings",
                json!({"body": [{
                    "measured_at": "2024-08-13T13:06:03.622052Z",
                    "data": {"air_temperature": 37.2, "device_id": 21670},
                }]}),
            ),
            ("devices/by-name/DEC0054B0/readings", json!({"body": []})),
        ]);

        let api = api(transport);
        let table = export_readings(&api, FOLDER, &ReadingsQuery::default())
            .await
            .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.column("address").unwrap(), &[Cell::from("DEC0054A6")]);
        assert_eq!(table.column("air_temperature").unwrap(), &[Cell::Float(37.2)]);
        assert_eq!(table.column("latitude").unwrap(), &[Cell::Float(51.5136)]);
    }
}
