use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::element::query::Params;
use crate::element::{
    ApiError, ApiResponse, DEFAULT_TIMEOUT, Device, Folder, HttpTransport, Packet, PacketSource,
    PacketsQuery, Reading, ReadingsQuery, Result, Transport,
};
use crate::table::Table;

/// Client for the Element IoT REST API.
///
/// Besides plain fetches it keeps, per folder, a mapping of Decentlab IDs to
/// platform addresses learned while resolving one from the other.
pub struct ElementApi {
    api_location: String,
    api_key: String,
    transport: Arc<dyn Transport>,
    id_to_address: HashMap<String, HashMap<u32, String>>,
}

impl ElementApi {
    pub fn new(api_location: &str, api_key: &str) -> Result<Self> {
        let transport = HttpTransport::new(DEFAULT_TIMEOUT)?;
        Ok(Self::with_transport(api_location, api_key, Arc::new(transport)))
    }

    pub fn with_transport(api_location: &str, api_key: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            api_location: api_location.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            transport,
            id_to_address: HashMap::new(),
        }
    }

    pub fn api_location(&self) -> &str {
        &self.api_location
    }

    /// Folder → Decentlab ID → address, as learned so far.
    pub fn id_to_address_mapping(&self) -> &HashMap<String, HashMap<u32, String>> {
        &self.id_to_address
    }

    /// Folder → address → Decentlab ID, the inverse of [`Self::id_to_address_mapping`].
    pub fn address_to_id_mapping(&self) -> HashMap<String, HashMap<String, u32>> {
        self.id_to_address
            .iter()
            .map(|(folder, ids)| {
                let inverse = ids
                    .iter()
                    .map(|(id, address)| (address.clone(), *id))
                    .collect();
                (folder.clone(), inverse)
            })
            .collect()
    }

    fn url(&self, path: &str, params: &[(&'static str, String)]) -> String {
        let mut url = format!("{}/{}?&auth={}", self.api_location, path, self.api_key);
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(value);
        }
        url
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &str, params: &Params) -> Result<ApiResponse<T>> {
        debug!(path, "GET");
        let body = self.transport.get(&self.url(path, params)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &Params,
        max_pages: Option<usize>,
    ) -> Result<Vec<T>> {
        let mut bodies = Vec::new();
        let mut retrieve_after: Option<String> = None;

        while max_pages.is_none_or(|max| bodies.len() < max) {
            let mut page_params = params.clone();
            if let Some(id) = retrieve_after.take() {
                page_params.push(("retrieve_after", id));
            }

            let page: ApiResponse<Value> = self.get_one(path, &page_params).await?;
            bodies.push(page.body);

            match page.retrieve_after_id {
                Some(id) => retrieve_after = Some(id),
                None => break,
            }
        }

        if bodies.len() > 1 && bodies.iter().any(|b| !b.is_array()) {
            return Err(ApiError::PaginationNotArray);
        }

        let mut items = Vec::new();
        for body in bodies {
            let Value::Array(values) = body else {
                return Err(ApiError::UnexpectedBody("an array"));
            };
            for value in values {
                items.push(serde_json::from_value(value)?);
            }
        }

        debug!(path, items = items.len(), "fetched all pages");

        Ok(items)
    }

    async fn get_streamed<T: DeserializeOwned>(&self, path: &str, params: &Params) -> Result<Vec<T>> {
        debug!(path, "GET (stream)");
        let lines = self.transport.get_lines(&self.url(path, params)).await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let value: Value = serde_json::from_str(&line)?;
            if let Some(message) = value.get("error").and_then(Value::as_str) {
                return Err(ApiError::Stream(message.to_string()));
            }
            items.push(serde_json::from_value(value)?);
        }

        Ok(items)
    }

    pub async fn get_folders(&self) -> Result<Vec<Folder>> {
        self.get_paginated("tags", &Vec::new(), None).await
    }

    pub async fn get_folder_slugs(&self) -> Result<Vec<String>> {
        let folders = self.get_folders().await?;
        Ok(folders.into_iter().map(|f| f.slug).collect())
    }

    pub async fn get_devices(&self, folder: &str) -> Result<Vec<Device>> {
        self.get_paginated(&format!("tags/{folder}/devices"), &Vec::new(), None)
            .await
    }

    pub async fn get_device_addresses(&self, folder: &str) -> Result<Vec<String>> {
        let devices = self.get_devices(folder).await?;
        Ok(devices.into_iter().map(|d| d.name).collect())
    }

    pub async fn get_device(&self, address: &str) -> Result<Device> {
        let path = format!("devices/{}", address.to_lowercase());
        let response: ApiResponse<Device> = self.get_one(&path, &Vec::new()).await?;
        Ok(response.body)
    }

    pub async fn get_readings(&self, device_name: &str, query: &ReadingsQuery) -> Result<Vec<Reading>> {
        let path = format!("devices/by-name/{device_name}/readings");
        let params = query.params();

        if query.stream {
            self.get_streamed(&format!("{path}/stream"), &params).await
        } else {
            self.get_paginated(&path, &params, query.max_pages).await
        }
    }

    /// Readings as a table indexed by `measured_at`, one column per data key.
    pub async fn get_readings_table(&self, device_name: &str, query: &ReadingsQuery) -> Result<Table> {
        let readings = self.get_readings(device_name, query).await?;
        if readings.is_empty() {
            info!("no data for '{device_name}'");
            return Ok(Table::new("measured_at"));
        }

        Ok(Table::from_readings(&readings))
    }

    pub async fn get_packets(&self, source: &PacketSource, query: &PacketsQuery) -> Result<Vec<Packet>> {
        let path = source.path();
        let params = query.params();

        if query.stream {
            self.get_streamed(&format!("{path}/stream"), &params).await
        } else {
            self.get_paginated(&path, &params, query.max_pages).await
        }
    }

    /// Resolves the Decentlab ID of `address`.
    ///
    /// Results are cached under `folder`, or under the device's first folder
    /// when none is given.
    pub async fn decentlab_id_from_address(&mut self, address: &str, folder: Option<&str>) -> Result<u32> {
        if let Some(id) = folder.and_then(|f| self.cached_id(f, address)) {
            return Ok(id);
        }

        let device = self.get_device(address).await?;
        let id = device
            .decentlab_id()
            .ok_or_else(|| ApiError::NotDecentlab(device.name.clone()))?;

        let folder = match folder {
            Some(f) => f.to_string(),
            None => device
                .tags
                .first()
                .map(|t| t.slug.clone())
                .ok_or_else(|| ApiError::NoFolder(device.name.clone()))?,
        };

        self.id_to_address
            .entry(folder)
            .or_default()
            .insert(id, device.name);

        Ok(id)
    }

    /// Finds the address of the station reporting `decentlab_id` in `folder`.
    ///
    /// Every device visited on the way is cached, so resolving the other
    /// stations of the folder afterwards is mostly free.
    pub async fn address_from_decentlab_id(&mut self, decentlab_id: u32, folder: &str) -> Result<String> {
        if let Some(address) = self
            .id_to_address
            .get(folder)
            .and_then(|ids| ids.get(&decentlab_id))
        {
            return Ok(address.clone());
        }

        let addresses = self.get_device_addresses(folder).await?;
        let query = ReadingsQuery {
            limit: 1,
            max_pages: Some(1),
            ..Default::default()
        };

        for address in addresses {
            let readings = self.get_readings(&address, &query).await?;
            let Some(station_id) = readings.first().and_then(Reading::decentlab_id) else {
                debug!(address, "device has no readings carrying a device_id");
                continue;
            };

            self.id_to_address
                .entry(folder.to_string())
                .or_default()
                .insert(station_id, address.clone());

            if station_id == decentlab_id {
                return Ok(address);
            }
        }

        Err(ApiError::StationNotFound(decentlab_id))
    }

    fn cached_id(&self, folder: &str, address: &str) -> Option<u32> {
        self.id_to_address
            .get(folder)?
            .iter()
            .find(|(_, a)| a.as_str() == address)
            .map(|(id, _)| *id)
    }
}

impl fmt::Debug for ElementApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementApi")
            .field("api_location", &self.api_location)
            .field("api_key", &mask(&self.api_key))
            .finish()
    }
}

impl PartialEq for ElementApi {
    fn eq(&self, other: &Self) -> bool {
        self.api_location == other.api_location && self.api_key == other.api_key
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let visible = chars.len().min(3);
    let hidden = chars.len() - visible;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "*".repeat(hidden), tail)
}
