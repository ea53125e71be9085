use chrono::{DateTime, SecondsFormat, Utc};

use crate::element::PacketType;

pub const DEFAULT_LIMIT: u32 = 100;

pub(crate) type Params = Vec<(&'static str, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingsSort {
    #[default]
    MeasuredAt,
    InsertedAt,
}

impl ReadingsSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingsSort::MeasuredAt => "measured_at",
            ReadingsSort::InsertedAt => "inserted_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadingsQuery {
    pub sort: ReadingsSort,
    pub sort_direction: SortDirection,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,

    /// Page size. Ignored by the streaming endpoint.
    pub limit: u32,

    /// Stop after this many pages. `None` follows pagination to the end,
    /// `Some(0)` fetches nothing.
    pub max_pages: Option<usize>,

    /// Use the newline-delimited `/stream` endpoint instead of pagination.
    pub stream: bool,

    /// Server-side database timeout in milliseconds.
    pub timeout: Option<u32>,
}

impl Default for ReadingsQuery {
    fn default() -> Self {
        Self {
            sort: ReadingsSort::default(),
            sort_direction: SortDirection::default(),
            start: None,
            end: None,
            limit: DEFAULT_LIMIT,
            max_pages: None,
            stream: false,
            timeout: None,
        }
    }
}

impl ReadingsQuery {
    pub(crate) fn params(&self) -> Params {
        let mut params = vec![
            ("sort", self.sort.as_str().to_string()),
            ("sort_direction", self.sort_direction.as_str().to_string()),
        ];
        if !self.stream {
            params.push(("limit", self.limit.to_string()));
        }
        push_range(&mut params, self.start, self.end, self.timeout);
        params
    }
}

/// Where packets are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketSource {
    Device(String),
    Folder(String),
}

impl PacketSource {
    pub(crate) fn path(&self) -> String {
        match self {
            PacketSource::Device(name) => format!("devices/by-name/{name}/packets"),
            PacketSource::Folder(slug) => format!("tags/{slug}/packets"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketsQuery {
    pub packet_type: Option<PacketType>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: u32,
    pub max_pages: Option<usize>,
    pub stream: bool,
    pub timeout: Option<u32>,
}

impl Default for PacketsQuery {
    fn default() -> Self {
        Self {
            packet_type: None,
            start: None,
            end: None,
            limit: DEFAULT_LIMIT,
            max_pages: None,
            stream: false,
            timeout: None,
        }
    }
}

impl PacketsQuery {
    pub(crate) fn params(&self) -> Params {
        let mut params = Vec::new();
        if !self.stream {
            params.push(("limit", self.limit.to_string()));
        }
        if let Some(packet_type) = self.packet_type {
            params.push(("packet_type", packet_type.as_str().to_string()));
        }
        push_range(&mut params, self.start, self.end, self.timeout);
        params
    }
}

fn push_range(
    params: &mut Params,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    timeout: Option<u32>,
) {
    if let Some(start) = start {
        params.push(("after", format_timestamp(start)));
    }
    if let Some(end) = end {
        params.push(("before", format_timestamp(end)));
    }
    if let Some(timeout) = timeout {
        params.push(("timeout", timeout.to_string()));
    }
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 13, h, m, 0).unwrap()
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(ts(13, 5)), "2024-08-13T13:05:00Z");
    }

    #[test]
    fn test_readings_params_order() {
        let query = ReadingsQuery {
            start: Some(ts(13, 5)),
            end: Some(ts(13, 15)),
            timeout: Some(250),
            ..Default::default()
        };
        let params = query.params();
        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec!["sort", "sort_direction", "limit", "after", "before", "timeout"]
        );
    }

    #[test]
    fn test_streamed_readings_omit_limit() {
        let query = ReadingsQuery {
            stream: true,
            ..Default::default()
        };
        assert!(query.params().iter().all(|(k, _)| *k != "limit"));
    }

    #[test]
    fn test_packets_params() {
        let query = PacketsQuery {
            packet_type: Some(PacketType::Up),
            start: Some(ts(13, 5)),
            ..Default::default()
        };
        assert_eq!(
            query.params(),
            vec![
                ("limit", "100".to_string()),
                ("packet_type", "up".to_string()),
                ("after", "2024-08-13T13:05:00Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_packet_source_path() {
        assert_eq!(
            PacketSource::Device("DEC0054A6".into()).path(),
            "devices/by-name/DEC0054A6/packets"
        );
        assert_eq!(
            PacketSource::Folder("stadt-dortmund-klimasensoren-aktiv-sht35".into()).path(),
            "tags/stadt-dortmund-klimasensoren-aktiv-sht35/packets"
        );
    }
}
