use crate::decentlab::sensors::{ATM41, BLG, SHT35, Sensor};
use crate::decentlab::{
    DEVICE_ID, DecodeError, FieldValue, Measurement, PROTOCOL_VERSION, Result, SensorFamily,
};

pub const DEFAULT_PROTOCOL_VERSION: u8 = 2;

// version (1) + device id (2) + flags (2)
const HEADER_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Protocol version the header must carry.
    pub protocol_version: u8,

    /// Decimal places each quantity is rounded to. `None` keeps full precision.
    pub precision: Option<u32>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            precision: None,
        }
    }
}

/// Decodes a Decentlab uplink payload.
///
/// With `hex` set, `payload` is ASCII hex text (as delivered by the Element
/// API) rather than raw bytes.
pub fn decode(
    family: SensorFamily,
    payload: &[u8],
    hex: bool,
    options: &DecodeOptions,
) -> Result<Measurement> {
    let sensors = match family {
        SensorFamily::Sht35 => SHT35,
        SensorFamily::Blg => BLG,
        SensorFamily::Atm41 => ATM41,
    };

    if hex {
        let bytes = hex::decode(payload)?;
        decode_bytes(sensors, &bytes, options)
    } else {
        decode_bytes(sensors, payload, options)
    }
}

pub fn decode_sht35(payload: &[u8], hex: bool, options: &DecodeOptions) -> Result<Measurement> {
    decode(SensorFamily::Sht35, payload, hex, options)
}

pub fn decode_blg(payload: &[u8], hex: bool, options: &DecodeOptions) -> Result<Measurement> {
    decode(SensorFamily::Blg, payload, hex, options)
}

pub fn decode_atm41(payload: &[u8], hex: bool, options: &DecodeOptions) -> Result<Measurement> {
    decode(SensorFamily::Atm41, payload, hex, options)
}

fn decode_bytes(sensors: &[Sensor], bytes: &[u8], options: &DecodeOptions) -> Result<Measurement> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::TooShort {
            expected: HEADER_LEN,
            actual: bytes.len(),
        });
    }

    let version = bytes[0];
    if version != options.protocol_version {
        return Err(DecodeError::ProtocolVersion {
            expected: options.protocol_version,
            actual: version,
        });
    }

    let device_id = u16::from_be_bytes([bytes[1], bytes[2]]);
    let flags = u16::from_be_bytes([bytes[3], bytes[4]]);

    let data = &bytes[HEADER_LEN..];
    if data.len() % 2 != 0 {
        return Err(DecodeError::OddLength(data.len()));
    }
    let words: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();

    // Flag bits past the end of the table carry no sensor.
    let present: Vec<&Sensor> = sensors
        .iter()
        .enumerate()
        .filter(|(i, _)| flags & (1 << i) != 0)
        .map(|(_, s)| s)
        .collect();

    let expected: usize = present.iter().map(|s| s.length).sum();
    if words.len() < expected {
        return Err(DecodeError::InsufficientData {
            expected,
            actual: words.len(),
        });
    }
    if words.len() > expected {
        return Err(DecodeError::TrailingData {
            expected,
            actual: words.len(),
        });
    }

    let mut measurement = Measurement::new();
    measurement.insert(DEVICE_ID, FieldValue::Scalar(i64::from(device_id)));
    measurement.insert(PROTOCOL_VERSION, FieldValue::Scalar(i64::from(version)));

    let mut cursor = 0;
    for sensor in present {
        let x = &words[cursor..cursor + sensor.length];
        cursor += sensor.length;

        for value in sensor.values {
            let v = (value.convert)(x);
            if !v.is_finite() {
                return Err(DecodeError::OutOfRange { name: value.name });
            }
            measurement.insert(
                value.name,
                FieldValue::Quantity {
                    value: round(v, options.precision),
                    unit: value.unit,
                },
            );
        }
    }

    Ok(measurement)
}

/// Beyond this many decimal places an `f64` has nothing left to round.
const MAX_PRECISION: u32 = 15;

fn round(value: f64, precision: Option<u32>) -> f64 {
    let Some(p) = precision.filter(|&p| p <= MAX_PRECISION) else {
        return value;
    };
    let Ok(exp) = i32::try_from(p) else {
        return value;
    };

    let factor = 10f64.powi(exp);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}
