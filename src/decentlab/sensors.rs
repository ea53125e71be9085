//! Sensor group tables for the supported Decentlab devices.
//!
//! Every table lists the groups in flag-bit order. A group consumes
//! `length` 16-bit words from the payload and yields one or more values.
//!
//! Ref: https://www.decentlab.com/support (per-product decoder sources)

pub(crate) struct Sensor {
    pub length: usize,
    pub values: &'static [SensorValue],
}

pub(crate) struct SensorValue {
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub convert: fn(&[u16]) -> f64,
}

const BATTERY: Sensor = Sensor {
    length: 1,
    values: &[SensorValue {
        name: "Battery voltage",
        unit: Some("V"),
        convert: battery_voltage,
    }],
};

fn battery_voltage(x: &[u16]) -> f64 {
    f64::from(x[0]) / 1000.0
}

// DL-SHT35

pub(crate) const SHT35: &[Sensor] = &[
    Sensor {
        length: 2,
        values: &[
            SensorValue {
                name: "Air temperature",
                unit: Some("°C"),
                convert: sht35_temperature,
            },
            SensorValue {
                name: "Air humidity",
                unit: Some("%"),
                convert: sht35_humidity,
            },
        ],
    },
    BATTERY,
];

fn sht35_temperature(x: &[u16]) -> f64 {
    175.0 * f64::from(x[0]) / 65535.0 - 45.0
}

fn sht35_humidity(x: &[u16]) -> f64 {
    100.0 * f64::from(x[1]) / 65535.0
}

// DL-BLG

pub(crate) const BLG: &[Sensor] = &[
    Sensor {
        length: 2,
        values: &[
            SensorValue {
                name: "Voltage ratio",
                unit: None,
                convert: blg_voltage_ratio,
            },
            SensorValue {
                name: "Thermistor resistance",
                unit: Some("Ω"),
                convert: blg_resistance,
            },
            SensorValue {
                name: "Temperature",
                unit: Some("°C"),
                convert: blg_temperature,
            },
        ],
    },
    BATTERY,
];

// Steinhart-Hart coefficients of the black-globe thermistor.
const BLG_A: f64 = 0.0008271111;
const BLG_B: f64 = 0.000208802;
const BLG_C: f64 = 0.000000080592;

fn blg_voltage_ratio(x: &[u16]) -> f64 {
    let raw = f64::from(x[0]) + f64::from(x[1]) * 65536.0;
    (raw / 8388608.0 - 1.0) / 2.0
}

fn blg_resistance(x: &[u16]) -> f64 {
    1000.0 / blg_voltage_ratio(x) - 41000.0
}

fn blg_temperature(x: &[u16]) -> f64 {
    let ln_r = blg_resistance(x).ln();
    1.0 / (BLG_A + BLG_B * ln_r + BLG_C * ln_r.powi(3)) - 273.15
}

// DL-ATM41, all words are offset by 0x8000

pub(crate) const ATM41: &[Sensor] = &[
    Sensor {
        length: 17,
        values: &[
            SensorValue {
                name: "Solar radiation",
                unit: Some("W⋅m⁻²"),
                convert: |x| atm41(x, 0, 1.0),
            },
            SensorValue {
                name: "Precipitation",
                unit: Some("mm"),
                convert: |x| atm41(x, 1, 1000.0),
            },
            SensorValue {
                name: "Lightning strike count",
                unit: None,
                convert: |x| atm41(x, 2, 1.0),
            },
            SensorValue {
                name: "Lightning average distance",
                unit: Some("km"),
                convert: |x| atm41(x, 3, 1.0),
            },
            SensorValue {
                name: "Wind speed",
                unit: Some("m⋅s⁻¹"),
                convert: |x| atm41(x, 4, 100.0),
            },
            SensorValue {
                name: "Wind direction",
                unit: Some("°"),
                convert: |x| atm41(x, 5, 10.0),
            },
            SensorValue {
                name: "Maximum wind speed",
                unit: Some("m⋅s⁻¹"),
                convert: |x| atm41(x, 6, 100.0),
            },
            SensorValue {
                name: "Air temperature",
                unit: Some("°C"),
                convert: |x| atm41(x, 7, 10.0),
            },
            SensorValue {
                name: "Vapor pressure",
                unit: Some("kPa"),
                convert: |x| atm41(x, 8, 100.0),
            },
            SensorValue {
                name: "Atmospheric pressure",
                unit: Some("kPa"),
                convert: |x| atm41(x, 9, 100.0),
            },
            SensorValue {
                name: "Relative humidity",
                unit: Some("%"),
                convert: |x| atm41(x, 10, 10.0),
            },
            SensorValue {
                name: "Sensor temperature (internal)",
                unit: Some("°C"),
                convert: |x| atm41(x, 11, 10.0),
            },
            SensorValue {
                name: "X orientation angle",
                unit: Some("°"),
                convert: |x| atm41(x, 12, 10.0),
            },
            SensorValue {
                name: "Y orientation angle",
                unit: Some("°"),
                convert: |x| atm41(x, 13, 10.0),
            },
            SensorValue {
                name: "Compass heading",
                unit: Some("°"),
                convert: |x| atm41(x, 14, 1.0),
            },
            SensorValue {
                name: "North wind speed",
                unit: Some("m⋅s⁻¹"),
                convert: |x| atm41(x, 15, 100.0),
            },
            SensorValue {
                name: "East wind speed",
                unit: Some("m⋅s⁻¹"),
                convert: |x| atm41(x, 16, 100.0),
            },
        ],
    },
    BATTERY,
];

fn atm41(x: &[u16], index: usize, divisor: f64) -> f64 {
    (f64::from(x[index]) - 32768.0) / divisor
}
