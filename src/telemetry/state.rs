//! # Tello State Packets
//!
//! The Tello broadcasts its state roughly ten times a second as a single
//! ASCII datagram of `key:value;` pairs:
//!
//! ```text
//! pitch:0;roll:0;yaw:0;vgx:0;vgy:0;vgz:0;templ:60;temph:63;tof:10;h:0;bat:87;baro:152.61;time:0;agx:-1.00;agy:0.00;agz:-999.00;
//! ```

use serde::Serialize;

use crate::error::{Result, TelloPadError};

/// Decoded drone state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelloState {
    /// Attitude in degrees.
    pub pitch: i32,
    pub roll: i32,
    pub yaw: i32,
    /// Speeds in dm/s.
    pub vgx: i32,
    pub vgy: i32,
    pub vgz: i32,
    /// Lowest and highest board temperature in °C.
    pub templ: i32,
    pub temph: i32,
    /// Time-of-flight distance in cm.
    pub tof: i32,
    /// Height above takeoff point in cm.
    pub h: i32,
    /// Battery percentage. `None` unless the datagram carried a readable value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bat: Option<i32>,
    /// Barometer altitude in cm.
    pub baro: f32,
    /// Motor-on time in seconds.
    pub time: i32,
    /// Accelerations in 0.001 g.
    pub agx: f32,
    pub agy: f32,
    pub agz: f32,
}

impl TelloState {
    /// Parses a state datagram.
    ///
    /// Unknown keys and unparsable values are skipped, so newer firmware
    /// fields do not break decoding.
    ///
    /// # Errors
    ///
    /// Returns `Telemetry` if no known field could be read.
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_pad::telemetry::state::TelloState;
    ///
    /// let state = TelloState::parse("pitch:1;roll:-2;bat:87;baro:152.61;\r\n")?;
    /// assert_eq!(state.bat, Some(87));
    /// assert_eq!(state.roll, -2);
    /// # Ok::<(), tello_pad::error::TelloPadError>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut state = TelloState::default();
        let mut fields = 0usize;

        for pair in text.trim().split(';') {
            let Some((key, value)) = pair.split_once(':') else {
                continue;
            };
            let value = value.trim();

            let known = match key.trim() {
                "pitch" => set_int(&mut state.pitch, value),
                "roll" => set_int(&mut state.roll, value),
                "yaw" => set_int(&mut state.yaw, value),
                "vgx" => set_int(&mut state.vgx, value),
                "vgy" => set_int(&mut state.vgy, value),
                "vgz" => set_int(&mut state.vgz, value),
                "templ" => set_int(&mut state.templ, value),
                "temph" => set_int(&mut state.temph, value),
                "tof" => set_int(&mut state.tof, value),
                "h" => set_int(&mut state.h, value),
                "bat" => set_opt_int(&mut state.bat, value),
                "time" => set_int(&mut state.time, value),
                "baro" => set_float(&mut state.baro, value),
                "agx" => set_float(&mut state.agx, value),
                "agy" => set_float(&mut state.agy, value),
                "agz" => set_float(&mut state.agz, value),
                _ => false,
            };

            if known {
                fields += 1;
            }
        }

        if fields == 0 {
            return Err(TelloPadError::Telemetry(format!(
                "no state fields in datagram: {:?}",
                text.trim()
            )));
        }

        Ok(state)
    }
}

fn set_int(slot: &mut i32, value: &str) -> bool {
    match value.parse() {
        Ok(v) => {
            *slot = v;
            true
        }
        Err(_) => false,
    }
}

fn set_opt_int(slot: &mut Option<i32>, value: &str) -> bool {
    match value.parse() {
        Ok(v) => {
            *slot = Some(v);
            true
        }
        Err(_) => false,
    }
}

fn set_float(slot: &mut f32, value: &str) -> bool {
    match value.parse() {
        Ok(v) => {
            *slot = v;
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "pitch:0;roll:0;yaw:-45;vgx:0;vgy:0;vgz:0;templ:60;temph:63;tof:10;h:0;bat:87;baro:152.61;time:0;agx:-1.00;agy:0.00;agz:-999.00;\r\n";

    #[test]
    fn test_parse_full_sample() {
        let state = TelloState::parse(SAMPLE).unwrap();
        assert_eq!(state.yaw, -45);
        assert_eq!(state.templ, 60);
        assert_eq!(state.temph, 63);
        assert_eq!(state.tof, 10);
        assert_eq!(state.bat, Some(87));
        assert!((state.baro - 152.61).abs() < 0.001);
        assert!((state.agz + 999.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_skips_unknown_keys() {
        let state = TelloState::parse("mid:-1;x:0;y:0;z:0;mpry:0,0,0;bat:55;").unwrap();
        assert_eq!(state.bat, Some(55));
    }

    #[test]
    fn test_parse_skips_garbled_values() {
        let state = TelloState::parse("bat:abc;h:30;").unwrap();
        assert_eq!(state.bat, None);
        assert_eq!(state.h, 30);
    }

    #[test]
    fn test_missing_battery_is_none() {
        let state = TelloState::parse("h:30;tof:12;").unwrap();
        assert_eq!(state.bat, None);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(TelloState::parse("").is_err());
        assert!(TelloState::parse("ok").is_err());
        assert!(TelloState::parse("foo:1;bar:2;").is_err());
    }

    #[test]
    fn test_serializes_to_json() {
        let state = TelloState::parse("bat:42;").unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["bat"], 42);
    }

    #[test]
    fn test_unread_battery_not_serialized() {
        let state = TelloState::parse("h:30;").unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("bat").is_none());
        assert_eq!(json["h"], 30);
    }
}
