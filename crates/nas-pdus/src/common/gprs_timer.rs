use std::time::Duration;

use nas_core::{BitBuffer, DecodeError, EncodeError};
use nas_core::codec_error::check_range;


wire_enum_open! {
    /// TS 24.008 10.5.7.3 GPRS timer unit. Values 3..6 are read as minutes by receivers.
    /// Bits: 3
    pub enum GprsTimerUnit {
        TwoSeconds = 0,
        Minutes = 1,
        Decihours = 2,
        Deactivated = 7,
    }
}

/// TS 24.008 10.5.7.3 GPRS timer, also the value part of GPRS timer 2 (10.5.7.4).
/// Length: 1 octet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GprsTimer {
    pub unit: GprsTimerUnit,
    /// 5 bits
    pub value: u8,
}

/// GPRS timer 2 shares the value encoding of GPRS timer and is carried as TLV
pub type GprsTimer2 = GprsTimer;

impl GprsTimer {
    pub const DEACTIVATED: GprsTimer = GprsTimer { unit: GprsTimerUnit::Deactivated, value: 0 };

    /// Above 31 minutes the value moves to decihours, rounded up and capped at 31 units
    pub fn minutes(value: u8) -> Self {
        if value <= 31 {
            GprsTimer { unit: GprsTimerUnit::Minutes, value }
        } else {
            GprsTimer { unit: GprsTimerUnit::Decihours, value: value.div_ceil(6).min(31) }
        }
    }

    pub fn seconds(value: u8) -> Self {
        // Two second granularity
        GprsTimer { unit: GprsTimerUnit::TwoSeconds, value: value / 2 }
    }

    /// None when the timer is deactivated
    pub fn as_duration(&self) -> Option<Duration> {
        let v = self.value as u64;
        match self.unit {
            GprsTimerUnit::TwoSeconds => Some(Duration::from_secs(2 * v)),
            GprsTimerUnit::Decihours => Some(Duration::from_secs(360 * v)),
            GprsTimerUnit::Deactivated => None,
            GprsTimerUnit::Minutes | GprsTimerUnit::Reserved(_) => Some(Duration::from_secs(60 * v)),
        }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let unit = GprsTimerUnit::from(buffer.read_field(3, "gprs_timer_unit")? as u8);
        let value = buffer.read_field(5, "gprs_timer_value")? as u8;
        Ok(GprsTimer { unit, value })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        check_range(self.unit.into_raw() as u64, 3, "gprs_timer_unit")?;
        check_range(self.value as u64, 5, "gprs_timer_value")?;
        buffer.write_bits(self.unit.into_raw() as u64, 3);
        buffer.write_bits(self.value as u64, 5);
        Ok(())
    }
}

wire_enum! {
    /// TS 24.008 10.5.7.4a GPRS timer 3 unit
    /// Bits: 3
    pub enum GprsTimer3Unit {
        TenMinutes = 0,
        OneHour = 1,
        TenHours = 2,
        TwoSeconds = 3,
        ThirtySeconds = 4,
        OneMinute = 5,
        ThreeHundredTwentyHours = 6,
        Deactivated = 7,
    }
}

/// TS 24.008 10.5.7.4a GPRS timer 3, value part.
/// Length: 1 octet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GprsTimer3 {
    pub unit: GprsTimer3Unit,
    /// 5 bits
    pub value: u8,
}

impl GprsTimer3 {
    pub fn as_duration(&self) -> Option<Duration> {
        let v = self.value as u64;
        let secs = match self.unit {
            GprsTimer3Unit::TenMinutes => 600 * v,
            GprsTimer3Unit::OneHour => 3600 * v,
            GprsTimer3Unit::TenHours => 36000 * v,
            GprsTimer3Unit::TwoSeconds => 2 * v,
            GprsTimer3Unit::ThirtySeconds => 30 * v,
            GprsTimer3Unit::OneMinute => 60 * v,
            GprsTimer3Unit::ThreeHundredTwentyHours => 320 * 3600 * v,
            GprsTimer3Unit::Deactivated => return None,
        };
        Some(Duration::from_secs(secs))
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        // Every 3-bit value is defined
        let unit = GprsTimer3Unit::from_raw(buffer.read_field(3, "gprs_timer3_unit")?, "gprs_timer3_unit")?;
        let value = buffer.read_field(5, "gprs_timer3_value")? as u8;
        Ok(GprsTimer3 { unit, value })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        check_range(self.value as u64, 5, "gprs_timer3_value")?;
        buffer.write_bits(self.unit.into_raw(), 3);
        buffer.write_bits(self.value as u64, 5);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gprs_timer_units() {
        let mut buf = BitBuffer::from_bytes(&[0x3E]);
        let t = GprsTimer::from_bitbuf(&mut buf).unwrap();
        assert_eq!(t, GprsTimer::minutes(30));
        assert_eq!(t.as_duration(), Some(Duration::from_secs(1800)));

        let mut buf = BitBuffer::from_bytes(&[0xE0]);
        let t = GprsTimer::from_bitbuf(&mut buf).unwrap();
        assert_eq!(t, GprsTimer::DEACTIVATED);
        assert_eq!(t.as_duration(), None);

        // Unit 5 is reserved but still decodes, read as minutes
        let mut buf = BitBuffer::from_bytes(&[0xA2]);
        let t = GprsTimer::from_bitbuf(&mut buf).unwrap();
        assert_eq!(t.unit, GprsTimerUnit::Reserved(5));
        assert_eq!(t.as_duration(), Some(Duration::from_secs(120)));
        let mut out = BitBuffer::new_autoexpand(8);
        t.to_bitbuf(&mut out).unwrap();
        assert_eq!(out.to_bytes(), vec![0xA2]);
    }

    #[test]
    fn test_gprs_timer_long_minutes() {
        assert_eq!(GprsTimer::minutes(31), GprsTimer { unit: GprsTimerUnit::Minutes, value: 31 });
        let t = GprsTimer::minutes(54);
        assert_eq!(t, GprsTimer { unit: GprsTimerUnit::Decihours, value: 9 });
        assert_eq!(t.as_duration(), Some(Duration::from_secs(54 * 60)));
        assert_eq!(GprsTimer::minutes(40).as_duration(), Some(Duration::from_secs(42 * 60)));
        assert_eq!(GprsTimer::minutes(255).value, 31);

        let mut out = BitBuffer::new_autoexpand(8);
        t.to_bitbuf(&mut out).unwrap();
        assert_eq!(out.to_bytes(), vec![0x49]);
    }

    #[test]
    fn test_gprs_timer_value_range() {
        let mut out = BitBuffer::new_autoexpand(8);
        assert!(GprsTimer { unit: GprsTimerUnit::Minutes, value: 32 }.to_bitbuf(&mut out).is_err());
        assert!(GprsTimer { unit: GprsTimerUnit::Reserved(9), value: 1 }.to_bitbuf(&mut out).is_err());
    }

    #[test]
    fn test_gprs_timer3() {
        let mut buf = BitBuffer::from_bytes(&[0xC1]);
        let t = GprsTimer3::from_bitbuf(&mut buf).unwrap();
        assert_eq!(t.unit, GprsTimer3Unit::ThreeHundredTwentyHours);
        assert_eq!(t.as_duration(), Some(Duration::from_secs(320 * 3600)));
    }
}
