use nas_core::{BitBuffer, DecodeError, EncodeError};


/// TS 24.008 10.5.3.8 Time zone: offset from UTC in quarter hours, swapped BCD with a
/// sign bit in bit 4 of the first semi-octet.
/// Length: 1 octet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZone {
    /// Signed offset in units of 15 minutes
    pub quarter_hours: i8,
}

impl TimeZone {
    pub const UTC: TimeZone = TimeZone { quarter_hours: 0 };

    fn from_octet(octet: u8) -> Result<Self, DecodeError> {
        let tens = octet & 0x07;
        let units = octet >> 4;
        if units > 9 {
            return Err(DecodeError::InvalidValue { field: "time_zone", value: octet as u64 });
        }
        let magnitude = (tens * 10 + units) as i8;
        let quarter_hours = if octet & 0x08 != 0 { -magnitude } else { magnitude };
        Ok(TimeZone { quarter_hours })
    }

    fn to_octet(&self) -> Result<u8, EncodeError> {
        let magnitude = self.quarter_hours.unsigned_abs();
        if magnitude > 79 {
            return Err(EncodeError::ValueOutOfRange { field: "time_zone", value: magnitude as u64 });
        }
        let sign = if self.quarter_hours < 0 { 0x08 } else { 0 };
        Ok(((magnitude % 10) << 4) | sign | (magnitude / 10))
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_octet(buffer.read_u8_field("time_zone")?)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        buffer.write_u8(self.to_octet()?);
        Ok(())
    }
}

fn read_swapped_bcd(buffer: &mut BitBuffer, field: &'static str) -> Result<u8, DecodeError> {
    let octet = buffer.read_u8_field(field)?;
    let (lo, hi) = (octet & 0x0F, octet >> 4);
    if lo > 9 || hi > 9 {
        return Err(DecodeError::InvalidValue { field, value: octet as u64 });
    }
    Ok(lo * 10 + hi)
}

fn write_swapped_bcd(buffer: &mut BitBuffer, value: u8, field: &'static str) -> Result<(), EncodeError> {
    if value > 99 {
        return Err(EncodeError::ValueOutOfRange { field, value: value as u64 });
    }
    buffer.write_u8(((value % 10) << 4) | (value / 10));
    Ok(())
}

/// TS 24.008 10.5.3.9 Time zone and time. Year is stored as a full year from 2000.
/// Length: 7 octets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZoneAndTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub tz: TimeZone,
}

impl TimeZoneAndTime {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let year = 2000 + read_swapped_bcd(buffer, "year")? as u16;
        let month = read_swapped_bcd(buffer, "month")?;
        let day = read_swapped_bcd(buffer, "day")?;
        let hour = read_swapped_bcd(buffer, "hour")?;
        let minute = read_swapped_bcd(buffer, "minute")?;
        let second = read_swapped_bcd(buffer, "second")?;
        let tz = TimeZone::from_bitbuf(buffer)?;
        Ok(TimeZoneAndTime { year, month, day, hour, minute, second, tz })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        if !(2000..=2099).contains(&self.year) {
            return Err(EncodeError::ValueOutOfRange { field: "year", value: self.year as u64 });
        }
        write_swapped_bcd(buffer, (self.year - 2000) as u8, "year")?;
        write_swapped_bcd(buffer, self.month, "month")?;
        write_swapped_bcd(buffer, self.day, "day")?;
        write_swapped_bcd(buffer, self.hour, "hour")?;
        write_swapped_bcd(buffer, self.minute, "minute")?;
        write_swapped_bcd(buffer, self.second, "second")?;
        self.tz.to_bitbuf(buffer)
    }
}

wire_enum! {
    /// TS 24.008 10.5.3.12 Daylight saving time
    /// Bits: 2, preceded by 6 spare bits
    pub enum DaylightSavingTime {
        NoAdjustment = 0,
        PlusOneHour = 1,
        PlusTwoHours = 2,
    }
}

impl DaylightSavingTime {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        buffer.read_field(6, "spare")?;
        Self::from_raw(buffer.read_field(2, "daylight_saving_time")?, "daylight_saving_time")
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        buffer.write_bits(0, 6);
        buffer.write_bits(self.into_raw(), 2);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_zone_sign() {
        // -5h = -20 quarter hours: tens 2 with sign bit, units 0
        let tz = TimeZone { quarter_hours: -20 };
        assert_eq!(tz.to_octet().unwrap(), 0x0A);
        assert_eq!(TimeZone::from_octet(0x0A).unwrap(), tz);
        assert_eq!(TimeZone::from_octet(0x80).unwrap().quarter_hours, 8);
    }

    #[test]
    fn test_universal_time() {
        let t = TimeZoneAndTime { year: 2026, month: 10, day: 18, hour: 13, minute: 5, second: 59, tz: TimeZone::UTC };
        let mut buf = BitBuffer::new_autoexpand(56);
        t.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x62, 0x01, 0x81, 0x31, 0x50, 0x95, 0x00]);
        buf.seek(0);
        assert_eq!(TimeZoneAndTime::from_bitbuf(&mut buf).unwrap(), t);
    }

    #[test]
    fn test_daylight_saving() {
        let mut buf = BitBuffer::from_bytes(&[0x03]);
        assert!(matches!(DaylightSavingTime::from_bitbuf(&mut buf), Err(DecodeError::InvalidEnumValue { .. })));
    }
}
