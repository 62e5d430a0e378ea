//! Fixed-point temperature compensation, integer only.
//!
//! Division truncates toward zero like the datasheet's reference code. The
//! intermediates are widened to 64 bit: `(raw/8 - 2*T1) * T2` and
//! `(raw/16 - T1)^2` both leave the `i32` range for extreme but legal inputs.

use super::bmp280_calib::Calibration;

// -- raw readings are 20 bit wide
pub const BMP280_RAW_MAX: u32 = (1 << 20) - 1;

const BMP280_12_BIT_SHIFT: u8 = 12;
const BMP280_4_BIT_SHIFT: u8 = 4;

/// Assembles the 20-bit raw reading from the temp_msb/lsb/xlsb registers.
pub fn raw_from_bytes(msb: u8, lsb: u8, xlsb: u8) -> u32 {
    let data_msb = (msb as u32) << BMP280_12_BIT_SHIFT;
    let data_lsb = (lsb as u32) << BMP280_4_BIT_SHIFT;
    let data_xlsb = (xlsb as u32) >> BMP280_4_BIT_SHIFT;
    data_msb | data_lsb | data_xlsb
}

/// Fine temperature `var1 + var2`.
pub fn t_fine(raw: u32, calib: &Calibration) -> i64 {
    let raw = (raw & BMP280_RAW_MAX) as i64;
    let dig_t1 = calib.dig_t1 as i64;
    let dig_t2 = calib.dig_t2 as i64;
    let dig_t3 = calib.dig_t3 as i64;

    let var1 = ((raw / 8) - (dig_t1 * 2)) * dig_t2 / 2048;
    let var2a = (raw / 16) - dig_t1;
    let var2 = ((var2a * var2a) / 4096) * dig_t3 / 16384;
    var1 + var2
}

/// Compensated temperature in hundredths of a degree Celsius.
pub fn compensate(raw: u32, calib: &Calibration) -> i32 {
    // -- |t_fine| stays below 2^23 over the whole input domain
    (t_fine(raw, calib) * 100 / 5120) as i32
}

/// Formats hundredths of a degree as `"<integer>.<two digits>\n"`.
pub fn format_centi_celsius(centi_celsius: i32) -> String {
    let sign = if centi_celsius < 0 { "-" } else { "" };
    let abs = centi_celsius.unsigned_abs();
    format!("{sign}{}.{:02}\n", abs / 100, abs % 100)
}
