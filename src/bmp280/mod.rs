mod bmp280_calib;
mod bmp280_compensation;
mod bmp280_core;
mod bmp280_enums;
mod bmp280_errors;
mod bmp280_session;

pub use bmp280_calib::*;
pub use bmp280_compensation::*;
pub use bmp280_core::*;
pub use bmp280_enums::*;
pub use bmp280_errors::*;
pub use bmp280_session::*;
