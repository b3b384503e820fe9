use std::io::Cursor;

use chrono::NaiveDateTime;
use exif::{Exif, In, Rational, Reader, Tag, Value};

use crate::entities::photo::ExifData;

/// Best-effort EXIF extraction. Anything unreadable yields an empty record.
pub fn extract_exif(bytes: &[u8]) -> ExifData {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!(error = %e, "No readable EXIF block");
            return ExifData::default();
        }
    };

    ExifData {
        camera: camera(&exif),
        lens: ascii(&exif, Tag::LensModel),
        focal_length: rational(&exif, Tag::FocalLength).map(round_tenths),
        aperture: rational(&exif, Tag::FNumber).map(round_tenths),
        shutter_speed: first_rational(&exif, Tag::ExposureTime).map(shutter_speed),
        iso: uint(&exif, Tag::PhotographicSensitivity),
        date_time: ascii(&exif, Tag::DateTimeOriginal)
            .or_else(|| ascii(&exif, Tag::DateTime))
            .and_then(|raw| exif_datetime(&raw)),
        latitude: gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, 'S'),
        longitude: gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, 'W'),
    }
}

fn camera(exif: &Exif) -> Option<String> {
    let make = ascii(exif, Tag::Make);
    let model = ascii(exif, Tag::Model);

    match (make, model) {
        // Most bodies already repeat the make in the model string
        (Some(make), Some(model)) if model.starts_with(&make) => Some(model),
        (Some(make), Some(model)) => Some(format!("{make} {model}")),
        (make, model) => make.or(model),
    }
}

fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|p| String::from_utf8_lossy(p).trim().trim_end_matches('\0').to_string())
            .find(|s| !s.is_empty()),
        _ => None,
    }
}

fn uint(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

fn first_rational(exif: &Exif, tag: Tag) -> Option<Rational> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(values) => values.first().copied().filter(|r| r.denom != 0),
        _ => None,
    }
}

fn rational(exif: &Exif, tag: Tag) -> Option<f64> {
    first_rational(exif, tag).map(|r| r.to_f64())
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Exposure time as photographers write it: `1/250`, or seconds for long
/// exposures.
pub fn shutter_speed(r: Rational) -> String {
    if r.num == 0 {
        return "0".to_string();
    }
    let seconds = r.num as f64 / r.denom as f64;
    if seconds >= 1.0 {
        let rounded = round_tenths(seconds);
        if rounded.fract() == 0.0 {
            format!("{}", rounded as u64)
        } else {
            format!("{rounded}")
        }
    } else {
        format!("1/{}", (1.0 / seconds).round() as u64)
    }
}

/// `2023:06:14 18:22:05` → `2023-06-14T18:22:05`.
pub fn exif_datetime(raw: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y:%m:%d %H:%M:%S")
        .ok()
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn gps_coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag, negative_ref: char) -> Option<f64> {
    let parts = match &exif.get_field(value_tag, In::PRIMARY)?.value {
        Value::Rational(values) if values.len() >= 3 => [values[0], values[1], values[2]],
        _ => return None,
    };
    if parts.iter().any(|r| r.denom == 0) {
        return None;
    }

    let hemisphere = ascii(exif, ref_tag).and_then(|s| s.chars().next());
    Some(dms_to_decimal(
        parts[0].to_f64(),
        parts[1].to_f64(),
        parts[2].to_f64(),
        hemisphere == Some(negative_ref),
    ))
}

/// Degrees/minutes/seconds to signed decimal degrees.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, negative: bool) -> f64 {
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    let value = (value * 1_000_000.0).round() / 1_000_000.0;
    if negative { -value } else { value }
}
