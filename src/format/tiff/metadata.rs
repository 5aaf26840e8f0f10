//! Descriptive tags of a page, as a JSON object.
//!
//! Values are surfaced verbatim; descriptions holding OME-XML or ImageJ
//! headers are not interpreted.

use serde_json::{Map, Value};
use tracing::warn;

use crate::io::RangeReader;

use super::parser::Ifd;
use super::tags::TiffTag;
use super::values::ValueReader;

const STRING_TAGS: [TiffTag; 6] = [
    TiffTag::ImageDescription,
    TiffTag::Software,
    TiffTag::DateTime,
    TiffTag::Artist,
    TiffTag::Make,
    TiffTag::Model,
];

const RATIONAL_TAGS: [TiffTag; 2] = [TiffTag::XResolution, TiffTag::YResolution];

/// Collect the descriptive tags present in `ifd`.
///
/// A tag whose value cannot be read is logged and left out.
pub fn page_metadata<R: RangeReader + ?Sized>(
    ifd: &Ifd,
    values: &ValueReader<'_, R>,
) -> Map<String, Value> {
    let mut metadata = Map::new();

    for tag in STRING_TAGS {
        let Some(entry) = ifd.get_entry_by_tag(tag) else {
            continue;
        };
        match values.read_string(entry) {
            Ok(text) => {
                metadata.insert(tag.name().to_string(), Value::String(text));
            }
            Err(e) => warn!(tag = tag.name(), error = %e, "skipping unreadable tag"),
        }
    }

    for tag in RATIONAL_TAGS {
        let Some(entry) = ifd.get_entry_by_tag(tag) else {
            continue;
        };
        match values.read_rational(entry) {
            Ok(value) => {
                metadata.insert(tag.name().to_string(), Value::from(value));
            }
            Err(e) => warn!(tag = tag.name(), error = %e, "skipping unreadable tag"),
        }
    }

    if let Some(entry) = ifd.get_entry_by_tag(TiffTag::ResolutionUnit) {
        match values.read_u32(entry) {
            Ok(unit) => {
                let name = match unit {
                    2 => "inch",
                    3 => "centimeter",
                    _ => "none",
                };
                metadata.insert(
                    TiffTag::ResolutionUnit.name().to_string(),
                    Value::String(name.to_string()),
                );
            }
            Err(e) => warn!(tag = "ResolutionUnit", error = %e, "skipping unreadable tag"),
        }
    }

    metadata
}
