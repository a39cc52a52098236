//! Best-effort clearing of location metadata from uploaded images.
//!
//! Scrubbing is advisory: any parse or write failure logs and returns the
//! original bytes unchanged, never failing the upload.

use little_exif::exif_tag::ExifTag;
use little_exif::filetype::FileExtension;
use little_exif::ifd::ExifTagGroup;
use little_exif::metadata::Metadata;
use tracing::warn;

/// Extensions the scrubber understands.
pub const SCRUBBABLE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "tiff", "png", "webp", "heif", "heic"];

/// GPS IFD tag codes (0x0000–0x001f): version, latitude/longitude/altitude
/// and their refs, timestamps, speed, track, bearing, destination, datum,
/// processing method, area information and positioning error. The whole
/// block is cleared rather than individual fields cherry-picked.
const GPS_TAG_CODES: &[u16] = &[
    0x0000, 0x0001, 0x0002, 0x0003, 0x0004, 0x0005, 0x0006, 0x0007, 0x0008, 0x0009, 0x000a,
    0x000b, 0x000c, 0x000d, 0x000e, 0x000f, 0x0010, 0x0011, 0x0012, 0x0013, 0x0014, 0x0015,
    0x0016, 0x0017, 0x0018, 0x0019, 0x001a, 0x001b, 0x001c, 0x001d, 0x001e, 0x001f,
];

pub fn can_scrub(extension: &str) -> bool {
    SCRUBBABLE_EXTENSIONS.contains(&extension)
}

fn file_type(extension: &str) -> Option<FileExtension> {
    match extension {
        "jpg" | "jpeg" => Some(FileExtension::JPEG),
        "tiff" => Some(FileExtension::TIFF),
        "png" => Some(FileExtension::PNG {
            as_zTXt_chunk: false,
        }),
        "webp" => Some(FileExtension::WEBP),
        "heif" | "heic" => Some(FileExtension::HEIF),
        _ => None,
    }
}

/// Returns `bytes` with every GPS tag cleared, or the original bytes when
/// the extension is unsupported or the metadata cannot be rewritten.
pub fn clear_location_tags(bytes: Vec<u8>, extension: &str) -> Vec<u8> {
    let Some(file_type) = file_type(extension) else {
        return bytes;
    };

    let mut metadata = match Metadata::new_from_vec(&bytes, file_type) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("Could not parse metadata for EXIF scrub ({}): {}", extension, e);
            return bytes;
        }
    };

    for &code in GPS_TAG_CODES {
        metadata.set_tag(ExifTag::UnknownINT8U(Vec::new(), code, ExifTagGroup::GPS));
    }

    let mut scrubbed = bytes.clone();
    if let Err(e) = metadata.write_to_vec(&mut scrubbed, file_type) {
        warn!("Could not write scrubbed metadata ({}): {}", extension, e);
        return bytes;
    }
    scrubbed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extensions_pass_through_untouched() {
        let bytes = b"not an image".to_vec();
        assert_eq!(clear_location_tags(bytes.clone(), "txt"), bytes);
        assert_eq!(clear_location_tags(bytes.clone(), "mp4"), bytes);
        assert_eq!(clear_location_tags(bytes.clone(), ""), bytes);
    }

    #[test]
    fn unparsable_images_pass_through_untouched() {
        let bytes = b"\xff\xd8garbage that is not a jpeg".to_vec();
        assert_eq!(clear_location_tags(bytes.clone(), "jpg"), bytes);
    }

    #[test]
    fn scrubbable_extension_set_matches_the_supported_formats() {
        for ext in SCRUBBABLE_EXTENSIONS {
            assert!(can_scrub(ext));
            assert!(file_type(ext).is_some());
        }
        assert!(!can_scrub("gif"));
        assert!(!can_scrub("svg"));
    }
}
