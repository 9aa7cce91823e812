#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Logical-path to FAT short-name mapping.

use core::fmt::Write as _;

use heapless::String;

/// Longest mapped name: `IMG65535.JPG`.
pub const MAX_SHORT_NAME: usize = 12;

/// Maps a logical image path to a legal 8.3 name for the FAT volume.
///
/// The `Image<N>` stem outgrows the 8-character short-name limit at sequence
/// 1000, so images land on disk as `IMG<N>.JPG`; that stem is at most
/// `IMG65535`, which fits for every u16 sequence value. Paths that do not
/// look like image paths pass through with the leading separator stripped.
pub fn short_image_name(path: &str) -> String<MAX_SHORT_NAME> {
    let name = path.strip_prefix('/').unwrap_or(path);
    let mut short = String::new();
    if let Some(sequence) = name
        .strip_prefix("Image")
        .and_then(|rest| rest.strip_suffix(".jpg"))
    {
        if write!(short, "IMG{sequence}.JPG").is_ok() {
            return short;
        }
        short.clear();
    }
    let _ = write!(short, "{name}");
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_paths_map_to_img_aliases() {
        assert_eq!(short_image_name("/Image1.jpg").as_str(), "IMG1.JPG");
        assert_eq!(short_image_name("/Image999.jpg").as_str(), "IMG999.JPG");
        assert_eq!(short_image_name("/Image1000.jpg").as_str(), "IMG1000.JPG");
        assert_eq!(short_image_name("/Image65535.jpg").as_str(), "IMG65535.JPG");
    }

    #[test]
    fn every_sequence_value_fits_eight_three() {
        for seq in [1u16, 9, 99, 999, 1000, 9999, 65535] {
            let path = camera_core::capture::image_path(seq);
            let name = short_image_name(&path);
            let (stem, extension) = name.split_once('.').expect("dotted name");
            assert!(stem.len() <= 8, "stem too long for {path}");
            assert_eq!(extension, "JPG");
        }
    }

    #[test]
    fn other_paths_lose_only_the_separator() {
        assert_eq!(short_image_name("/STATUS.TXT").as_str(), "STATUS.TXT");
        assert_eq!(short_image_name("README").as_str(), "README");
    }
}
