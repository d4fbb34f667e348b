//! Derivation of thumbnail file names from source file names.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Insert `marker` in front of the extension of `name`.
///
/// The extension runs from the last `.` to the end of the name; a name
/// without a `.` gets the marker appended.
pub fn derive_file_name(name: &str, marker: &str) -> String {
    match name.rfind('.') {
        Some(dot) => format!("{}{}{}", &name[..dot], marker, &name[dot..]),
        None => format!("{name}{marker}"),
    }
}

/// Insert `marker` in front of the extension of an OS file name.
///
/// UTF-8 names go through [`derive_file_name`]. Other names keep their raw
/// bytes, so distinct sources never share a thumbnail name.
pub fn derive_os_file_name(name: &OsStr, marker: &str) -> OsString {
    if let Some(name) = name.to_str() {
        return derive_file_name(name, marker).into();
    }

    let path = Path::new(name);
    let mut derived = OsString::with_capacity(name.len() + marker.len());
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            derived.push(stem);
            derived.push(marker);
            derived.push(".");
            derived.push(ext);
        }
        // A leading dot is the only dot: the whole name is the extension.
        _ if name.as_encoded_bytes().first() == Some(&b'.') => {
            derived.push(marker);
            derived.push(name);
        }
        _ => {
            derived.push(name);
            derived.push(marker);
        }
    }
    derived
}

/// Path of the thumbnail for `source`, in the same directory.
///
/// Only the final path component is rewritten, so dots in directory names
/// never count as an extension.
pub fn thumbnail_path(source: &Path, marker: &str) -> PathBuf {
    match source.file_name() {
        Some(name) => source.with_file_name(derive_os_file_name(name, marker)),
        None => {
            let mut raw = source.as_os_str().to_os_string();
            raw.push(marker);
            PathBuf::from(raw)
        }
    }
}

/// Whether `path` already looks like a thumbnail produced with `marker`.
pub fn is_derived(path: &Path, marker: &str) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let bytes = name.as_encoded_bytes();
    let stem = match bytes.iter().rposition(|&b| b == b'.') {
        Some(dot) => &bytes[..dot],
        None => bytes,
    };
    !marker.is_empty() && stem.ends_with(marker.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_simple() {
        assert_eq!(derive_file_name("pic.jpg", "_thumb"), "pic_thumb.jpg");
    }

    #[test]
    fn test_derive_uses_last_dot() {
        assert_eq!(derive_file_name("a.b.jpeg", "_thumb"), "a.b_thumb.jpeg");
    }

    #[test]
    fn test_derive_without_extension() {
        assert_eq!(derive_file_name("noext", "_thumb"), "noext_thumb");
    }

    #[test]
    fn test_derive_leading_dot() {
        assert_eq!(derive_file_name(".hidden", "_thumb"), "_thumb.hidden");
    }

    #[test]
    fn test_thumbnail_path_keeps_directory() {
        assert_eq!(
            thumbnail_path(Path::new("./pictures/green1.jpg"), "_thumb"),
            PathBuf::from("./pictures/green1_thumb.jpg")
        );
    }

    #[test]
    fn test_thumbnail_path_ignores_dotted_directories() {
        assert_eq!(
            thumbnail_path(Path::new("shots.v2/noext"), "_thumb"),
            PathBuf::from("shots.v2/noext_thumb")
        );
    }

    #[test]
    fn test_distinct_stems_map_to_distinct_names() {
        let names = ["pic.jpg", "pic2.jpg", "pic.b.jpg", "pic", "pic.jpeg"];
        let derived: std::collections::HashSet<_> = names
            .iter()
            .map(|n| derive_file_name(n, "_thumb"))
            .collect();
        assert_eq!(derived.len(), names.len());
    }

    #[test]
    fn test_is_derived() {
        assert!(is_derived(Path::new("dir/pic_thumb.jpg"), "_thumb"));
        assert!(is_derived(Path::new("noext_thumb"), "_thumb"));
        assert!(!is_derived(Path::new("dir/pic.jpg"), "_thumb"));
        assert!(!is_derived(Path::new("thumbnail.jpg"), "_thumb"));
    }

    #[test]
    fn test_derived_name_is_recognized() {
        let out = thumbnail_path(Path::new("pictures/a.b.jpeg"), "_small");
        assert!(is_derived(&out, "_small"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_stay_distinct() {
        use std::os::unix::ffi::OsStrExt;

        let a = Path::new(OsStr::from_bytes(b"dir/a\xff.jpg"));
        let b = Path::new(OsStr::from_bytes(b"dir/a\xfe.jpg"));
        let thumb_a = thumbnail_path(a, "_thumb");
        let thumb_b = thumbnail_path(b, "_thumb");

        assert_ne!(thumb_a, thumb_b);
        assert_eq!(thumb_a.as_os_str().as_bytes(), b"dir/a\xff_thumb.jpg");
        assert_eq!(thumb_b.as_os_str().as_bytes(), b"dir/a\xfe_thumb.jpg");
        assert!(is_derived(&thumb_a, "_thumb"));
        assert!(!is_derived(a, "_thumb"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_without_extension() {
        use std::os::unix::ffi::OsStrExt;

        let plain = OsStr::from_bytes(b"raw\x80");
        assert_eq!(
            derive_os_file_name(plain, "_thumb").as_bytes(),
            b"raw\x80_thumb"
        );
        let hidden = OsStr::from_bytes(b".raw\x80");
        assert_eq!(
            derive_os_file_name(hidden, "_thumb").as_bytes(),
            b"_thumb.raw\x80"
        );
    }

    #[test]
    fn test_os_name_matches_str_derivation_for_utf8() {
        for name in ["pic.jpg", "a.b.jpeg", "noext", ".hidden"] {
            assert_eq!(
                derive_os_file_name(OsStr::new(name), "_thumb"),
                OsString::from(derive_file_name(name, "_thumb"))
            );
        }
    }
}
