//! MIME type detection.

use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";
/// How much of a file's head [`detect`] wants to see.
pub const SNIFF_BYTES: usize = 8192;

/// Work out a file's MIME type.
///
/// The extension wins when it is a known media type, the same way a browser
/// labels picked files. Otherwise the first bytes of the content are sniffed,
/// and anything still unknown is `application/octet-stream`.
///
/// # Examples
///
/// ```
/// use mediastore_source::mime::detect;
///
/// assert_eq!(detect("clip.MP4", b""), "video/mp4");
/// assert_eq!(detect("noextension", b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
/// assert_eq!(detect("data.bin", &[1, 2, 3]), "application/octet-stream");
/// ```
pub fn detect(name: &str, head: &[u8]) -> String {
    if let Some(mime_type) = from_extension(name) {
        return mime_type.to_string();
    }
    match infer::get(head) {
        Some(kind) => kind.mime_type().to_string(),
        None => OCTET_STREAM.to_string(),
    }
}

fn from_extension(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "ogv" => "video/ogg",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a.mp4", "video/mp4")]
    #[case("A.WEBM", "video/webm")]
    #[case("song.flac", "audio/flac")]
    #[case("archive.tar.mp3", "audio/mpeg")]
    fn test_extension_wins(#[case] name: &str, #[case] expected: &str) {
        // Content says PNG, extension says otherwise.
        assert_eq!(detect(name, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), expected);
    }

    #[test]
    fn test_sniffs_unknown_extension() {
        let mut mp4 = vec![0x00, 0x00, 0x00, 0x18];
        mp4.extend_from_slice(b"ftypmp42");
        mp4.extend_from_slice(&[0; 12]);
        assert_eq!(detect("recording.dat", &mp4), "video/mp4");
    }

    #[rstest]
    #[case("", &[])]
    #[case("data.bin", &[1, 2, 3])]
    #[case(".hidden", &[9, 9])]
    fn test_falls_back_to_octet_stream(#[case] name: &str, #[case] head: &[u8]) {
        assert_eq!(detect(name, head), OCTET_STREAM);
    }
}
