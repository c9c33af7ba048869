//! Validation and encoding of uploaded attachments.

use crate::error::ChatError;
use crate::models::{EncodedFile, FileMetadata, UploadedFile};
use unicode_normalization::UnicodeNormalization;

/// Extensions accepted for upload, lower-case.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "pdf", "txt", "mp3", "wav", "ogg", "mp4",
];

/// MIME type reported when the client declared none.
pub const UNKNOWN_MIME_TYPE: &str = "unknown";

const MIB: usize = 1024 * 1024;

/// Whether the extension after the last `.` is in the allow-list
/// (case-insensitive). Names without a `.` are rejected.
pub fn is_allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Reduce a client-supplied name to a safe, flat file name.
///
/// The name is NFKD-normalized so accented letters keep their base letter,
/// then remaining non-ASCII characters are dropped. Path separators and whitespace collapse
/// into single underscores, anything outside `[A-Za-z0-9_.-]` is removed and
/// leading/trailing dots and underscores are trimmed. The result may be empty.
pub fn sanitize_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// `"x.y KB"` below one MiB, `"x.y MB"` from one MiB up.
pub fn human_readable_size(size: usize) -> String {
    if size < MIB {
        format!("{:.1} KB", size as f64 / 1024.0)
    } else {
        format!("{:.1} MB", size as f64 / MIB as f64)
    }
}

/// Display metadata for an accepted upload.
pub fn file_metadata(file: &UploadedFile) -> FileMetadata {
    let size = file.size();
    FileMetadata {
        name: sanitize_filename(&file.name),
        size,
        size_readable: human_readable_size(size),
        mime_type: mime_type_or_unknown(file),
    }
}

fn mime_type_or_unknown(file: &UploadedFile) -> String {
    file.mime_type
        .as_deref()
        .filter(|mime| !mime.is_empty())
        .unwrap_or(UNKNOWN_MIME_TYPE)
        .to_string()
}

/// Accepted uploads, in the order they were received.
#[derive(Debug, Default)]
pub struct PreparedUploads {
    pub encoded: Vec<EncodedFile>,
    pub metadata: Vec<FileMetadata>,
    /// Number of parts silently dropped by the allow-list.
    pub skipped: usize,
}

/// Validate and encode every upload of a request.
///
/// Parts with an empty name or a disallowed extension are dropped without
/// error. Fails when the accepted files together exceed `max_total_bytes`.
pub fn prepare_uploads(
    files: Vec<UploadedFile>,
    max_total_bytes: usize,
) -> Result<PreparedUploads, ChatError> {
    let mut prepared = PreparedUploads::default();
    let mut total_bytes = 0usize;

    for file in files {
        if file.name.is_empty() || !is_allowed_file(&file.name) {
            tracing::debug!(filename = %file.name, "Skipping upload with disallowed extension");
            prepared.skipped += 1;
            continue;
        }

        total_bytes = total_bytes.saturating_add(file.size());
        if total_bytes > max_total_bytes {
            return Err(ChatError::PayloadTooLarge {
                limit: max_total_bytes,
            });
        }

        let meta = file_metadata(&file);
        prepared
            .encoded
            .push(EncodedFile::encode(meta.name.clone(), meta.mime_type.clone(), &file.data));
        prepared.metadata.push(meta);
    }

    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, mime: Option<&str>, size: usize) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            mime_type: mime.map(str::to_string),
            data: vec![7u8; size],
        }
    }

    #[test]
    fn names_without_a_dot_are_rejected() {
        for name in ["", "png", "README", "photo_png"] {
            assert!(!is_allowed_file(name), "{name} should be rejected");
        }
    }

    #[test]
    fn allowed_extensions_match_case_insensitively() {
        for ext in ALLOWED_EXTENSIONS {
            assert!(is_allowed_file(&format!("file.{ext}")));
            assert!(is_allowed_file(&format!("FILE.{}", ext.to_uppercase())));
        }
        assert!(is_allowed_file("archive.tar.PNG"));
    }

    #[test]
    fn other_extensions_are_rejected() {
        for name in ["archive.zip", "script.sh", "photo.png.exe", "trailing.", "doc.docx"] {
            assert!(!is_allowed_file(name), "{name} should be rejected");
        }
    }

    #[test]
    fn sanitize_strips_path_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\photo.png"), "C_Users_me_photo.png");
    }

    #[test]
    fn sanitize_collapses_whitespace_and_drops_unsafe_characters() {
        assert_eq!(sanitize_filename("my cool   photo.png"), "my_cool_photo.png");
        assert_eq!(sanitize_filename("fotó<1>.jpg"), "foto1.jpg");
        assert_eq!(sanitize_filename("photo.png"), "photo.png");
        assert_eq!(sanitize_filename(".."), "");
    }

    #[test]
    fn sanitize_keeps_base_letters_of_accented_names() {
        assert_eq!(sanitize_filename("canción.mp3"), "cancion.mp3");
        assert_eq!(sanitize_filename("Año Nuevo.png"), "Ano_Nuevo.png");
        assert_eq!(sanitize_filename("ﬁcha.pdf"), "ficha.pdf");
        assert_eq!(sanitize_filename("日本.txt"), "txt");
    }

    #[test]
    fn sizes_below_one_mebibyte_render_in_kilobytes() {
        assert_eq!(human_readable_size(0), "0.0 KB");
        assert_eq!(human_readable_size(1536), "1.5 KB");
        assert_eq!(human_readable_size(1_048_575), "1024.0 KB");
    }

    #[test]
    fn sizes_from_one_mebibyte_render_in_megabytes() {
        assert_eq!(human_readable_size(1_048_576), "1.0 MB");
        assert_eq!(human_readable_size(5 * 1_048_576 + 524_288), "5.5 MB");
    }

    #[test]
    fn metadata_defaults_missing_mime_type() {
        let meta = file_metadata(&upload("notes.txt", None, 10));
        assert_eq!(meta.mime_type, "unknown");
        assert_eq!(meta.size, 10);
        assert_eq!(meta.size_readable, "0.0 KB");
    }

    #[test]
    fn prepare_drops_disallowed_and_unnamed_files() {
        let prepared = prepare_uploads(
            vec![
                upload("archive.zip", Some("application/zip"), 10),
                upload("", Some("image/png"), 10),
                upload("photo.png", Some("image/png"), 10),
            ],
            1024,
        )
        .unwrap();

        assert_eq!(prepared.metadata.len(), 1);
        assert_eq!(prepared.metadata[0].name, "photo.png");
        assert_eq!(prepared.encoded.len(), 1);
        assert_eq!(prepared.encoded[0].decode().unwrap(), vec![7u8; 10]);
        assert_eq!(prepared.skipped, 2);
    }

    #[test]
    fn prepare_rejects_uploads_over_the_aggregate_limit() {
        let err = prepare_uploads(
            vec![
                upload("a.png", Some("image/png"), 600),
                upload("b.png", Some("image/png"), 600),
            ],
            1000,
        )
        .unwrap_err();

        assert!(matches!(err, ChatError::PayloadTooLarge { limit: 1000 }));
    }

    #[test]
    fn rejected_files_do_not_count_towards_the_limit() {
        let prepared = prepare_uploads(
            vec![
                upload("big.zip", None, 5000),
                upload("small.txt", Some("text/plain"), 100),
            ],
            1000,
        )
        .unwrap();

        assert_eq!(prepared.metadata.len(), 1);
    }
}
