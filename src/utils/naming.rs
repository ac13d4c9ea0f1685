//! File naming for the keyword-partitioned download tree

use path_absolutize::Absolutize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Fallback used when sanitization leaves nothing behind
pub const DEFAULT_FILE_LABEL: &str = "untitled";

/// Upper bound on a sanitized title, author or keyword, in bytes
pub const MAX_COMPONENT_BYTES: usize = 200;

/// Upper bound on a composed media filename, in bytes (filesystems stop at 255)
pub const MAX_FILENAME_BYTES: usize = 240;

/// Suffix of every downloaded video file
pub const VIDEO_SUFFIX: &str = ".mp4";

/// Suffix of every downloaded cover image
pub const COVER_SUFFIX: &str = "_cover.jpg";

// Characters invalid on Windows/macOS/Linux filesystems
const ILLEGAL_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitizes a title, author or keyword into a single safe path component.
///
/// - Illegal characters and control characters become `_`
/// - Runs of whitespace and underscores collapse into one `_`
/// - Leading/trailing separators and dots are removed (no hidden files, no `..`)
/// - Length is capped at [`MAX_COMPONENT_BYTES`] on a character boundary,
///   keeping a short extension
/// - An empty result falls back to [`DEFAULT_FILE_LABEL`]
///
/// # Examples
/// ```
/// use clipharvest::utils::naming::sanitize_filename;
/// assert_eq!(sanitize_filename("Sunset: Beach / Waves"), "Sunset_Beach_Waves");
/// assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
/// assert_eq!(sanitize_filename("???"), "untitled");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    sanitize_filename_with_limit(name, MAX_COMPONENT_BYTES)
}

/// Same as [`sanitize_filename`] with an explicit byte limit
pub fn sanitize_filename_with_limit(name: &str, max_bytes: usize) -> String {
    let mut collapsed = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        let c = if ILLEGAL_CHARS.contains(&c) || c.is_control() {
            '_'
        } else {
            c
        };

        if c == '_' || c.is_whitespace() {
            pending_separator = true;
            continue;
        }

        if pending_separator && !collapsed.is_empty() {
            collapsed.push('_');
        }
        pending_separator = false;
        collapsed.push(c);
    }

    let trimmed = collapsed
        .trim_start_matches(|c| c == '.' || c == '_')
        .trim_end_matches(|c| c == '.' || c == '_');

    let limited = truncate_preserving_extension(trimmed, max_bytes.max(4));
    if limited.is_empty() {
        DEFAULT_FILE_LABEL.to_string()
    } else {
        limited
    }
}

fn truncate_preserving_extension(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }

    if let Some(dot_pos) = name.rfind('.') {
        let extension = &name[dot_pos..];
        if dot_pos > 0 && extension.chars().count() < 10 && extension.len() < max_bytes {
            let stem = truncate_to_bytes(&name[..dot_pos], max_bytes - extension.len());
            return format!("{}{}", stem, extension);
        }
    }

    truncate_to_bytes(name, max_bytes).to_string()
}

/// Longest prefix of `s` within `max_bytes` that ends on a character boundary
fn truncate_to_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// `{title}_{author}_{id}_{resolution}.mp4`, at most [`MAX_FILENAME_BYTES`].
///
/// Title and author are shortened first; the id, resolution and suffix are
/// always kept whole so distinct records never share a name.
pub fn video_filename(title: &str, author: &str, id: &str, resolution: &str) -> String {
    let suffix = format!(
        "_{}_{}{}",
        id_component(id),
        sanitize_filename(resolution),
        VIDEO_SUFFIX
    );
    compose_filename(title, author, &suffix)
}

/// `{title}_{author}_{id}_cover.jpg`, bounded like [`video_filename`]
pub fn cover_filename(title: &str, author: &str, id: &str) -> String {
    let suffix = format!("_{}{}", id_component(id), COVER_SUFFIX);
    compose_filename(title, author, &suffix)
}

fn compose_filename(title: &str, author: &str, suffix: &str) -> String {
    // One byte for the separator between title and author
    let budget = MAX_FILENAME_BYTES.saturating_sub(suffix.len() + 1);

    let author = sanitize_filename(author);
    let author = truncate_to_bytes(&author, budget / 4);
    let title = sanitize_filename(title);
    let title = truncate_to_bytes(&title, budget - author.len());

    format!("{}_{}{}", title, author, suffix)
}

fn id_component(id: &str) -> String {
    if id.trim().is_empty() {
        String::new()
    } else {
        sanitize_filename(id)
    }
}

/// Resolves `filename` inside `base_dir`.
///
/// The name is sanitized to one component of at most [`MAX_FILENAME_BYTES`],
/// so names built by [`video_filename`] and [`cover_filename`] keep their id
/// and suffix. If the lexically absolutized result still escapes `base_dir`,
/// a `safe_`-prefixed name directly under the base is returned instead.
pub fn safe_path(base_dir: &Path, filename: &str) -> io::Result<PathBuf> {
    let clean = sanitize_filename_with_limit(filename, MAX_FILENAME_BYTES);
    let base = base_dir.absolutize()?.into_owned();
    let candidate = base.join(&clean).absolutize()?.into_owned();

    if candidate.starts_with(&base) && candidate != base {
        Ok(candidate)
    } else {
        Ok(base.join(format!("safe_{}", clean)))
    }
}

/// Creates `path` (and parents) if missing and returns it
pub async fn ensure_directory(path: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(path).await?;
    Ok(path.to_path_buf())
}

/// Directory holding everything downloaded for `keyword`
pub fn keyword_dir(download_dir: &Path, keyword: &str) -> PathBuf {
    download_dir.join(sanitize_filename(keyword))
}

/// Human-readable byte count, e.g. `1.5 MB`
pub fn format_file_size(size: u64) -> String {
    let mut value = size as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} PB", value)
}

/// `MM:SS`, or `HH:MM:SS` once an hour is reached
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
