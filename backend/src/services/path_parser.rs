//! Episode path interpreter
//!
//! Derives show, season and episode identity from a library path laid out as
//! `<library>/<show>/<season>/<file>`, e.g.
//! `/Library/Breaking Bad/Season 2/Breaking.Bad.S02E05.mkv`.
//!
//! Everything here is pure string work on the path; nothing touches the disk.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Video container extensions accepted as episodes
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "ts", "mkv", "webm", "avi"];

/// Subtitle extensions accepted alongside episodes
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "vtt", "sub"];

static SXXEXX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)s\d+e(\d+)").unwrap());
// Digit guards, not word boundaries: `_2x05_` and `show02x05` match, `1920x1080` does not.
static NXNN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^0-9])\d{1,3}x(\d{1,4})(?:[^0-9p]|$)").unwrap());
static BRACKETED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[({][^\])}]*[\])}]").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(19|20)\d{2}$").unwrap());

/// Release tags that end the title part of a directory name
const NOISE_TOKENS: &[&str] = &[
    "2160p", "1080p", "720p", "576p", "480p", "4k", "uhd", "hdr", "x264", "x265", "h264", "h265",
    "hevc", "avc", "xvid", "bluray", "blu-ray", "brrip", "bdrip", "webrip", "web-dl", "webdl",
    "hdtv", "dvdrip", "amzn", "nf", "complete", "proper", "repack",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFileKind {
    Video,
    Subtitle,
}

/// Why a path was not treated as an episode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathRejection {
    #[error("unsupported file extension")]
    UnsupportedExtension,
    #[error("no season number in parent directory")]
    MissingSeason,
    #[error("no episode number in file name")]
    MissingEpisode,
    #[error("path has no show directory")]
    MissingShowDirectory,
}

/// Identity of an episode file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodePath {
    pub path: String,
    pub kind: MediaFileKind,
    pub show_name: String,
    pub show_path: String,
    pub season_path: String,
    pub season_number: u32,
    pub episode_number: u32,
}

/// Classify a file by extension (case-insensitive)
pub fn classify_media_file(path: &Path) -> Option<MediaFileKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();

    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaFileKind::Video)
    } else if SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaFileKind::Subtitle)
    } else {
        None
    }
}

/// Season number from the parent directory name: "Season 3", "S03", "Season 03 (2009)"
pub fn extract_season_number(path: &Path) -> Option<u32> {
    let dir = path.parent()?.file_name()?.to_str()?;
    let digits: String = dir
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse().ok()
}

/// Episode number from the file name, `S02E05` first and `2x05` as fallback
pub fn extract_episode_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;

    let caps = SXXEXX_RE
        .captures(stem)
        .or_else(|| NXNN_RE.captures(stem))?;

    caps.get(1)?.as_str().parse().ok()
}

/// The show directory (grandparent of the file)
pub fn extract_show_path(path: &Path) -> Option<&Path> {
    path.parent()?.parent().filter(|p| p.file_name().is_some())
}

/// The season directory (parent of the file)
pub fn extract_season_path(path: &Path) -> Option<&Path> {
    path.parent()
}

/// Display name of the show, taken from the show directory
pub fn extract_show_name(path: &Path) -> Option<String> {
    let dir = extract_show_path(path)?.file_name()?.to_str()?;
    Some(normalize_show_name(dir))
}

/// Strip release noise from a directory name.
///
/// `Breaking.Bad.2008.1080p.BluRay.x264-GROUP` becomes `Breaking Bad`.
/// Falls back to the trimmed input if nothing would be left.
pub fn normalize_show_name(name: &str) -> String {
    let spaced = name.replace(['.', '_'], " ");
    let unbracketed = BRACKETED_RE.replace_all(&spaced, " ");

    let mut tokens: Vec<&str> = Vec::new();
    for token in unbracketed.split_whitespace() {
        if is_noise_token(token) {
            break;
        }
        tokens.push(token);
    }

    if tokens.len() > 1 && tokens.last().is_some_and(|t| YEAR_RE.is_match(t)) {
        tokens.pop();
    }

    if tokens.is_empty() {
        return name.trim().to_string();
    }

    tokens.join(" ")
}

fn is_noise_token(token: &str) -> bool {
    let lower = token.to_lowercase();
    NOISE_TOKENS.contains(&lower.as_str()) || lower.split('-').any(|part| NOISE_TOKENS.contains(&part))
}

/// Interpret a path as an episode file
pub fn parse_episode_path(path: &str) -> Result<EpisodePath, PathRejection> {
    let p = Path::new(path);

    let kind = classify_media_file(p).ok_or(PathRejection::UnsupportedExtension)?;
    let season_number = extract_season_number(p).ok_or(PathRejection::MissingSeason)?;
    let episode_number = extract_episode_number(p).ok_or(PathRejection::MissingEpisode)?;

    let show_path = extract_show_path(p).ok_or(PathRejection::MissingShowDirectory)?;
    let season_path = extract_season_path(p).ok_or(PathRejection::MissingShowDirectory)?;
    let show_name = extract_show_name(p).ok_or(PathRejection::MissingShowDirectory)?;

    let parsed = EpisodePath {
        path: path.to_string(),
        kind,
        show_name,
        show_path: show_path.to_string_lossy().into_owned(),
        season_path: season_path.to_string_lossy().into_owned(),
        season_number,
        episode_number,
    };

    debug!(
        path = path,
        show = %parsed.show_name,
        season = parsed.season_number,
        episode = parsed.episode_number,
        "Parsed episode path"
    );

    Ok(parsed)
}
