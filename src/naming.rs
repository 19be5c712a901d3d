use std::path::{Path, PathBuf};

use crate::catalog::AspectRatio;
use crate::config::NamingConfig;

/// Derives the output filename for one (main video, language, CTA)
/// combination. Swappable so alternate naming conventions can be substituted
/// without touching the orchestrator.
pub trait NamingPolicy: Send + Sync {
    fn build_name(
        &self,
        base_name: &str,
        lang_code: &str,
        cta_code: &str,
        ratio: AspectRatio,
    ) -> String;
}

/// Default policy over underscore-separated name segments.
///
/// The kept prefix of the base name runs up to the first segment that is
/// either a configured marker or exactly two characters long; a trailing
/// "<digits>s" duration marker seen before the cutoff is carried over.
pub struct SegmentNamingPolicy {
    cutoff_markers: Vec<String>,
}

impl SegmentNamingPolicy {
    pub fn new(config: &NamingConfig) -> Self {
        Self {
            cutoff_markers: config.cutoff_markers.clone(),
        }
    }
}

impl Default for SegmentNamingPolicy {
    fn default() -> Self {
        Self::new(&NamingConfig::default())
    }
}

impl NamingPolicy for SegmentNamingPolicy {
    fn build_name(
        &self,
        base_name: &str,
        lang_code: &str,
        cta_code: &str,
        ratio: AspectRatio,
    ) -> String {
        let segments: Vec<&str> = base_name.split('_').collect();

        let mut cutoff = segments.len();
        let mut duration_marker = None;
        for (index, segment) in segments.iter().enumerate() {
            if self.cutoff_markers.iter().any(|m| m == segment) || segment.chars().count() == 2 {
                cutoff = index;
                break;
            }
            if is_duration_marker(segment) {
                duration_marker = Some(*segment);
            }
        }

        let mut parts: Vec<String> = segments[..cutoff].iter().map(|s| s.to_string()).collect();
        parts.push(lang_code.to_string());
        parts.push(cta_code.to_string());
        if let Some(marker) = duration_marker {
            parts.push(marker.to_string());
        }

        let ratio_label = ratio.to_string();
        if !parts.iter().any(|p| p.replace('x', ":") == ratio_label) {
            parts.push(ratio.file_token());
        }

        sanitize_filename(&format!("{}.mp4", parts.join("_")))
    }
}

fn is_duration_marker(segment: &str) -> bool {
    segment
        .strip_suffix('s')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

/// First two characters of the language folder name, upper-cased
pub fn language_code(language_folder: &str) -> String {
    language_folder.chars().take(2).collect::<String>().to_uppercase()
}

/// Initials of the CTA name's words, upper-cased. Words are separated by
/// whitespace or underscores ("Learn More" and "learn_more" both yield "LM").
pub fn cta_code(cta_name: &str) -> String {
    cta_name
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|word| !word.is_empty())
        .filter_map(|word| word.chars().next())
        .flat_map(|c| c.to_uppercase())
        .collect()
}

/// Strip characters that are unsafe in filenames on common filesystems
pub fn sanitize_filename(name: &str) -> String {
    const UNSAFE: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
    name.chars().filter(|c| !UNSAFE.contains(c)).collect()
}

/// Resolve a collision-free output path from a seed filename. Inserts an
/// incrementing `_<n>` before the extension until no existing file is hit;
/// the loop terminates because the folder holds finitely many entries.
pub fn resolve_collision(folder: &Path, file_name: &str) -> PathBuf {
    let candidate = folder.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, extension)) => (stem, extension),
        None => (file_name, "mp4"),
    };

    let mut counter = 1;
    loop {
        let numbered = folder.join(format!("{}_{}.{}", stem, counter, extension));
        if !numbered.exists() {
            return numbered;
        }
        counter += 1;
    }
}
