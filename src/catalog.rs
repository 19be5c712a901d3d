use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EndcardError, Result};

/// Reduced width:height ratio of a video frame. Matching key between main
/// videos and CTA assets, and a filename token ("16x9").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Reduce pixel dimensions to lowest terms
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let divisor = gcd(width, height);
        if divisor == 0 {
            return Self { width, height };
        }
        Self {
            width: width / divisor,
            height: height / divisor,
        }
    }

    /// Filename token with a literal "x" separator, e.g. "16x9"
    pub fn file_token(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let remainder = a % b;
        a = b;
        b = remainder;
    }
    a
}

/// One CTA leaf folder discovered under the catalog root
#[derive(Debug, Clone)]
pub struct CtaEntry {
    pub language: String,
    pub cta_name: String,
    pub folder: PathBuf,
}

/// Two-level language -> CTA-name catalog, rebuilt by directory scan each
/// run and never cached across runs.
pub struct CtaCatalog {
    entries: Vec<CtaEntry>,
}

impl CtaCatalog {
    /// List language subfolders of the root, then CTA-name subfolders of
    /// each language folder. Plain files at either level are ignored.
    pub fn discover(cta_root: &Path) -> Result<Self> {
        if !cta_root.is_dir() {
            return Err(EndcardError::Config(format!(
                "CTA root is not a directory: {}",
                cta_root.display()
            )));
        }

        let mut entries = Vec::new();
        for lang_entry in fs::read_dir(cta_root)? {
            let lang_entry = lang_entry?;
            if !lang_entry.file_type()?.is_dir() {
                continue;
            }
            let language = lang_entry.file_name().to_string_lossy().to_string();

            for cta_entry in fs::read_dir(lang_entry.path())? {
                let cta_entry = cta_entry?;
                if !cta_entry.file_type()?.is_dir() {
                    continue;
                }
                entries.push(CtaEntry {
                    language: language.clone(),
                    cta_name: cta_entry.file_name().to_string_lossy().to_string(),
                    folder: cta_entry.path(),
                });
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CtaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Locate the one CTA asset in a folder matching the CTA name and aspect
/// ratio. A candidate matches iff its lowercased filename ends with
/// `_<w>x<h>.mp4` and, whitespace-stripped, contains the whitespace-stripped
/// CTA name. Returns the first match in directory-listing order; when more
/// than one file matches, selection is filesystem-order-dependent.
pub fn find_cta(cta_folder: &Path, cta_name: &str, ratio: AspectRatio) -> Option<PathBuf> {
    let suffix = format!("_{}.mp4", ratio.file_token());
    let wanted = strip_whitespace(&cta_name.to_lowercase());

    for entry in fs::read_dir(cta_folder).ok()?.flatten() {
        let file_name = entry.file_name().to_string_lossy().to_lowercase();
        if file_name.ends_with(&suffix) && strip_whitespace(&file_name).contains(&wanted) {
            return Some(entry.path());
        }
    }
    None
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    #[test]
    fn reduces_dimensions_to_lowest_terms() {
        assert_eq!(AspectRatio::from_dimensions(1920, 1080), AspectRatio { width: 16, height: 9 });
        assert_eq!(AspectRatio::from_dimensions(1080, 1920), AspectRatio { width: 9, height: 16 });
        assert_eq!(AspectRatio::from_dimensions(640, 480), AspectRatio { width: 4, height: 3 });
    }

    #[test]
    fn reduction_is_idempotent() {
        let reduced = AspectRatio::from_dimensions(3840, 2160);
        assert_eq!(AspectRatio::from_dimensions(reduced.width, reduced.height), reduced);
    }

    #[test]
    fn zero_dimension_is_kept_as_is() {
        assert_eq!(AspectRatio::from_dimensions(0, 0), AspectRatio { width: 0, height: 0 });
        assert_eq!(AspectRatio::from_dimensions(1920, 0), AspectRatio { width: 1, height: 0 });
    }

    #[test]
    fn ratio_renders_for_display_and_filenames() {
        let ratio = AspectRatio::from_dimensions(1920, 1080);
        assert_eq!(ratio.to_string(), "16:9");
        assert_eq!(ratio.file_token(), "16x9");
    }

    #[test]
    fn discovers_language_and_cta_folders() {
        let root = TempDir::new().unwrap();
        root.child("english/learn_more").create_dir_all().unwrap();
        root.child("english/shop_now").create_dir_all().unwrap();
        root.child("german/learn_more").create_dir_all().unwrap();
        root.child("stray_file.txt").touch().unwrap();

        let catalog = CtaCatalog::discover(root.path()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert!(catalog.entries().iter().all(|e| e.folder.is_dir()));
    }

    #[test]
    fn discover_rejects_missing_root() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("nope");
        assert!(CtaCatalog::discover(&missing).is_err());
    }

    #[test]
    fn finds_matching_cta_by_name_and_ratio() {
        let folder = TempDir::new().unwrap();
        folder.child("learn_more_16x9.mp4").touch().unwrap();
        folder.child("learn_more_9x16.mp4").touch().unwrap();

        let ratio = AspectRatio::from_dimensions(1920, 1080);
        let found = find_cta(folder.path(), "learn_more", ratio).unwrap();
        assert_eq!(found.file_name().unwrap().to_str().unwrap(), "learn_more_16x9.mp4");
    }

    #[test]
    fn match_is_case_and_whitespace_insensitive() {
        let folder = TempDir::new().unwrap();
        folder.child("Learn More_16x9.MP4").touch().unwrap();

        let ratio = AspectRatio::from_dimensions(16, 9);
        assert!(find_cta(folder.path(), "LEARN MORE", ratio).is_some());
    }

    #[test]
    fn returns_none_when_only_other_ratios_exist() {
        let folder = TempDir::new().unwrap();
        folder.child("learn_more_9x16.mp4").touch().unwrap();

        let ratio = AspectRatio::from_dimensions(1920, 1080);
        assert!(find_cta(folder.path(), "learn_more", ratio).is_none());
    }

    #[test]
    fn returns_none_when_name_does_not_appear() {
        let folder = TempDir::new().unwrap();
        folder.child("shop_now_16x9.mp4").touch().unwrap();

        let ratio = AspectRatio::from_dimensions(16, 9);
        assert!(find_cta(folder.path(), "learn_more", ratio).is_none());
    }
}
