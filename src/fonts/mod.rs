//! Font loading for the report renderer.
//!
//! `genpdf` measures text with real font metrics, so a TrueType family has to
//! be found on disk. The search covers `SMARTDRIVE_FONTS_DIR`, an
//! `assets/fonts` directory next to the binary or the crate manifest, and the
//! usual system font directories. Families that are metric compatible with
//! Helvetica are rendered with the PDF built-in font instead of being embedded.

use std::env;
use std::path::{Path, PathBuf};

use genpdf::fonts::{FontData, FontFamily};
use printpdf::BuiltinFont;
use log::{debug, warn};

use crate::builder::DocumentError;

/// Environment variable pointing at a directory with one of the known families.
pub const FONTS_DIR_ENV: &str = "SMARTDRIVE_FONTS_DIR";

/// File names of one TrueType family.
#[derive(Clone, Copy, Debug)]
pub struct FamilyFiles {
    pub name: &'static str,
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
    /// Metrics match Helvetica, so the built-in PDF font can be used.
    helvetica_metrics: bool,
}

/// Known families in order of preference.
pub const KNOWN_FAMILIES: &[FamilyFiles] = &[
    FamilyFiles {
        name: "LiberationSans",
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
        italic: "LiberationSans-Italic.ttf",
        bold_italic: "LiberationSans-BoldItalic.ttf",
        helvetica_metrics: true,
    },
    FamilyFiles {
        name: "Arial",
        regular: "arial.ttf",
        bold: "arialbd.ttf",
        italic: "ariali.ttf",
        bold_italic: "arialbi.ttf",
        helvetica_metrics: true,
    },
    FamilyFiles {
        name: "Roboto",
        regular: "Roboto-Regular.ttf",
        bold: "Roboto-Bold.ttf",
        italic: "Roboto-Italic.ttf",
        bold_italic: "Roboto-BoldItalic.ttf",
        helvetica_metrics: false,
    },
    FamilyFiles {
        name: "DejaVuSans",
        regular: "DejaVuSans.ttf",
        bold: "DejaVuSans-Bold.ttf",
        italic: "DejaVuSans-Oblique.ttf",
        bold_italic: "DejaVuSans-BoldOblique.ttf",
        helvetica_metrics: false,
    },
];

const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/liberation-sans",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
    "/Library/Fonts",
];

impl FamilyFiles {
    fn paths(&self, directory: &Path) -> [PathBuf; 4] {
        [
            directory.join(self.regular),
            directory.join(self.bold),
            directory.join(self.italic),
            directory.join(self.bold_italic),
        ]
    }

    fn present_in(&self, directory: &Path) -> bool {
        self.paths(directory).iter().all(|path| path.is_file())
    }

    fn builtin(&self, face: BuiltinFont) -> Option<BuiltinFont> {
        self.helvetica_metrics.then_some(face)
    }

    fn load(&self, directory: &Path) -> Result<FontFamily<FontData>, DocumentError> {
        let load = |path: PathBuf, face: BuiltinFont| {
            FontData::load(&path, self.builtin(face))
                .map_err(|source| DocumentError::Font { path, source })
        };
        let [regular, bold, italic, bold_italic] = self.paths(directory);

        Ok(FontFamily {
            regular: load(regular, BuiltinFont::Helvetica)?,
            bold: load(bold, BuiltinFont::HelveticaBold)?,
            italic: load(italic, BuiltinFont::HelveticaOblique)?,
            bold_italic: load(bold_italic, BuiltinFont::HelveticaBoldOblique)?,
        })
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let mut push = |candidate: PathBuf| {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        push(path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push(bin_dir.join("assets/fonts"));
        }
    }

    push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));

    #[cfg(windows)]
    for var in ["WINDIR", "SystemRoot"] {
        if let Some(root) = env_path(var) {
            push(root.join("Fonts"));
        }
    }

    for dir in SYSTEM_FONT_DIRS {
        push(PathBuf::from(dir));
    }

    candidates
}

/// First directory holding a complete known family.
fn locate_family() -> Result<(PathBuf, &'static FamilyFiles), DocumentError> {
    let candidates = font_directory_candidates();

    for directory in candidates.iter().filter(|candidate| candidate.is_dir()) {
        if let Some(family) = KNOWN_FAMILIES.iter().find(|family| family.present_in(directory)) {
            return Ok((directory.clone(), family));
        }
    }

    let searched = candidates
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(DocumentError::FontsUnavailable { searched })
}

/// Loads the first known font family found in the search directories.
pub fn default_font_family() -> Result<FontFamily<FontData>, DocumentError> {
    let (directory, family) = locate_family().map_err(|err| {
        warn!("no report font family available: {err}");
        err
    })?;
    debug!("loading font family {} from {}", family.name, directory.display());
    family.load(&directory)
}

/// Indicates whether a complete font family can be found on this machine.
pub fn default_fonts_available() -> bool {
    locate_family().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_requires_all_four_faces() {
        let dir = env::temp_dir().join(format!("smartdrive-fonts-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let family = &KNOWN_FAMILIES[0];

        for file in [family.regular, family.bold, family.italic] {
            std::fs::write(dir.join(file), b"").unwrap();
        }
        assert!(!family.present_in(&dir));

        std::fs::write(dir.join(family.bold_italic), b"").unwrap();
        assert!(family.present_in(&dir));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unreadable_font_reports_its_path() {
        let dir = env::temp_dir().join(format!("smartdrive-badfont-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let family = &KNOWN_FAMILIES[0];
        for path in family.paths(&dir) {
            std::fs::write(path, b"not a font").unwrap();
        }

        match family.load(&dir) {
            Err(DocumentError::Font { path, .. }) => assert_eq!(path, dir.join(family.regular)),
            other => panic!("expected a font error, got {:?}", other.err()),
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn search_starts_with_the_override_directory() {
        let candidates = font_directory_candidates();
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
        assert!(candidates.contains(&manifest));
        assert!(candidates.contains(&PathBuf::from("/usr/share/fonts/truetype/dejavu")));
        if let Some(path) = env_path(FONTS_DIR_ENV) {
            assert_eq!(candidates[0], path);
        }
    }
}
