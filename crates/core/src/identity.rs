//! Profile loading: the persona and personal context placed at the top of
//! every prompt.
//!
//! Loading follows a layered order (later layers append):
//!
//! 1. **Persona**: `~/.umbra/persona.md` (voice, rules, output format)
//! 2. **Context profile**: `~/.umbra/context_profile.md` (facts about the user)
//! 3. **Context directory**: every `.md`/`.txt` file in `~/.umbra/context/`, sorted
//! 4. **Extra files**: absolute paths from config
//!
//! Each file is optional and missing files are skipped with a debug trace. If
//! nothing loads, a built-in fallback persona is used. An override string
//! bypasses file loading entirely.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Well-known profile file names.
pub const PERSONA_FILE: &str = "persona.md";
pub const CONTEXT_PROFILE_FILE: &str = "context_profile.md";
pub const CONTEXT_DIR: &str = "context";

/// Used when no profile file could be read.
pub const FALLBACK_PROFILE: &str = "You are Umbra, a helpful personal assistant. \
Pick the single best tool for each request and answer with one JSON object.";

/// Supplies the persona/profile text block for the context assembler.
///
/// Called once at construction and again on every explicit reload.
pub trait ProfileSupplier: Send + Sync {
    fn load(&self) -> String;
}

/// A fixed profile string.
#[derive(Debug, Clone)]
pub struct StaticProfile(pub String);

impl StaticProfile {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl ProfileSupplier for StaticProfile {
    fn load(&self) -> String {
        self.0.clone()
    }
}

/// Where profile files live.
#[derive(Debug, Clone, Default)]
pub struct ProfilePaths {
    /// Directory holding `persona.md`, `context_profile.md` and `context/`
    pub profile_dir: Option<PathBuf>,

    /// Additional files to append (absolute paths)
    pub extra_files: Vec<PathBuf>,

    /// Optional override (skips all file loading)
    pub override_text: Option<String>,
}

/// A profile read from disk on every `load()`.
#[derive(Debug, Clone)]
pub struct FileProfile {
    paths: ProfilePaths,
}

struct Section {
    heading: &'static str,
    content: String,
}

impl FileProfile {
    pub fn new(paths: ProfilePaths) -> Self {
        Self { paths }
    }

    fn collect_sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();

        if let Some(dir) = &self.paths.profile_dir {
            if let Some(content) = read_non_empty(&dir.join(PERSONA_FILE)) {
                sections.push(Section {
                    heading: "",
                    content,
                });
            }
            if let Some(content) = read_non_empty(&dir.join(CONTEXT_PROFILE_FILE)) {
                sections.push(Section {
                    heading: "--- PRIME DIRECTIVE CONTEXT ---",
                    content,
                });
            }

            let context_dir = dir.join(CONTEXT_DIR);
            if context_dir.is_dir() {
                for content in read_context_dir(&context_dir) {
                    sections.push(Section {
                        heading: "--- ADDITIONAL CONTEXT ---",
                        content,
                    });
                }
            }
        }

        for path in &self.paths.extra_files {
            if let Some(content) = read_non_empty(path) {
                sections.push(Section {
                    heading: "--- ADDITIONAL CONTEXT ---",
                    content,
                });
            }
        }

        sections
    }
}

impl ProfileSupplier for FileProfile {
    fn load(&self) -> String {
        if let Some(text) = &self.paths.override_text {
            debug!("Using profile override, skipping file loading");
            return text.clone();
        }

        let sections = self.collect_sections();
        if sections.is_empty() {
            warn!("No profile files found, using fallback persona");
            return FALLBACK_PROFILE.to_string();
        }

        let mut profile = String::with_capacity(4096);
        for section in &sections {
            if !profile.is_empty() {
                profile.push_str("\n\n");
            }
            if !section.heading.is_empty() {
                profile.push_str(section.heading);
                profile.push('\n');
            }
            profile.push_str(section.content.trim());
        }

        debug!(sections = sections.len(), chars = profile.len(), "Profile loaded");
        profile
    }
}

fn read_non_empty(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => {
            debug!(file = %path.display(), "Loaded profile file");
            Some(content)
        }
        Ok(_) => None,
        Err(e) => {
            debug!(file = %path.display(), error = %e, "Profile file not loaded");
            None
        }
    }
}

/// All non-empty `.md`/`.txt` files in `dir`, sorted by path.
fn read_context_dir(dir: &Path) -> Vec<String> {
    let mut entries: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(rd) => rd
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == "md" || ext == "txt")
            })
            .collect(),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Failed to read context directory");
            return Vec::new();
        }
    };

    // Sort for deterministic ordering
    entries.sort();
    entries.iter().filter_map(|p| read_non_empty(p)).collect()
}
