//! Structural paths of element names.

use std::fmt;

use smol_str::SmolStr;

/// Slash-separated element names from the document root to a node.
///
/// `/Project/PropertyGroup/Foo` is absolute. A pattern without the leading
/// slash (`PropertyGroup`, `Target/ItemGroup`) is relative and matches any
/// path ending with its segments. The document itself is `/`.
///
/// Matching compares element names exactly. It never consults evaluated
/// semantics, so an `ItemGroup` element is matched by name even when the
/// caller is thinking of the evaluated item concept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct XsPath {
    segments: Vec<SmolStr>,
    absolute: bool,
}

impl XsPath {
    /// The document-level path `/`.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
            absolute: true,
        }
    }

    /// Absolute path from root-first segments.
    pub fn absolute<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            absolute: true,
        }
    }

    /// Parse `/A/B` (absolute) or `A/B` (relative). Empty text is the root.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let absolute = text.is_empty() || text.starts_with('/');
        let segments = text
            .split('/')
            .filter(|s| !s.is_empty())
            .map(SmolStr::new)
            .collect();
        Self { segments, absolute }
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn is_root(&self) -> bool {
        self.absolute && self.segments.is_empty()
    }

    pub fn segments(&self) -> &[SmolStr] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Last segment, if any.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(SmolStr::as_str)
    }

    pub fn child(&self, name: impl Into<SmolStr>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self {
            segments,
            absolute: self.absolute,
        }
    }

    /// The path one level up; `None` for the root or an empty pattern.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
            absolute: self.absolute,
        })
    }

    /// Whether `path` satisfies this pattern.
    pub fn matches(&self, path: &XsPath) -> bool {
        if self.absolute {
            self.segments == path.segments
        } else {
            !self.segments.is_empty() && path.segments.ends_with(&self.segments)
        }
    }
}

impl From<&str> for XsPath {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl fmt::Display for XsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}
