use serde::{Serialize, Serializer};
use std::fmt;

/// Page section named by the URL fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    Log,
    Targets,
    Details,
    Artifacts,
    Raw,
    /// A fragment no card answers to. It still counts as "an anchor is set".
    Other(String),
}

impl Anchor {
    /// Parse a fragment such as `#targets`. Matching is exact; only the
    /// empty fragment means no anchor.
    pub fn parse(fragment: &str) -> Option<Self> {
        let anchor = match fragment {
            "" => return None,
            "#log" => Anchor::Log,
            "#targets" => Anchor::Targets,
            "#details" => Anchor::Details,
            "#artifacts" => Anchor::Artifacts,
            "#raw" => Anchor::Raw,
            _ => Anchor::Other(fragment.to_string()),
        };
        Some(anchor)
    }

    pub fn as_fragment(&self) -> &str {
        match self {
            Anchor::Log => "#log",
            Anchor::Targets => "#targets",
            Anchor::Details => "#details",
            Anchor::Artifacts => "#artifacts",
            Anchor::Raw => "#raw",
            Anchor::Other(fragment) => fragment,
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_fragment())
    }
}

impl Serialize for Anchor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_fragment())
    }
}

/// Routing input for one render: the fragment and the dense display flag.
///
/// Owned by the shell. Changing it never triggers a fetch; the shell simply
/// re-runs [`crate::router::select_views`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationSelector {
    pub anchor: Option<Anchor>,
    pub dense_mode: bool,
}

impl NavigationSelector {
    pub fn new(fragment: &str, dense_mode: bool) -> Self {
        Self {
            anchor: Anchor::parse(fragment),
            dense_mode,
        }
    }

    /// The "everything on one page" layout. Dense mode never shows it.
    pub fn show_all(&self) -> bool {
        self.anchor.is_none() && !self.dense_mode
    }

    pub fn is(&self, anchor: &Anchor) -> bool {
        self.anchor.as_ref() == Some(anchor)
    }

    pub fn has_anchor(&self) -> bool {
        self.anchor.is_some()
    }
}
