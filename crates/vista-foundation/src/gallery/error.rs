use std::fmt;

use vista_core::ResolutionError;

use super::patch::PatchOpKind;
use super::toolkit::{ViewId, ViewType};

/// A single item could not be turned into a bound view.
///
/// Build errors are isolated to their item: the slot renders a placeholder
/// and sibling items proceed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildError {
    /// The toolkit refused to create a view of this type.
    Create { view_type: ViewType, reason: String },
    /// A leaf value failed to resolve while binding.
    Bind { source: ResolutionError },
}

impl BuildError {
    pub fn create(view_type: ViewType, reason: impl Into<String>) -> Self {
        BuildError::Create {
            view_type,
            reason: reason.into(),
        }
    }
}

impl From<ResolutionError> for BuildError {
    fn from(source: ResolutionError) -> Self {
        BuildError::Bind { source }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Create { view_type, reason } => {
                write!(f, "failed to create view of type {view_type}: {reason}")
            }
            BuildError::Bind { source } => write!(f, "failed to bind item: {source}"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Create { .. } => None,
            BuildError::Bind { source } => Some(source),
        }
    }
}

/// Misuse of the view pool. Always a programming error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolIntegrityError {
    DoubleRelease { view: ViewId },
    ReleasedWhileBound { view: ViewId },
    AcquiredWhileBound { view: ViewId },
}

impl PoolIntegrityError {
    pub fn view(&self) -> ViewId {
        match *self {
            PoolIntegrityError::DoubleRelease { view }
            | PoolIntegrityError::ReleasedWhileBound { view }
            | PoolIntegrityError::AcquiredWhileBound { view } => view,
        }
    }
}

impl fmt::Display for PoolIntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolIntegrityError::DoubleRelease { view } => {
                write!(f, "view {view} released twice")
            }
            PoolIntegrityError::ReleasedWhileBound { view } => {
                write!(f, "view {view} released while still bound")
            }
            PoolIntegrityError::AcquiredWhileBound { view } => {
                write!(f, "view {view} acquired while still bound")
            }
        }
    }
}

impl std::error::Error for PoolIntegrityError {}

/// A patch script referenced an index outside the sequence it was applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatchInconsistencyError {
    /// Position of the offending op in the script.
    pub op_index: usize,
    pub op: PatchOpKind,
    pub index: usize,
    /// Length of the sequence at the time the op was applied.
    pub len: usize,
}

impl fmt::Display for PatchInconsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "patch op #{} ({}) references index {} in a sequence of length {}",
            self.op_index, self.op, self.index, self.len
        )
    }
}

impl std::error::Error for PatchInconsistencyError {}

/// Errors that abort a whole bind cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GalleryError {
    Resolution(ResolutionError),
    PatchInconsistency(PatchInconsistencyError),
    /// `apply_patch` was called before any gallery was bound.
    NotAttached,
}

impl From<ResolutionError> for GalleryError {
    fn from(err: ResolutionError) -> Self {
        GalleryError::Resolution(err)
    }
}

impl From<PatchInconsistencyError> for GalleryError {
    fn from(err: PatchInconsistencyError) -> Self {
        GalleryError::PatchInconsistency(err)
    }
}

impl fmt::Display for GalleryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GalleryError::Resolution(err) => write!(f, "item resolution failed: {err}"),
            GalleryError::PatchInconsistency(err) => write!(f, "inconsistent patch: {err}"),
            GalleryError::NotAttached => f.write_str("no gallery is bound"),
        }
    }
}

impl std::error::Error for GalleryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GalleryError::Resolution(err) => Some(err),
            GalleryError::PatchInconsistency(err) => Some(err),
            GalleryError::NotAttached => None,
        }
    }
}
