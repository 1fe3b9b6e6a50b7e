//! Root providers.

use fsharvest_core::{HarvestError, Root};

/// Supplies the set of top-level roots to traverse.
pub trait RootProvider: Send + Sync {
    /// Enumerate roots. An error aborts the calling operation.
    fn roots(&self) -> Result<Vec<Root>, HarvestError>;
}

/// A fixed, caller-supplied list of roots.
#[derive(Debug, Clone, Default)]
pub struct FixedRoots(Vec<Root>);

impl FixedRoots {
    pub fn new(roots: impl IntoIterator<Item = Root>) -> Self {
        Self(roots.into_iter().collect())
    }
}

impl RootProvider for FixedRoots {
    fn roots(&self) -> Result<Vec<Root>, HarvestError> {
        Ok(self.0.clone())
    }
}

/// The roots of the local machine.
///
/// On Windows these are the mounted drive letters, each labelled with its
/// letter. Elsewhere there is a single root, `/`, labelled `root`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRoots;

impl RootProvider for SystemRoots {
    #[cfg(windows)]
    fn roots(&self) -> Result<Vec<Root>, HarvestError> {
        let roots: Vec<Root> = ('A'..='Z')
            .map(|letter| (letter, format!("{letter}:\\")))
            .filter(|(_, path)| std::path::Path::new(path).exists())
            .map(|(letter, path)| Root::new(letter.to_string(), path))
            .collect();

        if roots.is_empty() {
            return Err(HarvestError::root_enumeration("no logical drives found"));
        }
        Ok(roots)
    }

    #[cfg(not(windows))]
    fn roots(&self) -> Result<Vec<Root>, HarvestError> {
        Ok(vec![Root::new("root", "/")])
    }
}

impl<P: RootProvider + ?Sized> RootProvider for Box<P> {
    fn roots(&self) -> Result<Vec<Root>, HarvestError> {
        (**self).roots()
    }
}
