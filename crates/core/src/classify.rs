use crate::ignore::IgnoreCatalog;
use crate::model::{Blob, ClassificationResult};
use crate::registry::SectionRegistry;

#[derive(Debug, Clone)]
pub struct Classifier {
    catalog: IgnoreCatalog,
    registry: SectionRegistry,
}

impl Classifier {
    pub fn new(catalog: IgnoreCatalog, registry: SectionRegistry) -> Self {
        Self { catalog, registry }
    }

    pub fn android_default() -> Self {
        Self::new(IgnoreCatalog::android_default(), SectionRegistry::builtin())
    }

    pub fn catalog(&self) -> &IgnoreCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    pub fn classify_file(&self, blob: &Blob) -> ClassificationResult<'_> {
        if let Some(rule) = self.catalog.matching_rule(blob) {
            return ClassificationResult::Excluded(rule);
        }
        match self.registry.classify(blob) {
            Some(section) => ClassificationResult::Categorized(section),
            None => ClassificationResult::Uncategorized,
        }
    }
}
