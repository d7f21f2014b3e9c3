//! First-run seeding.

use catalog::{MemoryCatalog, SeedDocument, SeedSummary};

use crate::prefs::Preferences;

/// Import `doc` once, gated by [`Preferences::initialized`].
///
/// Returns `Some` when rows were written. The flag is set on success; the
/// caller persists `prefs`. A catalog that already holds rows is never
/// re-imported (replace semantics would reset collection state), it only
/// gets the flag set.
pub fn ensure_seeded(
    catalog: &MemoryCatalog,
    prefs: &mut Preferences,
    doc: &SeedDocument,
) -> catalog::Result<Option<SeedSummary>> {
    if prefs.initialized {
        log::debug!("Catalog already initialized, skipping seed");
        return Ok(None);
    }
    if !catalog.is_empty() {
        log::warn!("Preferences lost their first-run flag but the catalog has rows; keeping them");
        prefs.initialized = true;
        return Ok(None);
    }
    let summary = doc.import_into(catalog)?;
    prefs.initialized = true;
    Ok(Some(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::CatalogStore;

    const DOC: &str = r#"{"zones": [{"id": 1, "code": "W15", "name": "Engineering Hall",
        "subZones": [{"id": 7, "name": "Lab", "treasures": [
            {"id": 1, "name": "Brass Compass"},
            {"id": 2, "name": "Old Key", "isCollected": true}]}]}]}"#;

    #[test]
    fn seeds_once() {
        let doc = SeedDocument::from_json(DOC).unwrap();
        let catalog = MemoryCatalog::new();
        let mut prefs = Preferences::default();

        let first = ensure_seeded(&catalog, &mut prefs, &doc).unwrap();
        assert_eq!(first.map(|s| s.treasures), Some(2));
        assert!(prefs.initialized);

        catalog.mark_collected(1).unwrap();
        assert_eq!(ensure_seeded(&catalog, &mut prefs, &doc).unwrap(), None);
        assert_eq!(catalog.count_total_collected(), 2);
    }

    #[test]
    fn populated_catalog_is_not_reimported() {
        let doc = SeedDocument::from_json(DOC).unwrap();
        let catalog = MemoryCatalog::new();
        doc.import_into(&catalog).unwrap();
        catalog.mark_collected(1).unwrap();

        let mut prefs = Preferences::default();
        assert_eq!(ensure_seeded(&catalog, &mut prefs, &doc).unwrap(), None);
        assert!(prefs.initialized);
        assert_eq!(catalog.count_total_collected(), 2);
    }
}
