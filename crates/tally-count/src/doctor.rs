use anyhow::Result;
use std::collections::BTreeSet;

pub fn check_classes(classes: &BTreeSet<String>) -> Result<()> {
    anyhow::ensure!(!classes.is_empty(), "classes.to_count must list at least one class");
    for c in classes {
        anyhow::ensure!(!c.trim().is_empty(), "classes.to_count contains an empty label");
    }
    Ok(())
}
