//! First-writer-wins record merge.

use crate::types::record::{EventField, EventRecord};

/// Merge `source` into `target`.
///
/// A field present on `source` fills an unset or empty `target` field. When
/// `target` already holds a different value, it is kept and a
/// `Conflict in <field>: '<old>' vs '<new>'` note is appended to the target's
/// annotation. Lists compare as whole values. Notes carried by `source` are
/// appended to the target's annotation as-is.
///
/// Returns the conflict notes added by this merge.
pub fn merge(target: &mut EventRecord, source: &EventRecord) -> Vec<String> {
    let mut conflicts = Vec::new();

    for field in EventField::ALL {
        let Some(incoming) = source.present(field) else {
            continue;
        };

        match target.present(field) {
            None => {
                target.set(field, incoming);
            }
            Some(existing) if existing != incoming => {
                conflicts.push(format!(
                    "Conflict in {}: '{}' vs '{}'",
                    field, existing, incoming
                ));
            }
            Some(_) => {}
        }
    }

    if let Some(note) = source.error.as_deref() {
        target.annotate(note);
    }
    for conflict in &conflicts {
        target.annotate(conflict);
    }

    conflicts
}
