use std::collections::HashMap;

use super::error::ImportError;
use super::import_config::ImportSpec;

/// Mapping from canonical field name to the column index that carries it in
/// this particular file. Fields with no matching header are simply absent.
#[derive(Debug)]
pub struct ResolvedColumns {
    by_field: HashMap<&'static str, usize>,
}

impl ResolvedColumns {
    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.by_field.get(field).copied()
    }
}

/// Resolve the file's actual headers against the import type's alias
/// tables. For each canonical field the aliases are tried in priority
/// order and the first one present wins; matching is case-sensitive and
/// exact, never fuzzy, so a wrong column is never imported silently.
///
/// Fails with the missing canonical fields and the headers actually found
/// when the required set is not satisfied.
pub fn resolve(spec: &ImportSpec, headers: &[String]) -> Result<ResolvedColumns, ImportError> {
    let mut by_field = HashMap::new();
    let mut missing = Vec::new();

    for field in spec.fields {
        let position = field
            .aliases
            .iter()
            .find_map(|alias| headers.iter().position(|h| h == alias));
        match position {
            Some(idx) => {
                by_field.insert(field.name, idx);
            }
            None if field.required => missing.push(field.name.to_string()),
            None => {}
        }
    }

    if !missing.is_empty() {
        return Err(ImportError::MissingColumns {
            missing,
            found: headers.to_vec(),
        });
    }

    Ok(ResolvedColumns { by_field })
}
