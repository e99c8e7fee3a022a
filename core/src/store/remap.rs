//! Applying a [`RemapTable`] to every token the store holds

use std::collections::BTreeMap;

use crate::entity::EntityToken;
use crate::remap::{RemapError, RemapStats, RemapTable, UnmappedPolicy};
use crate::value::ScriptValue;

use super::ScriptStore;

impl ScriptStore {
    /// Rewrite every entity token in the store through `table`
    ///
    /// Covers entity-state keys, list entries, and entity references nested
    /// in any stored value. Values are carried over unchanged; only tokens
    /// move. Tokens the table does not mention are handled per `policy`.
    ///
    /// The store is left untouched if an error is returned.
    pub fn remap_all(
        &mut self,
        table: &RemapTable,
        policy: UnmappedPolicy,
    ) -> Result<RemapStats, RemapError> {
        let (remapped, stats) = self.remapped(table, policy)?;
        *self = remapped;
        Ok(stats)
    }

    /// Build a remapped copy of the store
    pub fn remapped(
        &self,
        table: &RemapTable,
        policy: UnmappedPolicy,
    ) -> Result<(Self, RemapStats), RemapError> {
        let mut stats = RemapStats::default();

        let mut script = self.script.clone();
        for (script_id, value) in script.iter_mut() {
            rewrite_value(script_id, value, table, policy, &mut stats)?;
        }

        let mut entity = BTreeMap::new();
        for (script_id, states) in &self.entity {
            let mut rekeyed = BTreeMap::new();
            for (token, value) in states {
                let Some(new) = translate(script_id, table, policy, *token, &mut stats)? else {
                    stats.dropped_states += 1;
                    continue;
                };
                let mut value = value.clone();
                rewrite_value(script_id, &mut value, table, policy, &mut stats)?;
                if rekeyed.insert(new, value).is_some() {
                    return Err(RemapError::Collision {
                        script: script_id.clone(),
                        from: *token,
                        to: new,
                    });
                }
            }
            if !rekeyed.is_empty() {
                entity.insert(script_id.clone(), rekeyed);
            }
        }

        let mut lists = self.lists.clone();
        for (script_id, named) in lists.iter_mut() {
            for tokens in named.values_mut() {
                let before = tokens.len();
                let mut rewritten = Vec::with_capacity(before);
                for token in tokens.iter() {
                    if let Some(new) = translate(script_id, table, policy, *token, &mut stats)? {
                        rewritten.push(new);
                    }
                }
                stats.dropped_list_entries += before - rewritten.len();
                *tokens = rewritten;
            }
        }

        Ok((
            Self {
                script,
                entity,
                lists,
            },
            stats,
        ))
    }
}

/// Translate one token, refusing to let a kept token alias a remapped one
fn translate(
    script: &str,
    table: &RemapTable,
    policy: UnmappedPolicy,
    token: EntityToken,
    stats: &mut RemapStats,
) -> Result<Option<EntityToken>, RemapError> {
    let Some(new) = table.translate(token, policy) else {
        return Ok(None);
    };
    if table.get(token).is_none()
        && let Some(source) = table.source_of(token)
    {
        return Err(RemapError::Collision {
            script: script.to_owned(),
            from: source,
            to: token,
        });
    }
    if new != token {
        stats.remapped += 1;
    }
    Ok(Some(new))
}

fn rewrite_value(
    script: &str,
    value: &mut ScriptValue,
    table: &RemapTable,
    policy: UnmappedPolicy,
    stats: &mut RemapStats,
) -> Result<(), RemapError> {
    let mut failure = None;
    value.rewrite_entities(&mut |token| {
        if failure.is_some() {
            return Some(token);
        }
        match translate(script, table, policy, token, stats) {
            Ok(None) => {
                stats.cleared_references += 1;
                None
            }
            Ok(new) => new,
            Err(e) => {
                failure = Some(e);
                Some(token)
            }
        }
    });
    failure.map_or(Ok(()), Err)
}
