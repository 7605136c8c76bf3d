//! Merging - fold many config files into one
//!
//! Files arrive in precedence order: regular files first, then low
//! precedence ones. Scalars take the first value set. Same-named action
//! types and credentials are combined, and must agree on their identity
//! fields (tag/xmlns, type).

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{ActionType, Config, Credential};
use crate::error::{Result, WeftError};

pub fn merge_configs(configs: Vec<Config>) -> Result<Config> {
    let global = configs.iter().find_map(|c| c.global.clone());
    let kill_name = configs.iter().find_map(|c| c.kill_name.clone());
    let kill_message = configs.iter().find_map(|c| c.kill_message.clone());

    let mut action_groups: IndexMap<String, Vec<ActionType>> = IndexMap::new();
    let mut credential_groups: IndexMap<String, Vec<Credential>> = IndexMap::new();
    for config in configs {
        for action_type in config.action_types {
            action_groups
                .entry(action_type.name.clone())
                .or_default()
                .push(action_type);
        }
        for credential in config.credentials {
            credential_groups
                .entry(credential.name.clone())
                .or_default()
                .push(credential);
        }
    }

    let action_types = action_groups
        .into_iter()
        .map(|(name, group)| merge_action_types(name, group))
        .collect::<Result<Vec<_>>>()?;
    let credentials = credential_groups
        .into_iter()
        .map(|(name, group)| merge_credentials(name, group))
        .collect::<Result<Vec<_>>>()?;

    Ok(Config {
        action_types,
        kill_name,
        kill_message,
        credentials,
        global,
    })
}

fn all_equal<T: PartialEq, U>(items: &[U], key: impl Fn(&U) -> T) -> bool {
    items.windows(2).all(|pair| key(&pair[0]) == key(&pair[1]))
}

/// Definitions are applied lowest precedence first, so later ones win
fn merge_action_types(name: String, mut group: Vec<ActionType>) -> Result<ActionType> {
    if group.len() == 1 {
        if let Some(single) = group.pop() {
            return Ok(single);
        }
    }

    if !all_equal(&group, |a| a.tag.clone()) {
        return Err(WeftError::ConfigConflict {
            kind: "ActionType",
            name,
            field: "Tags",
        });
    }
    if !all_equal(&group, |a| a.xmlns.clone()) {
        return Err(WeftError::ConfigConflict {
            kind: "ActionType",
            name,
            field: "xmlns",
        });
    }

    // Stable: file order is kept within each tier
    group.sort_by_key(|a| !a.low_precedence);
    debug!(action_type = %name, definitions = group.len(), "merging action type");

    let mut merged = ActionType {
        name,
        ..Default::default()
    };
    for definition in group {
        merged.tag = definition.tag;
        merged.xmlns = definition.xmlns;
        merged.cred = definition.cred.or(merged.cred);
        merged.retry_max = definition.retry_max.or(merged.retry_max);
        merged.retry_interval = definition.retry_interval.or(merged.retry_interval);
        merged.configuration_position = definition.configuration_position;
        merged.prepare_position = definition.prepare_position;
        merged.properties.extend(definition.properties);
        merged.default_interpolations.extend(definition.default_interpolations);
        merged.prepare.extend(definition.prepare);
        for (key, values) in definition.default_args {
            merged.default_args.entry(key).or_default().extend(values);
        }
        merged.low_precedence = definition.low_precedence;
    }

    Ok(merged)
}

fn merge_credentials(name: String, mut group: Vec<Credential>) -> Result<Credential> {
    if group.len() == 1 {
        if let Some(single) = group.pop() {
            return Ok(single);
        }
    }

    if !all_equal(&group, |c| c.credential_type.clone()) {
        return Err(WeftError::ConfigConflict {
            kind: "Credential",
            name,
            field: "Type",
        });
    }

    let mut merged = Credential {
        name,
        ..Default::default()
    };
    for credential in group {
        merged.credential_type = credential.credential_type;
        merged.properties.extend(credential.properties);
    }
    Ok(merged)
}
