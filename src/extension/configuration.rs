//! Mapping of extensions onto deployment roles.

use serde::{Deserialize, Serialize};

use super::{RoleSelector, distinct_roles};
use crate::slot::Slot;

const DEFAULT_ROLE_PREFIX: &str = "Default";

/// Reference to an extension registered with the hosted service.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ExtensionReference {
    /// Extension identifier, unique within the hosted service.
    pub id: String,
    /// Provider namespace of the extension.
    pub provider_namespace: String,
    /// Extension type within the namespace.
    pub extension_type: String,
}

impl ExtensionReference {
    fn is_kind(&self, provider_namespace: &str, extension_type: &str) -> bool {
        self.provider_namespace.eq_ignore_ascii_case(provider_namespace)
            && self.extension_type.eq_ignore_ascii_case(extension_type)
    }
}

/// Extensions mapped onto a single named role.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoleExtensions {
    /// Role name.
    pub role_name: String,
    /// Extensions applied to the role.
    #[serde(default)]
    pub extensions: Vec<ExtensionReference>,
}

/// Extension mapping of one deployment.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ExtensionConfiguration {
    /// Extensions applied to every role.
    #[serde(default)]
    pub all_roles: Vec<ExtensionReference>,
    /// Extensions applied to specific roles.
    #[serde(default)]
    pub named_roles: Vec<RoleExtensions>,
}

/// New configuration produced by [`ExtensionConfiguration::plan_install`],
/// together with the identifiers that must be registered with the service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstallPlan {
    /// Configuration with the extension mapped in.
    pub configuration: ExtensionConfiguration,
    /// Freshly allocated extension identifiers, one per distinct mapped role.
    pub new_ids: Vec<String>,
}

impl ExtensionConfiguration {
    /// Iterates over every extension reference in the configuration.
    pub fn references(&self) -> impl Iterator<Item = &ExtensionReference> {
        self.all_roles.iter().chain(
            self.named_roles
                .iter()
                .flat_map(|role| role.extensions.iter()),
        )
    }

    /// Maps a new extension of the given kind onto `roles`, replacing any
    /// extension of the same kind on those roles.
    ///
    /// Selecting every role also clears the kind from each named role.
    /// Identifiers take the form `{role}-{type}-{slot}-Ext-{n}`, where `n` is
    /// the lowest index not used by this configuration or by `reserved`.
    #[must_use]
    pub fn plan_install(
        &self,
        provider_namespace: &str,
        extension_type: &str,
        slot: Slot,
        roles: &RoleSelector,
        reserved: &[String],
    ) -> InstallPlan {
        let mut configuration = self.clone();
        let mut taken: Vec<String> = self
            .references()
            .map(|reference| reference.id.clone())
            .chain(reserved.iter().cloned())
            .collect();
        let mut new_ids = Vec::new();
        let mut allocate = |role: &str| {
            let id = next_free_id(role, extension_type, slot, &taken);
            taken.push(id.clone());
            new_ids.push(id.clone());
            ExtensionReference {
                id,
                provider_namespace: provider_namespace.to_owned(),
                extension_type: extension_type.to_owned(),
            }
        };

        match roles {
            RoleSelector::AllRoles => {
                configuration = configuration.without_kind(
                    provider_namespace,
                    extension_type,
                    &RoleSelector::AllRoles,
                );
                let reference = allocate(DEFAULT_ROLE_PREFIX);
                configuration.all_roles.push(reference);
            }
            RoleSelector::Named(names) => {
                for name in &distinct_roles(names) {
                    let reference = allocate(name);
                    configuration.replace_on_role(name, reference);
                }
            }
        }

        InstallPlan {
            configuration,
            new_ids,
        }
    }

    /// Removes every extension of the given kind from `roles`.
    ///
    /// Selecting every role clears the kind from the all-roles list and from
    /// each named role. Named roles left without extensions are dropped.
    #[must_use]
    pub fn without_kind(
        &self,
        provider_namespace: &str,
        extension_type: &str,
        roles: &RoleSelector,
    ) -> Self {
        let mut configuration = self.clone();
        let keep = |reference: &ExtensionReference| {
            !reference.is_kind(provider_namespace, extension_type)
        };

        match roles {
            RoleSelector::AllRoles => {
                configuration.all_roles.retain(keep);
                for role in &mut configuration.named_roles {
                    role.extensions.retain(keep);
                }
            }
            RoleSelector::Named(names) => {
                for role in &mut configuration.named_roles {
                    if names
                        .iter()
                        .any(|name| name.eq_ignore_ascii_case(&role.role_name))
                    {
                        role.extensions.retain(keep);
                    }
                }
            }
        }

        configuration
            .named_roles
            .retain(|role| !role.extensions.is_empty());
        configuration
    }

    fn replace_on_role(&mut self, name: &str, reference: ExtensionReference) {
        let existing = self
            .named_roles
            .iter_mut()
            .find(|role| role.role_name.eq_ignore_ascii_case(name));
        if let Some(role) = existing {
            role.extensions.retain(|current| {
                !current.is_kind(&reference.provider_namespace, &reference.extension_type)
            });
            role.extensions.push(reference);
        } else {
            self.named_roles.push(RoleExtensions {
                role_name: name.to_owned(),
                extensions: vec![reference],
            });
        }
    }
}

fn next_free_id(role: &str, extension_type: &str, slot: Slot, taken: &[String]) -> String {
    let prefix = format!("{role}-{extension_type}-{}-Ext-", slot.title());
    let mut index = 0_usize;
    loop {
        let candidate = format!("{prefix}{index}");
        if !taken
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(&candidate))
        {
            return candidate;
        }
        index += 1;
    }
}
