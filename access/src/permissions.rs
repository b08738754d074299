//! Permission sets

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Grants every permission
const WILDCARD: &str = "*";

/// Checks if a single granted permission covers the requested one.
///
/// `*` covers anything, `category:*` covers every permission in `category`.
fn covers(granted: &str, requested: &str) -> bool {
    if granted == WILDCARD || granted == requested {
        return true;
    }

    match granted.strip_suffix(":*") {
        Some(category) => requested
            .split_once(':')
            .is_some_and(|(requested_category, _)| requested_category == category),
        None => false,
    }
}

/// Checks if any of `granted` covers `requested`
pub fn has_permission<I, S>(granted: I, requested: &str) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    granted
        .into_iter()
        .any(|granted| covers(granted.as_ref(), requested))
}

/// Effective permission set of an user
///
/// Deduplicated and ordered, so two sets built from the same strings compare equal regardless of
/// the order they were collected in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeSet<String>);

impl Permissions {
    /// Union of role and user level permissions
    pub fn merge<R, U>(role: R, user: U) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        U: IntoIterator,
        U::Item: Into<String>,
    {
        role.into_iter()
            .map(Into::into)
            .chain(user.into_iter().map(Into::into))
            .collect()
    }

    /// Checks if the set grants `permission`
    pub fn allows(&self, permission: &str) -> bool {
        has_permission(&self.0, permission)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for Permissions {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
