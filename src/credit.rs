use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/////////////////////////////////////////////// Role ///////////////////////////////////////////////

/// The part a person played in making a film.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Producer credit.
    Producer,
    /// Director credit.
    Director,
    /// Writer credit.
    Writer,
    /// Editor credit.
    Editor,
    /// On-screen cast credit.
    Cast,
    /// Music credit.
    Musician,
}

impl Role {
    /// Every role, in display order.
    pub const ALL: [Role; 6] = [
        Role::Producer,
        Role::Director,
        Role::Writer,
        Role::Editor,
        Role::Cast,
        Role::Musician,
    ];

    /// The value stored in the `credit.role` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Producer => "producer",
            Role::Director => "director",
            Role::Writer => "writer",
            Role::Editor => "editor",
            Role::Cast => "cast",
            Role::Musician => "musician",
        }
    }

    /// The name of the relation on a film, e.g. `producers`.
    pub fn film_field(self) -> &'static str {
        match self {
            Role::Producer => "producers",
            Role::Director => "directors",
            Role::Writer => "writers",
            Role::Editor => "editors",
            Role::Cast => "cast",
            Role::Musician => "musicians",
        }
    }

    /// The name of the reverse relation on a person, e.g. `producer_credits`.
    pub fn person_field(self) -> &'static str {
        match self {
            Role::Producer => "producer_credits",
            Role::Director => "director_credits",
            Role::Writer => "writer_credits",
            Role::Editor => "editor_credits",
            Role::Cast => "cast_credits",
            Role::Musician => "musician_credits",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown credit role: {}", s))
    }
}

////////////////////////////////////////////// Credits /////////////////////////////////////////////

/// Relation sets to write, keyed by role.
///
/// A role that was never set is left alone by an update. Setting a role to
/// `None` stores the empty set for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credits {
    roles: BTreeMap<Role, Vec<i64>>,
}

impl Credits {
    /// Creates an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the ids for `role`; `None` normalizes to the empty set.
    pub fn set(&mut self, role: Role, ids: Option<Vec<i64>>) {
        self.roles.insert(role, ids.unwrap_or_default());
    }

    /// Builder form of [`Credits::set`].
    pub fn with(mut self, role: Role, ids: Option<Vec<i64>>) -> Self {
        self.set(role, ids);
        self
    }

    /// The ids set for `role`, or `None` if the role was never set.
    pub fn get(&self, role: Role) -> Option<&[i64]> {
        self.roles.get(&role).map(Vec::as_slice)
    }

    /// The ids set for `role`, treating an unset role as empty.
    pub fn ids(&self, role: Role) -> &[i64] {
        self.get(role).unwrap_or(&[])
    }

    /// Iterates over every role that was set.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &[i64])> {
        self.roles.iter().map(|(role, ids)| (*role, ids.as_slice()))
    }

    /// True if no role was set.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Display names to match through the credit table, keyed by role.
///
/// Each name is an independent constraint: a row matches only if it holds a
/// credit to every listed name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreditNames {
    roles: BTreeMap<Role, Vec<String>>,
}

impl CreditNames {
    /// Adds `names` as constraints for `role`.
    pub fn extend(&mut self, role: Role, names: impl IntoIterator<Item = String>) {
        self.roles.entry(role).or_default().extend(names);
    }

    /// Iterates over every `(role, name)` constraint.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.roles
            .iter()
            .flat_map(|(role, names)| names.iter().map(move |name| (*role, name.as_str())))
    }

    /// True if there are no constraints.
    pub fn is_empty(&self) -> bool {
        self.roles.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_column_value() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("gaffer".parse::<Role>().is_err());
    }

    #[test]
    fn field_names() {
        assert_eq!(Role::Cast.film_field(), "cast");
        assert_eq!(Role::Cast.person_field(), "cast_credits");
        assert_eq!(Role::Musician.film_field(), "musicians");
        assert_eq!(Role::Producer.person_field(), "producer_credits");
    }

    #[test]
    fn setting_none_stores_empty_set() {
        for role in Role::ALL {
            let credits = Credits::new().with(role, None);
            assert_eq!(credits.get(role), Some(&[][..]));
        }
    }

    #[test]
    fn unset_role_is_distinct_from_empty() {
        let credits = Credits::new().with(Role::Writer, Some(vec![3, 4]));
        assert_eq!(credits.get(Role::Writer), Some(&[3, 4][..]));
        assert_eq!(credits.get(Role::Editor), None);
        assert_eq!(credits.ids(Role::Editor), &[] as &[i64]);
        assert!(!credits.is_empty());
        assert!(Credits::new().is_empty());
    }

    #[test]
    fn credit_names_flatten() {
        let mut names = CreditNames::default();
        assert!(names.is_empty());
        names.extend(Role::Cast, ["Nicolas Cage".to_string(), "John Travolta".to_string()]);
        names.extend(Role::Director, ["John Woo".to_string()]);
        let pairs: Vec<_> = names.iter().collect();
        assert_eq!(
            pairs,
            vec![
                (Role::Director, "John Woo"),
                (Role::Cast, "Nicolas Cage"),
                (Role::Cast, "John Travolta"),
            ]
        );
    }
}
