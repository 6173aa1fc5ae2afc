use std::collections::HashMap;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::SteamError;
use crate::paths::Paths;

/// A Steam user with shortcut information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub has_shortcuts: bool,
}

/// Resolves Steam user ids to display names.
///
/// Implemented by whatever reads Steam's text profile files; the sync core
/// only needs the lookup.
pub trait DisplayNames {
    fn display_name(&self, user_id: &str) -> Option<String>;
}

impl DisplayNames for HashMap<String, String> {
    fn display_name(&self, user_id: &str) -> Option<String> {
        self.get(user_id).cloned()
    }
}

/// Returns the display name for a user, or `"Steam user <id>"` when unknown.
pub fn display_name_or_default(names: &dyn DisplayNames, user_id: &str) -> String {
    names
        .display_name(user_id)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("Steam user {user_id}"))
}

/// Returns a list of Steam users from the userdata directory.
pub fn get_users() -> Result<Vec<User>, SteamError> {
    let paths = Paths::new()?;
    get_users_with_paths(&paths)
}

/// Returns users using the provided `Paths` instance, sorted by id.
pub fn get_users_with_paths(paths: &Paths) -> Result<Vec<User>, SteamError> {
    let user_data_dir = paths.user_data_dir();

    let entries = fs::read_dir(&user_data_dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SteamError::NotFound
        } else {
            SteamError::Io(e.to_string())
        }
    })?;

    let mut users = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SteamError::Io(e.to_string()))?;

        if !entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }

        let name = entry.file_name();
        let name = name.to_string_lossy();

        // "0" is Steam's scratch directory, not an account.
        if name.parse::<u64>().is_err() || name == "0" {
            continue;
        }

        let has_shortcuts = paths.has_shortcuts(&name);
        users.push(User {
            id: name.into_owned(),
            has_shortcuts,
        });
    }

    users.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(users)
}

/// Picks the user to sync: the preferred id if present, otherwise the first
/// user with shortcuts, otherwise the first user.
pub fn select_user(users: &[User], preferred: Option<&str>) -> Result<User, SteamError> {
    if let Some(id) = preferred {
        return users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(SteamError::UserNotFound);
    }

    users
        .iter()
        .find(|u| u.has_shortcuts)
        .or_else(|| users.first())
        .cloned()
        .ok_or(SteamError::UserNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_steam() -> (tempfile::TempDir, Paths) {
        let tmp = tempfile::tempdir().unwrap();
        let userdata = tmp.path().join("userdata");
        fs::create_dir_all(userdata.join("12345").join("config")).unwrap();
        fs::create_dir_all(userdata.join("67890").join("config")).unwrap();
        fs::create_dir_all(userdata.join("0").join("config")).unwrap();
        fs::create_dir_all(userdata.join("anonymous")).unwrap();
        fs::write(
            userdata.join("67890").join("config").join("shortcuts.vdf"),
            b"test",
        )
        .unwrap();
        let paths = Paths::with_base(tmp.path());
        (tmp, paths)
    }

    #[test]
    fn get_users_with_temp_dir() {
        let (_tmp, paths) = fake_steam();
        let users = get_users_with_paths(&paths).unwrap();

        let ids: Vec<_> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["12345", "67890"]);
        assert!(!users[0].has_shortcuts);
        assert!(users[1].has_shortcuts);
    }

    #[test]
    fn missing_userdata_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(tmp.path());
        assert!(matches!(
            get_users_with_paths(&paths),
            Err(SteamError::NotFound)
        ));
    }

    #[test]
    fn select_user_rules() {
        let (_tmp, paths) = fake_steam();
        let users = get_users_with_paths(&paths).unwrap();

        assert_eq!(select_user(&users, None).unwrap().id, "67890");
        assert_eq!(select_user(&users, Some("12345")).unwrap().id, "12345");
        assert!(matches!(
            select_user(&users, Some("999")),
            Err(SteamError::UserNotFound)
        ));
        assert!(matches!(select_user(&[], None), Err(SteamError::UserNotFound)));
    }

    #[test]
    fn display_name_fallback() {
        let mut names = HashMap::new();
        names.insert("1".to_string(), "Deck".to_string());
        names.insert("2".to_string(), "  ".to_string());

        assert_eq!(display_name_or_default(&names, "1"), "Deck");
        assert_eq!(display_name_or_default(&names, "2"), "Steam user 2");
        assert_eq!(display_name_or_default(&names, "3"), "Steam user 3");
    }

    #[test]
    fn user_json_field_names() {
        let user = User {
            id: "123".into(),
            has_shortcuts: true,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"hasShortcuts\""));
    }
}
