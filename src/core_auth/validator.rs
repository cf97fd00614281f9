use crate::core_auth::passwd::PasswdEntry;
use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

enum Secret {
    Plain(String),
    Entry(PasswdEntry),
}

/// Answers "does user X exist" and "are these credentials valid".
///
/// User names are case-insensitive. Three construction modes:
/// a passwd file of `user:bcrypt-hash` lines, a fixed `user/password`
/// pair, or the fallback that derives one account per first-level
/// subdirectory of the sandbox root (user name == password).
pub struct SimpleValidator {
    users: HashMap<String, Secret>,
}

impl SimpleValidator {
    pub fn from_passwd_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read passwd file: {}", path))?;

        let mut users = HashMap::new();
        for line in content.lines() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            match PasswdEntry::from_line(line) {
                Some(entry) => {
                    users.insert(
                        entry.get_username().to_uppercase(),
                        Secret::Entry(entry),
                    );
                }
                None => warn!("Skipping malformed passwd line: {}", line),
            }
        }
        info!("Loaded {} user(s) from {}", users.len(), path);
        Ok(Self { users })
    }

    pub fn from_user_pass(user: &str, password: &str) -> Self {
        let mut users = HashMap::new();
        users.insert(user.to_uppercase(), Secret::Plain(password.to_string()));
        Self { users }
    }

    pub fn from_root(root: &Path) -> Self {
        let mut users = HashMap::new();
        if let Ok(entries) = fs::read_dir(root) {
            for entry in entries.flatten() {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                if !is_dir {
                    continue;
                }
                if let Ok(name) = entry.file_name().into_string() {
                    users.insert(name.to_uppercase(), Secret::Plain(name));
                }
            }
        }
        info!("Derived {} user(s) from the root directory", users.len());
        Self { users }
    }

    pub fn user_exists(&self, user: &str) -> bool {
        self.users.contains_key(&user.to_uppercase())
    }

    pub fn credentials_valid(&self, user: &str, password: &str) -> bool {
        match self.users.get(&user.to_uppercase()) {
            Some(Secret::Plain(expected)) => expected == password,
            Some(Secret::Entry(entry)) => entry.verify(password),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_pair_matches_case_insensitive_user() {
        let v = SimpleValidator::from_user_pass("anon", "anon");
        assert!(v.user_exists("ANON"));
        assert!(v.credentials_valid("Anon", "anon"));
        assert!(!v.credentials_valid("anon", "other"));
        assert!(!v.user_exists("nobody"));
    }

    #[test]
    fn root_mode_derives_users_from_subdirectories() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("alice")).unwrap();
        fs::create_dir(root.path().join("bob")).unwrap();
        fs::write(root.path().join("not-a-user.txt"), b"x").unwrap();

        let v = SimpleValidator::from_root(root.path());
        assert!(v.user_exists("alice"));
        assert!(v.credentials_valid("BOB", "bob"));
        assert!(!v.user_exists("not-a-user.txt"));
    }

    #[test]
    fn passwd_file_mode_verifies_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("passwd");
        let hash = bcrypt::hash("letmein", 4).unwrap();
        fs::write(&path, format!("# users\ncarol:{hash}\nbroken line\n")).unwrap();

        let v = SimpleValidator::from_passwd_file(path.to_str().unwrap()).unwrap();
        assert!(v.user_exists("carol"));
        assert!(v.credentials_valid("carol", "letmein"));
        assert!(!v.credentials_valid("carol", "wrong"));
    }
}
