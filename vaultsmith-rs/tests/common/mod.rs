//! Shared fixture vault for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vaultsmith::{Config, Vault};

pub const HOME: &str = "---\ntags: [hub]\n---\n# Home\n\nStart at [[Alpha]] or [[Beta]].\nAlso [gamma](Projects/Gamma.md) and [[Missing Page]].\n![[diagram.png]]\n";

pub const ALPHA: &str = "# Alpha\n\n## Tasks\n- [ ] Write draft ⏫ 📅 2025-01-10\n- [x] Kickoff ✅ 2025-01-02\n\n## Notes\nstatus:: active\nBack to [[Home]]. ^anchor\n";

pub const BOARD: &str = "---\nkanban-plugin: basic\n---\n\n## Todo\n\n- [ ] Draft post\n- [ ] Fix bug #urgent\n\n## Done\n\n**Complete**\n- [x] Ship v1\n";

pub const MAP: &str = "{\n\t\"nodes\":[\n\t\t{\"id\":\"a\",\"type\":\"text\",\"text\":\"Start\",\"x\":0,\"y\":0,\"width\":250,\"height\":60},\n\t\t{\"id\":\"b\",\"type\":\"file\",\"file\":\"Projects/Alpha.md\",\"x\":300,\"y\":0,\"width\":400,\"height\":400}\n\t],\n\t\"edges\":[\n\t\t{\"id\":\"e1\",\"fromNode\":\"a\",\"toNode\":\"b\"}\n\t]\n}\n";

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A small vault with links, tasks, a board and a diagram.
///
/// Graph: Home -> Alpha, Beta, Gamma; Alpha -> Home; Gamma -> Alpha.
/// Lonely and Board have no links. Home also links to a missing page.
pub fn create_test_vault() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "Home.md", HOME);
    write(root, "Projects/Alpha.md", ALPHA);
    write(root, "Projects/Gamma.md", "Links to [[Alpha]] #project/active\n");
    write(root, "Beta.md", "# Beta\n\nJust text #project\n");
    write(root, "Lonely.md", "Nobody links here.\n");
    write(root, "Board.md", BOARD);
    write(root, "Map.canvas", MAP);
    write(root, ".obsidian/workspace.md", "[[Home]]\n");
    temp
}

pub fn open(temp: &TempDir) -> Vault {
    Vault::new(temp.path(), Config::default()).unwrap()
}

pub fn read(temp: &TempDir, relative: &str) -> String {
    fs::read_to_string(temp.path().join(relative)).unwrap()
}
