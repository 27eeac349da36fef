#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for `addlink` / `unlink` and the bootstrap document
//! they edit.

mod common;

use common::*;

use cider_cli::commands::links;
use cider_cli::config::{Bootstrap, store};
use cider_cli::error::CiderError;

#[test]
fn addlink_then_unlink_restores_the_original_file() {
    let t = TestHome::new();
    let original = t.file(".vimrc", "set nocompatible");
    let ctx = t.context();

    links::addlink(&ctx, "vim", std::slice::from_ref(&original)).unwrap();

    let stowed = t.settings().symlink_dir().join("vim/.vimrc");
    assert!(links_to(&original, &stowed));
    assert_eq!(
        t.bootstrap().symlinks.get("vim/.*").map(String::as_str),
        Some("~")
    );
    assert_eq!(t.cached_targets(), [original.clone()]);

    links::unlink(&ctx, "vim").unwrap();

    assert!(original.is_file());
    assert!(original.symlink_metadata().unwrap().file_type().is_file());
    assert_eq!(std::fs::read_to_string(&original).unwrap(), "set nocompatible");
    assert!(!t.settings().symlink_dir().join("vim").exists());
    assert!(t.bootstrap().symlinks.is_empty());
    assert!(t.cached_targets().is_empty());
}

#[test]
fn addlink_nested_target_uses_a_directory_rule() {
    let t = TestHome::new();
    let original = t.file(".config/nvim/init.lua", "-- init");
    let ctx = t.context();

    links::addlink(&ctx, "nvim", std::slice::from_ref(&original)).unwrap();

    assert_eq!(
        t.bootstrap().symlinks.get("nvim/*").map(String::as_str),
        Some("~/.config/nvim/")
    );
    links::relink(&ctx, false).unwrap();
    assert!(links_to(
        &original,
        &t.settings().symlink_dir().join("nvim/init.lua")
    ));
}

#[test]
fn addlink_reuses_a_matching_rule() {
    let t = TestHome::new();
    let ctx = t.context();
    let zshrc = t.file(".zshrc", "");
    let zprofile = t.file(".zprofile", "");

    links::addlink(&ctx, "zsh", &[zshrc, zprofile]).unwrap();

    let rules = t.bootstrap().symlinks;
    assert_eq!(rules.len(), 1);
    assert_eq!(rules.get("zsh/.*").map(String::as_str), Some("~"));
}

#[test]
fn addlink_refuses_missing_paths() {
    let t = TestHome::new();
    let err = links::addlink(&t.context(), "vim", &[t.home().join(".nope")]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CiderError>(),
        Some(CiderError::SourceMissing(_))
    ));
    assert!(t.bootstrap().symlinks.is_empty());
}

#[test]
fn addlink_refuses_an_occupied_stow_slot() {
    let t = TestHome::new();
    t.stow("vim/.vimrc", "already stowed");
    let original = t.file(".vimrc", "local");

    let err = links::addlink(&t.context(), "vim", &[original.clone()]).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CiderError>(),
        Some(CiderError::Conflict(_))
    ));
    assert_eq!(std::fs::read_to_string(original).unwrap(), "local");
}

#[test]
fn unlink_unknown_name_is_not_found() {
    let t = TestHome::new();
    let err = links::unlink(&t.context(), "ghost").unwrap_err();
    assert_eq!(err.to_string(), "No symlink found with name: ghost");
}

#[test]
fn unlink_only_releases_its_own_group() {
    let t = TestHome::new();
    let ctx = t.context();
    let vimrc = t.file(".vimrc", "");
    let zshrc = t.file(".zshrc", "");
    links::addlink(&ctx, "vim", &[vimrc.clone()]).unwrap();
    links::addlink(&ctx, "zsh", &[zshrc.clone()]).unwrap();

    links::unlink(&ctx, "vim").unwrap();

    assert!(vimrc.symlink_metadata().unwrap().file_type().is_file());
    assert!(links_to(&zshrc, &t.settings().symlink_dir().join("zsh/.zshrc")));
    assert_eq!(t.bootstrap().symlinks.len(), 1);
    assert_eq!(t.cached_targets(), [zshrc]);
}

// ---------------------------------------------------------------------------
// Document round trips
// ---------------------------------------------------------------------------

#[test]
fn unchanged_modify_leaves_the_file_alone() {
    let t = TestHome::new();
    t.write_bootstrap(&Bootstrap {
        formulas: ["git", "wget"].map(String::from).into(),
        symlinks: [("zsh/.*".to_string(), "~".to_string())].into(),
        ..Bootstrap::default()
    });
    let path = t.settings().bootstrap_file();
    let before = std::fs::read(&path).unwrap();

    let changed = t.settings().modify_bootstrap(|doc| doc).unwrap();

    assert!(!changed);
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn legacy_json_bootstrap_is_kept_as_json() {
    let t = TestHome::new();
    let legacy = t.settings().cider_dir.join("bootstrap.json");
    std::fs::write(&legacy, r#"{"formulas": ["git"], "taps": []}"#).unwrap();

    assert_eq!(t.settings().bootstrap_file(), legacy);
    t.settings()
        .modify_bootstrap(|mut doc| {
            doc.formulas.insert("jq".to_string());
            doc
        })
        .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&legacy).unwrap()).unwrap();
    assert_eq!(written["formulas"], serde_json::json!(["git", "jq"]));
    assert!(!t.settings().cider_dir.join("bootstrap.toml").exists());
}

#[test]
fn malformed_document_names_its_path() {
    let t = TestHome::new();
    let path = t.settings().bootstrap_file();
    std::fs::write(&path, "formulas = [").unwrap();

    let err = store::read(&path, Bootstrap::default()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CiderError>(),
        Some(CiderError::ConfigRead { .. })
    ));
    assert!(err.to_string().contains("bootstrap.toml"));
}
