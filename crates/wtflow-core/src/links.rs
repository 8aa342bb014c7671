//! ローカルパッケージリンクの掃除
//!
//! 書き換えルール `from → to` でリンクされた `node_modules/{to}` を削除し、
//! 通常のパッケージ解決に戻します。

use crate::lifecycle::LinkCleaner;
use crate::model::RewriteRule;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct NodeModulesLinkCleaner;

impl LinkCleaner for NodeModulesLinkCleaner {
    fn clean(&self, dir: &Path, rules: &[RewriteRule]) -> Result<usize> {
        let mut removed = 0;
        for rule in rules {
            let target = dir.join("node_modules").join(&rule.to);
            // リンク切れのシンボリックリンクも対象
            let Ok(metadata) = fs::symlink_metadata(&target) else {
                continue;
            };

            let result = if metadata.is_dir() {
                fs::remove_dir_all(&target)
            } else {
                fs::remove_file(&target)
            };
            result.with_context(|| format!("{} を削除できませんでした", target.display()))?;

            debug!(path = %target.display(), "Removed local link");
            removed += 1;
        }
        Ok(removed)
    }
}
