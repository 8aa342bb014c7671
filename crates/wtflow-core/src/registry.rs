//! スロットレジストリ
//!
//! `{worktree_dir}/.slots.json` に環境名 → スロット番号の対応を保存します。
//! 書き込みは常にファイル全体の上書きで、変更操作の前に必ず再読み込みします。
//! 同時実行に対しては `.slots.lock` へのアドバイザリロックで保護しますが、
//! ロックが取れない場合もロックなしで続行します。

use crate::error::{EnvError, Result};
use crate::model::ProjectConfig;
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SLOTS_FILE: &str = ".slots.json";
const LOCK_FILE: &str = ".slots.lock";

/// 環境名 → スロット番号
pub type SlotMap = BTreeMap<String, u32>;

/// ファイルに永続化されたスロット割り当て
#[derive(Debug, Clone)]
pub struct SlotRegistry {
    storage_dir: PathBuf,
    max_slots: u32,
}

impl SlotRegistry {
    pub fn new(project_root: &Path, worktree_dir: &str, max_slots: u32) -> Self {
        Self {
            storage_dir: project_root.join(worktree_dir),
            max_slots,
        }
    }

    pub fn for_config(project_root: &Path, config: &ProjectConfig) -> Self {
        Self::new(
            project_root,
            &config.project.worktree_dir,
            config.ports.max_worktrees,
        )
    }

    /// レジストリファイルのパス
    pub fn path(&self) -> PathBuf {
        self.storage_dir.join(SLOTS_FILE)
    }

    pub fn max_slots(&self) -> u32 {
        self.max_slots
    }

    /// 現在の割り当てを読み込む
    ///
    /// ファイルが存在しない・読めない・壊れている場合は空のマップを返す。
    /// `1..=max_slots` の外にある記録は読み捨てる。
    pub fn load(&self) -> SlotMap {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Slot registry not found, starting empty");
                return SlotMap::new();
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Slot registry unreadable, starting fresh"
                );
                return SlotMap::new();
            }
        };

        match serde_json::from_str::<SlotMap>(&content) {
            Ok(mut map) => {
                // スロット 0 はメイン環境専用、max_slots 超はポート範囲外
                map.retain(|name, slot| {
                    let in_range = (1..=self.max_slots).contains(slot);
                    if !in_range {
                        warn!(
                            name = %name,
                            slot = *slot,
                            max = self.max_slots,
                            "Dropping out-of-range slot from registry"
                        );
                    }
                    in_range
                });
                map
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Slot registry corrupt, starting fresh");
                SlotMap::new()
            }
        }
    }

    /// 読み取り専用の検索
    pub fn get(&self, name: &str) -> Option<u32> {
        self.load().get(name).copied()
    }

    /// スロットを割り当てる
    ///
    /// 既に割り当て済みなら同じスロットを返す。未割り当てなら
    /// `1..=max_slots` のうち最小の空きスロットを割り当てて保存する。
    #[tracing::instrument(skip(self))]
    pub fn assign(&self, name: &str) -> Result<u32> {
        let _lock = self.lock();
        let mut map = self.load();

        if let Some(slot) = map.get(name) {
            debug!(slot, "Slot already assigned");
            return Ok(*slot);
        }

        let slot = lowest_free_slot(&map, self.max_slots).ok_or(EnvError::SlotsExhausted {
            max: self.max_slots,
        })?;

        map.insert(name.to_string(), slot);
        self.save(&map)?;
        info!(slot, "Assigned slot");
        Ok(slot)
    }

    /// スロットを解放する（未割り当てなら何もしない）
    #[tracing::instrument(skip(self))]
    pub fn release(&self, name: &str) -> Result<()> {
        let _lock = self.lock();
        let mut map = self.load();

        if let Some(slot) = map.remove(name) {
            info!(slot, "Released slot");
        } else {
            debug!("No slot to release");
        }
        self.save(&map)
    }

    fn save(&self, map: &SlotMap) -> Result<()> {
        fs::create_dir_all(&self.storage_dir)?;
        let content = serde_json::to_string_pretty(map)?;
        fs::write(self.path(), content)?;
        debug!(entries = map.len(), "Saved slot registry");
        Ok(())
    }

    /// アドバイザリロックを取得（失敗時はロックなしで続行）
    fn lock(&self) -> Option<RegistryLock> {
        let lock_path = self.storage_dir.join(LOCK_FILE);
        let file = fs::create_dir_all(&self.storage_dir).and_then(|_| {
            OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)
        });

        match file {
            Ok(file) => match FileExt::lock_exclusive(&file) {
                Ok(()) => Some(RegistryLock { file }),
                Err(e) => {
                    warn!(
                        path = %lock_path.display(),
                        error = %e,
                        "Could not lock slot registry, continuing unlocked"
                    );
                    None
                }
            },
            Err(e) => {
                warn!(
                    path = %lock_path.display(),
                    error = %e,
                    "Could not open slot registry lock, continuing unlocked"
                );
                None
            }
        }
    }
}

/// 最小の空きスロット
fn lowest_free_slot(map: &SlotMap, max_slots: u32) -> Option<u32> {
    (1..=max_slots).find(|candidate| !map.values().any(|used| used == candidate))
}

/// ドロップ時にロックを解放する
struct RegistryLock {
    file: File,
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
