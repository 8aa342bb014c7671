//! 待機プリミティブ
//!
//! ポーリングはすべてここを経由する。

use std::thread::sleep;
use std::time::{Duration, Instant};

/// `probe` が true を返すまで `poll_interval` ごとに繰り返す
///
/// タイムアウトまでに満たされなければ false を返す。
/// `probe` は少なくとも1回は呼ばれる。
pub fn wait_until<F>(poll_interval: Duration, timeout: Duration, mut probe: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if probe() {
            return true;
        }

        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep(poll_interval.min(deadline - now));
    }
}
