use std::cell::Cell;
use std::time::Instant;

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
}

fn is_false(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "n" | "off"
    )
}

/// 性能日志开关：`KPI_PERF_LOG=0` 关闭，默认开启
fn perf_log_enabled() -> bool {
    match std::env::var("KPI_PERF_LOG") {
        Ok(v) => !is_false(&v),
        Err(_) => true,
    }
}

/// 当前线程上活跃的 PerfGuard 嵌套深度
pub fn current_depth() -> u32 {
    PERF_DEPTH.with(|d| d.get())
}

/// 性能统计 Guard：记录 elapsed_ms + 嵌套深度
///
/// 使用方式：
/// ```ignore
/// let _perf = roofing_kpi::perf::PerfGuard::new("compute_funnel");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    depth: u32,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        let depth = PERF_DEPTH.with(|d| {
            let next = d.get().saturating_add(1);
            d.set(next);
            next
        });
        Self {
            op,
            start: Instant::now(),
            depth,
        }
    }

    pub fn op(&self) -> &'static str {
        self.op
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        if perf_log_enabled() {
            let elapsed_ms = self.start.elapsed().as_millis() as u64;
            tracing::info!(
                target: "perf",
                op = self.op,
                elapsed_ms,
                depth = self.depth,
                "done"
            );
        }

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_guards_track_depth() {
        assert_eq!(current_depth(), 0);
        {
            let outer = PerfGuard::new("outer");
            assert_eq!(current_depth(), 1);
            {
                let inner = PerfGuard::new("inner");
                assert_eq!(inner.op(), "inner");
                assert_eq!(current_depth(), 2);
            }
            assert_eq!(outer.op(), "outer");
            assert_eq!(current_depth(), 1);
        }
        assert_eq!(current_depth(), 0);
    }

    #[test]
    fn test_is_false_values() {
        assert!(is_false("0"));
        assert!(is_false(" OFF "));
        assert!(!is_false("1"));
    }
}
