use std::time::{Duration, Instant};

/// 单个处理阶段的计时器，结束时把耗时写入 debug 日志
pub(crate) struct StageTimer {
    stage: &'static str,
    start: Instant,
}

impl StageTimer {
    pub(crate) fn start(stage: &'static str) -> Self {
        log::debug!("[{}] 开始", stage);
        Self {
            stage,
            start: Instant::now(),
        }
    }

    /// 结束计时并返回耗时
    pub(crate) fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        log::debug!(
            "[{}] 完成，耗时 {:.2}ms",
            self.stage,
            elapsed.as_secs_f64() * 1000.0
        );
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reports_elapsed() {
        let timer = StageTimer::start("test");
        std::thread::sleep(Duration::from_millis(2));
        assert!(timer.finish() >= Duration::from_millis(2));
    }
}
