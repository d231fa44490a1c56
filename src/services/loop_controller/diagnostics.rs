use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Снимок метрик за окно из `interval` тиков
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticsReport {
    pub fps: f64,
    pub inference_ms: f64,
    pub frame_ms: f64,
    pub detections: usize,
}

/// Счётчик тиков и оценка частоты кадров.
///
/// Каждые `interval` тиков пишет одну info-строку с частотой, временем
/// инференса и временем кадра.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    interval: u64,
    frame_counter: u64,
    window_start: Option<Instant>,
    fps_estimate: f64,
    last_inference_ms: f64,
}

impl Diagnostics {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            frame_counter: 0,
            window_start: None,
            fps_estimate: 0.0,
            last_inference_ms: 0.0,
        }
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Учитывает завершённый тик, начавшийся в `tick_start`.
    ///
    /// `inference` пуст для тиков без захвата (окно не в фокусе или отсутствует).
    pub fn record_tick(
        &mut self,
        tick_start: Instant,
        inference: Option<Duration>,
        detections: usize,
    ) -> Option<DiagnosticsReport> {
        let window_start = *self.window_start.get_or_insert(tick_start);
        self.frame_counter += 1;

        if let Some(inference) = inference {
            self.last_inference_ms = inference.as_secs_f64() * 1000.0;
        }

        if self.frame_counter % self.interval != 0 {
            return None;
        }

        let now = Instant::now();
        let elapsed = now.saturating_duration_since(window_start).as_secs_f64();
        if elapsed > 0.0 {
            self.fps_estimate = self.interval as f64 / elapsed;
        }
        self.window_start = Some(now);

        let report = DiagnosticsReport {
            fps: self.fps_estimate,
            inference_ms: self.last_inference_ms,
            frame_ms: now.saturating_duration_since(tick_start).as_secs_f64() * 1000.0,
            detections,
        };

        info!(
            fps = %format!("{:.1}", report.fps),
            inference_ms = %format!("{:.1}", report.inference_ms),
            frame_ms = %format!("{:.1}", report.frame_ms),
            detections = report.detections,
            "Диагностика"
        );

        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_reports_every_interval_ticks() {
        let mut diagnostics = Diagnostics::new(3);
        let mut reports = Vec::new();

        for _ in 0..7 {
            let start = Instant::now();
            tokio::time::advance(Duration::from_millis(10)).await;
            if let Some(report) = diagnostics.record_tick(start, Some(Duration::from_millis(4)), 2) {
                reports.push(report);
            }
        }

        assert_eq!(reports.len(), 2);
        assert_eq!(diagnostics.frame_counter(), 7);

        let report = reports[0];
        assert!((report.fps - 100.0).abs() < 0.5, "{}", report.fps);
        assert!((report.inference_ms - 4.0).abs() < 1e-6);
        assert!((report.frame_ms - 10.0).abs() < 1e-6);
        assert_eq!(report.detections, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skipped_inference_keeps_last_value() {
        let mut diagnostics = Diagnostics::new(100);
        let start = Instant::now();

        diagnostics.record_tick(start, Some(Duration::from_millis(12)), 1);
        diagnostics.record_tick(start, None, 0);

        assert!((diagnostics.last_inference_ms - 12.0).abs() < 1e-6);
        assert_eq!(diagnostics.fps_estimate, 0.0);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let mut diagnostics = Diagnostics::new(0);
        assert!(diagnostics.record_tick(Instant::now(), None, 0).is_some());
    }
}
