use crate::config::Config;
use crate::error::Result;
use crate::events::TargetWindow;
use crate::services::detector::{DetectorTrait, InferenceParams};
use crate::services::frame_source::FrameSourceTrait;
use crate::services::overlay::{OverlayFactory, OverlayLifecycle, OverlaySurfaceTrait};
use crate::services::render::{build_draw_list, DrawList, RenderStyle};
use crate::services::window_locator::WindowLocatorTrait;
use crate::{debug_if_enabled, overlay_error, trace_if_enabled};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use super::pacer::Pace;
use super::state::LoopState;

/// Итог одного тика
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Окно не найдено или свёрнуто: оверлей не трогаем
    Absent,
    /// Окно не в фокусе: показан пустой кадр, захвата и инференса не было
    Unfocused,
    Rendered {
        detections: usize,
        drawn: usize,
        inference: Duration,
    },
    CloseRequested,
}

/// Внешние компоненты, которыми владеет цикл
pub struct Collaborators {
    pub locator: Box<dyn WindowLocatorTrait>,
    pub frame_source: Box<dyn FrameSourceTrait>,
    pub detector: Box<dyn DetectorTrait>,
    pub overlay_factory: Box<dyn OverlayFactory>,
}

/// Единственный поток управления: ожидание цели, затем темп-ограниченные тики
/// track -> capture -> detect -> render до запроса остановки.
///
/// Ошибки стадий внутри тика сводятся в одну точку в `run_until_exit`:
/// восстановимые пишутся в лог и пропускают тик, фатальные завершают цикл.
pub struct LoopController {
    config: Arc<Config>,
    locator: Box<dyn WindowLocatorTrait>,
    frame_source: Box<dyn FrameSourceTrait>,
    detector: Box<dyn DetectorTrait>,
    overlay_factory: Box<dyn OverlayFactory>,
    overlay: OverlayLifecycle,
    params: InferenceParams,
    style: RenderStyle,
    state: LoopState,
    shutdown: watch::Receiver<bool>,
    torn_down: bool,
}

impl LoopController {
    pub fn new(config: Arc<Config>, collaborators: Collaborators, shutdown: watch::Receiver<bool>) -> Self {
        info!(
            "Цикл: цель '{}', {} FPS, локатор {}",
            config.target.window_title,
            config.overlay.target_fps,
            collaborators.locator.name()
        );

        Self {
            params: InferenceParams::from_config(&config),
            style: RenderStyle::from_config(&config),
            state: LoopState::new(&config),
            locator: collaborators.locator,
            frame_source: collaborators.frame_source,
            detector: collaborators.detector,
            overlay_factory: collaborators.overlay_factory,
            overlay: OverlayLifecycle::new(),
            shutdown,
            torn_down: false,
            config,
        }
    }

    /// Работает до Ctrl+C, закрытия оверлея или фатальной ошибки.
    /// Teardown выполняется на любом пути выхода.
    pub async fn run(&mut self) -> Result<()> {
        let result = self.run_until_exit().await;
        self.teardown();
        result
    }

    async fn run_until_exit(&mut self) -> Result<()> {
        let Some(target) = self.wait_for_target().await? else {
            info!("Остановка до появления целевого окна");
            return Ok(());
        };

        info!("Целевое окно найдено: {}", target);
        self.overlay.activate(self.overlay_factory.as_mut(), &target.rect)?;
        self.state.current_rect = Some(target.rect);
        self.state.target_focused = target.focused;

        loop {
            if self.exit_requested() {
                info!("Остановка цикла");
                return Ok(());
            }

            let now = Instant::now();
            if let Pace::Wait(remaining) = self.state.pacer.check(now) {
                sleep(remaining).await;
                continue;
            }

            match self.tick() {
                Ok(outcome) => self.record(now, outcome),
                Err(e) if e.is_fatal() => {
                    error!(stage = e.stage(), "Фатальная ошибка: {}", e);
                    return Err(e);
                }
                Err(e) => warn!(stage = e.stage(), "Тик пропущен: {}", e),
            }

            // однопоточный рантайм: даём отработать задаче Ctrl+C
            tokio::task::yield_now().await;
        }
    }

    /// Опрашивает локатор каждые `wait_interval_ms`, пока окно не появится.
    ///
    /// `Ok(None)` означает, что остановку запросили раньше.
    async fn wait_for_target(&mut self) -> Result<Option<TargetWindow>> {
        let wait_interval = self.config.wait_interval();
        info!("Ожидание окна '{}'...", self.config.target.window_title);

        loop {
            if self.exit_requested() {
                return Ok(None);
            }

            match self.locator.locate(&self.config.target.window_title) {
                Ok(Some(target)) => return Ok(Some(target)),
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!("Поиск окна не удался: {}", e),
            }

            tokio::select! {
                _ = sleep(wait_interval) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        sleep(wait_interval).await;
                    }
                }
            }
        }
    }

    fn tick(&mut self) -> Result<TickOutcome> {
        if active_surface(&mut self.overlay)?.poll_events()? {
            info!("Оверлей закрыт");
            self.state.close_requested = true;
            return Ok(TickOutcome::CloseRequested);
        }

        let Some(target) = self.locator.locate(&self.config.target.window_title)? else {
            if self.state.current_rect.take().is_some() {
                info!("Целевое окно пропало или свёрнуто");
            }
            return Ok(TickOutcome::Absent);
        };
        let rect = target.rect;

        let surface = active_surface(&mut self.overlay)?;
        let (width, height) = surface.size();
        if !rect.same_size(width, height) {
            surface.resize(rect.width, rect.height)?;
        }
        surface.set_position(rect.left, rect.top)?;

        if self.state.current_rect != Some(rect) {
            debug_if_enabled!("Геометрия цели: {}", rect);
            self.state.current_rect = Some(rect);
        }
        if self.state.target_focused != target.focused {
            info!("Фокус целевого окна: {}", target.focused);
            self.state.target_focused = target.focused;
        }

        if !target.focused {
            surface.present(&DrawList::empty(rect.width, rect.height))?;
            return Ok(TickOutcome::Unfocused);
        }

        let frame = self.frame_source.grab(&rect)?;
        let image = frame.to_rgb()?;

        let started = Instant::now();
        let detections = self.detector.infer(&image, &self.params)?;
        let inference = started.elapsed();

        let list = build_draw_list(
            &detections,
            rect.width,
            rect.height,
            self.detector.class_names(),
            &self.style,
        );
        active_surface(&mut self.overlay)?.present(&list)?;

        Ok(TickOutcome::Rendered {
            detections: detections.len(),
            drawn: list.box_count(),
            inference,
        })
    }

    fn record(&mut self, tick_start: Instant, outcome: TickOutcome) {
        let (inference, detections) = match outcome {
            TickOutcome::Rendered {
                detections,
                drawn,
                inference,
            } => {
                trace_if_enabled!("Тик: {} детекций, нарисовано {}", detections, drawn);
                (Some(inference), detections)
            }
            TickOutcome::Absent | TickOutcome::Unfocused => (None, 0),
            TickOutcome::CloseRequested => return,
        };

        self.state
            .diagnostics
            .record_tick(tick_start, inference, detections);
    }

    fn exit_requested(&self) -> bool {
        *self.shutdown.borrow() || self.state.close_requested
    }

    /// Порядок: поверхность и окно оверлея, затем бэкенд захвата
    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        self.overlay.shutdown();
        self.frame_source.release();
        info!(
            "Ресурсы освобождены, всего тиков: {}",
            self.state.diagnostics.frame_counter()
        );
    }
}

impl Drop for LoopController {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn active_surface(overlay: &mut OverlayLifecycle) -> Result<&mut (dyn OverlaySurfaceTrait + 'static)> {
    overlay
        .surface_mut()
        .ok_or_else(|| overlay_error!(internal, "Оверлей не активен"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BoundingBox, Detection, WindowRect};
    use crate::services::detector::ClassNames;
    use crate::services::frame_source::{Frame, PixelFormat};
    use crate::services::render::{colors, DrawCommand};
    use image::RgbImage;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Recorder {
        locates: usize,
        grabs: usize,
        infers: Vec<Instant>,
        presents: Vec<DrawList>,
        resizes: Vec<(u32, u32)>,
        positions: Vec<(u32, u32)>,
        polls: usize,
        teardown: Vec<&'static str>,
    }

    type Shared = Arc<Mutex<Recorder>>;

    struct ScriptedLocator {
        script: VecDeque<Option<TargetWindow>>,
        last: Option<TargetWindow>,
        rec: Shared,
    }

    impl WindowLocatorTrait for ScriptedLocator {
        fn locate(&mut self, _title: &str) -> Result<Option<TargetWindow>> {
            self.rec.lock().locates += 1;
            if let Some(next) = self.script.pop_front() {
                self.last = next;
            }
            Ok(self.last.clone())
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    struct MockFrameSource {
        fail_on: Vec<usize>,
        rec: Shared,
    }

    impl FrameSourceTrait for MockFrameSource {
        fn grab(&mut self, rect: &WindowRect) -> Result<Frame> {
            let index = {
                let mut rec = self.rec.lock();
                rec.grabs += 1;
                rec.grabs - 1
            };
            if self.fail_on.contains(&index) {
                return Err(overlay_error!(capture, "монитор недоступен"));
            }
            let len = (rect.width * rect.height * 4) as usize;
            Frame::new(rect.width, rect.height, PixelFormat::Bgra8, vec![0; len])
        }

        fn release(&mut self) {
            self.rec.lock().teardown.push("capture");
        }
    }

    struct MockDetector {
        detections: Vec<Detection>,
        names: ClassNames,
        rec: Shared,
    }

    impl DetectorTrait for MockDetector {
        fn infer(&mut self, _image: &RgbImage, _params: &InferenceParams) -> Result<Vec<Detection>> {
            self.rec.lock().infers.push(Instant::now());
            Ok(self.detections.clone())
        }

        fn class_names(&self) -> &ClassNames {
            &self.names
        }
    }

    struct MockSurface {
        size: (u32, u32),
        close_after: Option<usize>,
        rec: Shared,
    }

    impl OverlaySurfaceTrait for MockSurface {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn resize(&mut self, width: u32, height: u32) -> Result<()> {
            self.size = (width, height);
            self.rec.lock().resizes.push((width, height));
            Ok(())
        }

        fn set_position(&mut self, left: u32, top: u32) -> Result<()> {
            self.rec.lock().positions.push((left, top));
            Ok(())
        }

        fn poll_events(&mut self) -> Result<bool> {
            let mut rec = self.rec.lock();
            rec.polls += 1;
            Ok(self.close_after.map_or(false, |limit| rec.polls >= limit))
        }

        fn present(&mut self, list: &DrawList) -> Result<()> {
            self.rec.lock().presents.push(list.clone());
            Ok(())
        }

        fn shutdown(&mut self) {
            self.rec.lock().teardown.push("surface");
        }
    }

    struct MockFactory {
        fail: bool,
        close_after: Option<usize>,
        rec: Shared,
    }

    impl OverlayFactory for MockFactory {
        fn create(&mut self, rect: &WindowRect) -> Result<Box<dyn OverlaySurfaceTrait>> {
            if self.fail {
                return Err(overlay_error!(surface, "нет прозрачного визуала"));
            }
            Ok(Box::new(MockSurface {
                size: (rect.width, rect.height),
                close_after: self.close_after,
                rec: self.rec.clone(),
            }))
        }
    }

    struct Setup {
        script: Vec<Option<TargetWindow>>,
        detections: Vec<Detection>,
        close_after: Option<usize>,
        fail_grabs: Vec<usize>,
        fail_overlay: bool,
    }

    impl Setup {
        fn new(script: Vec<Option<TargetWindow>>) -> Self {
            Self {
                script,
                detections: Vec::new(),
                close_after: None,
                fail_grabs: Vec::new(),
                fail_overlay: false,
            }
        }

        fn detections(mut self, detections: Vec<Detection>) -> Self {
            self.detections = detections;
            self
        }

        fn close_after(mut self, polls: usize) -> Self {
            self.close_after = Some(polls);
            self
        }

        fn build(self) -> (LoopController, Shared, watch::Sender<bool>) {
            let rec = Shared::default();
            let (tx, rx) = watch::channel(false);

            let collaborators = Collaborators {
                locator: Box::new(ScriptedLocator {
                    script: self.script.into(),
                    last: None,
                    rec: rec.clone(),
                }),
                frame_source: Box::new(MockFrameSource {
                    fail_on: self.fail_grabs,
                    rec: rec.clone(),
                }),
                detector: Box::new(MockDetector {
                    detections: self.detections,
                    names: ClassNames::coco(),
                    rec: rec.clone(),
                }),
                overlay_factory: Box::new(MockFactory {
                    fail: self.fail_overlay,
                    close_after: self.close_after,
                    rec: rec.clone(),
                }),
            };

            (LoopController::new(test_config(), collaborators, rx), rec, tx)
        }
    }

    fn test_config() -> Arc<Config> {
        let mut config = Config::default();
        config.overlay.target_fps = 50;
        config.overlay.diagnostics_interval = 10;
        config.target.wait_interval_ms = 100;
        Arc::new(config)
    }

    const RECT: WindowRect = WindowRect { left: 100, top: 50, width: 800, height: 600 };

    fn window(rect: WindowRect, focused: bool) -> Option<TargetWindow> {
        Some(TargetWindow::new("AssaultCube".to_string(), rect).with_focus(focused))
    }

    fn person(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> Detection {
        Detection::new(BoundingBox::new(x1, y1, x2, y2), 0, confidence)
    }

    #[tokio::test(start_paused = true)]
    async fn test_focused_target_renders_detections() {
        let (mut controller, rec, _tx) = Setup::new(vec![window(RECT, true)])
            .detections(vec![person(10.0, 10.0, 50.0, 50.0, 0.85)])
            .close_after(4)
            .build();

        controller.run().await.unwrap();

        let rec = rec.lock();
        assert_eq!(rec.grabs, 3);
        assert_eq!(rec.infers.len(), 3);
        assert_eq!(rec.presents.len(), 3);

        let last = rec.presents.last().unwrap();
        assert_eq!((last.width, last.height), (800, 600));
        assert_eq!(last.box_count(), 1);
        assert_eq!(last.labels().collect::<Vec<_>>(), vec!["person: 0.85"]);
        assert!(last.commands.iter().any(|c| matches!(
            c,
            DrawCommand::StrokeRect { color, .. } if *color == colors::CONFIDENT
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_frame_detection_is_dropped() {
        let (mut controller, rec, _tx) = Setup::new(vec![window(RECT, true)])
            .detections(vec![
                person(10.0, 10.0, 900.0, 50.0, 0.9),
                person(20.0, 20.0, 60.0, 60.0, 0.3),
            ])
            .close_after(2)
            .build();

        controller.run().await.unwrap();

        let rec = rec.lock();
        let list = &rec.presents[0];
        assert_eq!(list.box_count(), 1);
        assert_eq!(list.labels().collect::<Vec<_>>(), vec!["person: 0.30"]);
        assert!(list.commands.iter().any(|c| matches!(
            c,
            DrawCommand::StrokeRect { color, .. } if *color == colors::UNCERTAIN
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unfocused_target_clears_without_capture() {
        let (mut controller, rec, _tx) = Setup::new(vec![window(RECT, false)])
            .detections(vec![person(10.0, 10.0, 50.0, 50.0, 0.85)])
            .close_after(6)
            .build();

        controller.run().await.unwrap();

        let rec = rec.lock();
        assert_eq!(rec.grabs, 0);
        assert!(rec.infers.is_empty());
        assert_eq!(rec.presents.len(), 5);
        assert!(rec.presents.iter().all(DrawList::is_empty));
        assert!(!controller.state.target_focused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_regained_resumes_detection() {
        let (mut controller, rec, _tx) = Setup::new(vec![
            window(RECT, false),
            window(RECT, false),
            window(RECT, true),
        ])
        .detections(vec![person(10.0, 10.0, 50.0, 50.0, 0.85)])
        .close_after(4)
        .build();

        controller.run().await.unwrap();

        let rec = rec.lock();
        assert_eq!(rec.infers.len(), 2);
        assert!(rec.presents[0].is_empty());
        assert_eq!(rec.presents[1].box_count(), 1);
        assert!(rec.resizes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_target_skips_ticks_then_resumes() {
        let mut script = vec![window(RECT, true), window(RECT, true)];
        script.extend(std::iter::repeat(None).take(5));
        script.push(window(RECT, true));

        let (mut controller, rec, _tx) = Setup::new(script)
            .detections(vec![person(10.0, 10.0, 50.0, 50.0, 0.85)])
            .close_after(10)
            .build();

        controller.run().await.unwrap();

        let rec = rec.lock();
        // 1 тик с окном, 5 без окна, затем 3 с окном
        assert_eq!(rec.locates, 10);
        assert_eq!(rec.grabs, 4);
        assert_eq!(rec.presents.len(), 4);
        assert_eq!(rec.positions.len(), 4);
        assert!(rec.presents.iter().all(|list| list.box_count() == 1));
        assert_eq!(controller.state.current_rect, Some(RECT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_geometry_follows_target() {
        let moved = WindowRect { left: 300, top: 20, ..RECT };
        let grown = WindowRect { width: 1024, height: 768, ..moved };

        let (mut controller, rec, _tx) = Setup::new(vec![
            window(RECT, true),
            window(RECT, true),
            window(RECT, true),
            window(moved, true),
            window(grown, true),
        ])
        .close_after(5)
        .build();

        controller.run().await.unwrap();

        let rec = rec.lock();
        assert_eq!(rec.positions, vec![(100, 50), (100, 50), (300, 20), (300, 20)]);
        assert_eq!(rec.resizes, vec![(1024, 768)]);
        let last = rec.presents.last().unwrap();
        assert_eq!((last.width, last.height), (1024, 768));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_failure_skips_only_that_tick() {
        let mut setup = Setup::new(vec![window(RECT, true)]).close_after(5);
        setup.fail_grabs = vec![1];
        let (mut controller, rec, _tx) = setup.build();

        controller.run().await.unwrap();

        let rec = rec.lock();
        assert_eq!(rec.grabs, 4);
        assert_eq!(rec.infers.len(), 3);
        assert_eq!(rec.presents.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlay_creation_failure_is_fatal() {
        let mut setup = Setup::new(vec![window(RECT, true)]);
        setup.fail_overlay = true;
        let (mut controller, rec, _tx) = setup.build();

        let err = controller.run().await.unwrap_err();
        assert!(err.is_fatal());

        let rec = rec.lock();
        assert_eq!(rec.grabs, 0);
        assert_eq!(rec.teardown, vec!["capture"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_order_and_once() {
        let (mut controller, rec, _tx) = Setup::new(vec![window(RECT, true)])
            .close_after(2)
            .build();

        controller.run().await.unwrap();
        drop(controller);

        assert_eq!(rec.lock().teardown, vec!["surface", "capture"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_while_waiting_for_target() {
        let (mut controller, rec, tx) = Setup::new(vec![None]).build();

        tokio::spawn(async move {
            sleep(Duration::from_millis(350)).await;
            let _ = tx.send(true);
        });

        controller.run().await.unwrap();

        let rec = rec.lock();
        assert!(rec.locates >= 3, "{}", rec.locates);
        assert!(rec.presents.is_empty());
        assert_eq!(rec.teardown, vec!["capture"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_signal_stops_running_loop() {
        let (mut controller, rec, tx) = Setup::new(vec![window(RECT, true)]).build();

        tokio::spawn(async move {
            sleep(Duration::from_millis(100)).await;
            let _ = tx.send(true);
        });

        controller.run().await.unwrap();

        let rec = rec.lock();
        assert!(rec.presents.len() >= 4, "{}", rec.presents.len());
        assert_eq!(rec.teardown, vec!["surface", "capture"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_period_follows_budget() {
        let (mut controller, rec, _tx) = Setup::new(vec![window(RECT, true)])
            .close_after(7)
            .build();

        controller.run().await.unwrap();

        let budget = Duration::from_millis(20);
        let rec = rec.lock();
        assert_eq!(rec.infers.len(), 6);
        for pair in rec.infers.windows(2) {
            let period = pair[1] - pair[0];
            assert!(period >= budget && period <= budget + Duration::from_millis(1), "{:?}", period);
        }
        assert_eq!(controller.state.diagnostics.frame_counter(), 6);
    }
}
