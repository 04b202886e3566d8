use super::EngineSettings;
use super::geometry::{self, GridConfig, Point, Size};
use super::orientation::OrientationEngine;
use super::pointer::PointerTracker;
use super::pool::IndicatorPool;
use super::scheduler::{FrameRequest, FrameScheduler, FrameTick, WorkQueue};
use super::surface::{RenderSurface, SizingSource};

/// Smoothed-pointer movement per frame below which the field counts as settled.
pub const SETTLE_PX: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchJob {
    pub target: Point,
    pub len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(FrameRequest),
    /// The container is not there yet; call `start` again later.
    Deferred,
}

/// One arrow field: a render surface plus everything that keeps its arrows
/// pointed at the pointer.
///
/// All mutation happens through `&mut self` on one thread. Pending batches
/// live in a [`WorkQueue`] that is flushed whenever the indicator set changes
/// or the field is stopped or hidden, so no batch ever touches indicators it
/// was not planned for.
#[derive(Debug)]
pub struct Field<S: RenderSurface> {
    settings: EngineSettings,
    surface: S,
    pool: IndicatorPool<S::Handle>,
    pointer: PointerTracker,
    orientation: OrientationEngine,
    scheduler: FrameScheduler,
    queue: WorkQueue<BatchJob>,
    size: Option<Size>,
    grid: Option<GridConfig>,
    dirty: bool,
    start_deferred: bool,
}

impl<S: RenderSurface> Field<S> {
    pub fn new(settings: EngineSettings, surface: S) -> Self {
        Self {
            pointer: PointerTracker::new(settings.pointer.clone(), Point::default()),
            orientation: OrientationEngine::new(settings.orientation.clone()),
            scheduler: FrameScheduler::new(&settings.frame),
            pool: IndicatorPool::default(),
            queue: WorkQueue::default(),
            surface,
            settings,
            size: None,
            grid: None,
            dirty: false,
            start_deferred: false,
        }
    }

    pub fn start(&mut self, sizing: &impl SizingSource) -> StartOutcome {
        let Some(size) = sizing.container_size() else {
            log::debug!("Container not ready, deferring start");
            self.start_deferred = true;
            return StartOutcome::Deferred;
        };
        self.start_deferred = false;

        self.regenerate(size);
        log::debug!("Field started with {} indicators", self.pool.len());
        StartOutcome::Started(self.scheduler.start())
    }

    /// Tears everything down. Safe to call more than once.
    pub fn stop(&mut self) -> FrameRequest {
        self.start_deferred = false;
        self.queue.cancel_all();
        self.pool.clear(&mut self.surface);
        self.surface.set_highlight(None);
        self.grid = None;
        self.scheduler.stop()
    }

    pub fn resize(&mut self, size: Size) -> FrameRequest {
        if !self.scheduler.is_running() {
            self.size = Some(size);
            return FrameRequest::Keep;
        }
        if self.size == Some(size) {
            return FrameRequest::Keep;
        }

        let stopped = self.scheduler.stop();
        self.queue.cancel_all();
        self.regenerate(size);
        Self::restart(stopped, self.scheduler.start())
    }

    /// Applies new settings and rebuilds the grid under them.
    pub fn reconfigure(&mut self, settings: EngineSettings) -> FrameRequest {
        self.pointer.set_settings(settings.pointer.clone());
        self.orientation.set_settings(settings.orientation.clone());
        self.scheduler.set_settings(&settings.frame);
        self.settings = settings;

        if !self.scheduler.is_running() {
            return FrameRequest::Keep;
        }
        let Some(size) = self.size else {
            return FrameRequest::Keep;
        };

        let stopped = self.scheduler.stop();
        self.queue.cancel_all();
        self.regenerate(size);
        Self::restart(stopped, self.scheduler.start())
    }

    fn restart(stopped: FrameRequest, started: FrameRequest) -> FrameRequest {
        match (stopped, started) {
            (_, FrameRequest::Request) => FrameRequest::Request,
            (FrameRequest::Cancel, _) => FrameRequest::Cancel,
            _ => FrameRequest::Keep,
        }
    }

    fn regenerate(&mut self, size: Size) {
        let plan = geometry::plan(size, &self.settings.density);
        self.pool.rebuild(&mut self.surface, &plan);
        self.orientation.reset();

        if !self.pointer.has_input() {
            self.pointer.recenter(size.center());
        }

        log::debug!(
            "Grid {}x{} ({:?}) at {:.1}px pitch, skip {}: {} of {} cells",
            plan.config.columns,
            plan.config.rows,
            plan.config.size_class,
            plan.config.spacing_x,
            plan.skip,
            plan.anchors.len(),
            plan.config.total_possible(),
        );

        self.size = Some(size);
        self.grid = Some(plan.config);
        self.dirty = true;
    }

    /// A start was deferred and should be retried once the container shows.
    pub fn is_start_deferred(&self) -> bool {
        self.start_deferred
    }

    pub fn set_visible(&mut self, visible: bool) -> FrameRequest {
        if !visible {
            self.queue.cancel_all();
        }
        self.scheduler.set_visible(visible)
    }

    pub fn on_pointer_move(&mut self, at: Point, now_ms: f64) {
        self.pointer.on_pointer_move(at, now_ms);
    }

    pub fn on_touch_move(&mut self, at: Option<Point>, now_ms: f64) {
        if self.pointer.on_touch_move(at, now_ms) {
            self.surface.set_highlight(Some(self.pointer.highlight()));
        }
    }

    /// Display callback body. Advances smoothing, runs the first batch of the
    /// orientation pass inline and queues the rest.
    pub fn on_frame(&mut self, now_ms: f64) -> FrameTick {
        let tick = self.scheduler.on_frame(now_ms);
        if tick != FrameTick::Run {
            return tick;
        }

        let before = self.pointer.smoothed();
        let target = self.pointer.step();
        self.surface.set_highlight(Some(self.pointer.highlight()));

        let settled = before.distance(target) < SETTLE_PX && !self.pointer.is_moving(now_ms);
        if settled && !self.dirty && self.queue.is_empty() {
            return tick;
        }

        // A pass still in flight is superseded; the orientation cursor keeps
        // its place so the next pass picks up where that one stopped.
        self.queue.cancel_all();
        self.dirty = false;

        let total = self.pool.len();
        if total == 0 {
            return tick;
        }

        let len = self.orientation.batch_size(total);
        for _ in 1..self.orientation.batches_for(total) {
            self.queue.schedule(BatchJob { target, len });
        }
        self.orientation
            .run_batch(&mut self.pool, &mut self.surface, target, len);

        tick
    }

    /// Runs one queued batch. Returns whether more are waiting.
    pub fn run_next_batch(&mut self) -> bool {
        if let Some((_, job)) = self.queue.pop() {
            self.orientation
                .run_batch(&mut self.pool, &mut self.surface, job.target, job.len);
        }
        !self.queue.is_empty()
    }

    pub fn has_pending_batches(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn pool(&self) -> &IndicatorPool<S::Handle> {
        &self.pool
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn grid(&self) -> Option<&GridConfig> {
        self.grid.as_ref()
    }

    pub fn size(&self) -> Option<Size> {
        self.size
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::orientation::angle_toward;
    use crate::engine::surface::testing::RecordingSurface;

    fn field() -> Field<RecordingSurface> {
        Field::new(EngineSettings::default(), RecordingSurface::default())
    }

    fn started(size: Size) -> Field<RecordingSurface> {
        let mut f = field();
        assert_eq!(
            f.start(&Some(size)),
            StartOutcome::Started(FrameRequest::Request)
        );
        f
    }

    fn run_frame(f: &mut Field<RecordingSurface>, now_ms: f64) -> FrameTick {
        let tick = f.on_frame(now_ms);
        while f.run_next_batch() {}
        tick
    }

    #[test]
    fn test_desktop_reference_field() {
        let f = started(Size::new(1024.0, 768.0));

        assert_eq!(f.pool().len(), 2352);
        assert_eq!(f.surface().insert_calls, 1);
        assert_eq!(f.grid().map(|g| (g.columns, g.rows)), Some((56, 42)));
    }

    #[test]
    fn test_opposite_corners_point_in_opposite_directions() {
        // 56 x 42 cells of 18px tile 1008 x 756 exactly, so the grid is symmetric
        // about the container centre where the pointer starts.
        let mut f = started(Size::new(1008.0, 756.0));
        assert_eq!(f.pointer().smoothed(), Point::new(504.0, 378.0));

        assert_eq!(run_frame(&mut f, 0.0), FrameTick::Run);

        let first = f.pool().get(0).map(|i| i.angle).unwrap();
        let last = f.pool().get(f.pool().len() - 1).map(|i| i.angle).unwrap();
        let diff = (first - last).rem_euclid(360.0);
        assert!((diff - 180.0).abs() < 1e-9, "diff {diff}");
        assert_eq!(f.surface().angle(0), first);
    }

    #[test]
    fn test_frame_work_is_split_into_batches() {
        let mut f = started(Size::new(1024.0, 768.0));

        f.on_pointer_move(Point::new(-100.0, -1000.0), 0.0);
        f.on_frame(0.0);

        assert_eq!(f.surface().writes.len(), 200);
        assert!(f.has_pending_batches());

        let mut turns = 0;
        while f.run_next_batch() {
            turns += 1;
        }
        assert_eq!(turns, 10);
        assert_eq!(f.surface().writes.len(), 2352);
    }

    #[test]
    fn test_orientation_uses_smoothed_position() {
        let mut f = started(Size::new(1008.0, 756.0));
        f.on_pointer_move(Point::new(1000.0, 9.0), 0.0);
        run_frame(&mut f, 0.0);

        let smoothed = f.pointer().smoothed();
        assert_ne!(smoothed, Point::new(1000.0, 9.0));

        let indicator = f.pool().get(0).unwrap();
        assert_eq!(indicator.angle, angle_toward(indicator.anchor, smoothed, 0.0));
    }

    #[test]
    fn test_hidden_field_does_no_angle_writes() {
        let mut f = started(Size::new(1024.0, 768.0));
        f.on_frame(0.0);
        assert!(f.has_pending_batches());

        assert_eq!(f.set_visible(false), FrameRequest::Cancel);
        let writes = f.surface().writes.len();

        f.on_pointer_move(Point::new(0.0, 0.0), 10.0);
        assert!(!f.run_next_batch());
        assert_eq!(f.on_frame(50.0), FrameTick::Suspended);
        assert_eq!(f.surface().writes.len(), writes);

        let requests = (0..3)
            .map(|_| f.set_visible(true))
            .filter(|r| *r == FrameRequest::Request)
            .count();
        assert_eq!(requests, 1);

        assert_eq!(run_frame(&mut f, 100.0), FrameTick::Run);
        assert!(f.surface().writes.len() > writes);
    }

    #[test]
    fn test_resize_drops_batches_for_old_grid() {
        let mut f = started(Size::new(1024.0, 768.0));
        f.on_pointer_move(Point::new(0.0, 0.0), 0.0);
        f.on_frame(0.0);
        assert!(f.has_pending_batches());
        let writes = f.surface().writes.len();

        assert_eq!(f.resize(Size::new(180.0, 90.0)), FrameRequest::Request);

        assert!(!f.has_pending_batches());
        assert!(!f.run_next_batch());
        assert_eq!(f.surface().writes.len(), writes);
        assert_eq!(f.pool().len(), 72);
        assert_eq!(f.surface().sprites.len(), 72);
    }

    #[test]
    fn test_resize_while_hidden_cancels_frame() {
        let mut f = started(Size::new(1024.0, 768.0));
        f.set_visible(false);

        assert_eq!(f.resize(Size::new(800.0, 600.0)), FrameRequest::Keep);
        assert!(!f.scheduler().is_pending());
        assert_eq!(f.set_visible(true), FrameRequest::Request);
    }

    #[test]
    fn test_start_defers_until_container_exists() {
        let mut f = field();
        assert_eq!(f.start(&None::<Size>), StartOutcome::Deferred);
        assert!(!f.scheduler().is_running());
        assert!(f.is_start_deferred());

        assert_eq!(
            f.start(&Some(Size::new(300.0, 300.0))),
            StartOutcome::Started(FrameRequest::Request)
        );
        assert!(!f.is_start_deferred());
    }

    #[test]
    fn test_stop_forgets_deferred_start() {
        let mut f = field();
        f.start(&None::<Size>);
        assert!(f.is_start_deferred());

        f.stop();
        assert!(!f.is_start_deferred());
    }

    #[test]
    fn test_zero_sized_container_is_empty() {
        let mut f = started(Size::new(0.0, 0.0));

        assert!(f.pool().is_empty());
        assert_eq!(run_frame(&mut f, 0.0), FrameTick::Run);
        assert!(f.surface().writes.is_empty());
    }

    #[test]
    fn test_settled_pointer_skips_pass() {
        let mut f = started(Size::new(1024.0, 768.0));
        run_frame(&mut f, 0.0);
        let writes = f.surface().writes.len();

        f.on_frame(20.0);
        assert!(!f.has_pending_batches());
        assert_eq!(f.surface().writes.len(), writes);
    }

    #[test]
    fn test_touch_moves_highlight_immediately() {
        let mut f = started(Size::new(1024.0, 768.0));

        f.on_touch_move(Some(Point::new(10.0, 20.0)), 0.0);
        assert_eq!(f.surface().highlight, Some(Point::new(10.0, 20.0)));

        f.on_touch_move(None, 50.0);
        assert_eq!(f.surface().highlight, Some(Point::new(10.0, 20.0)));
    }

    #[test]
    fn test_stop_tears_down() {
        let mut f = started(Size::new(1024.0, 768.0));
        f.on_frame(0.0);

        assert_eq!(f.stop(), FrameRequest::Cancel);
        assert!(f.pool().is_empty());
        assert!(f.surface().sprites.is_empty());
        assert!(!f.has_pending_batches());
        assert_eq!(f.on_frame(20.0), FrameTick::Suspended);
    }

    #[test]
    fn test_reconfigure_rebuilds_with_new_density() {
        use crate::engine::geometry::DensityPolicy;

        let mut f = started(Size::new(1024.0, 768.0));
        let settings = EngineSettings {
            density: DensityPolicy::Fixed {
                columns: 4,
                rows: 3,
                indicator_size: 16.0,
            },
            ..Default::default()
        };

        assert_eq!(f.reconfigure(settings), FrameRequest::Request);
        assert_eq!(f.pool().len(), 12);
    }
}
