use super::geometry::{GridPlan, Point};
use super::surface::{RenderSurface, Sprite};

#[derive(Debug, Clone)]
pub struct Indicator<H> {
    pub anchor: Point,
    pub angle: f64,
    pub handle: H,
}

/// Owns the live indicators. `rebuild` and `clear` are the only ways
/// indicators go away.
#[derive(Debug)]
pub struct IndicatorPool<H> {
    indicators: Vec<Indicator<H>>,
}

impl<H> Default for IndicatorPool<H> {
    fn default() -> Self {
        Self {
            indicators: Vec::new(),
        }
    }
}

impl<H: Copy> IndicatorPool<H> {
    pub fn rebuild<S>(&mut self, surface: &mut S, plan: &GridPlan)
    where
        S: RenderSurface<Handle = H>,
    {
        self.clear(surface);

        let size = plan.config.indicator_size;
        let sprites: Vec<Sprite> = plan
            .anchors
            .iter()
            .map(|&center| Sprite {
                center,
                size,
                angle: 0.0,
            })
            .collect();

        let handles = surface.insert_batch(&sprites);
        self.indicators = plan
            .anchors
            .iter()
            .zip(handles)
            .map(|(&anchor, handle)| Indicator {
                anchor,
                angle: 0.0,
                handle,
            })
            .collect();
    }

    pub fn clear<S>(&mut self, surface: &mut S)
    where
        S: RenderSurface<Handle = H>,
    {
        surface.clear();
        self.indicators.clear();
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Indicator<H>> {
        self.indicators.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Indicator<H>> {
        self.indicators.iter()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Indicator<H>> {
        self.indicators.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geometry::{self, DensityPolicy, Size};
    use crate::engine::surface::testing::RecordingSurface;

    #[test]
    fn test_rebuild_inserts_in_one_batch() {
        let mut surface = RecordingSurface::default();
        let mut pool = IndicatorPool::default();
        let plan = geometry::plan(Size::new(180.0, 90.0), &DensityPolicy::default());

        pool.rebuild(&mut surface, &plan);

        assert_eq!(pool.len(), 72);
        assert_eq!(surface.insert_calls, 1);
        assert_eq!(surface.sprites.len(), 72);
        assert_eq!(surface.sprites[0].size, 10.0);
    }

    #[test]
    fn test_rebuild_replaces_previous_indicators() {
        let mut surface = RecordingSurface::default();
        let mut pool = IndicatorPool::default();
        let policy = DensityPolicy::default();

        pool.rebuild(&mut surface, &geometry::plan(Size::new(1024.0, 768.0), &policy));
        pool.rebuild(&mut surface, &geometry::plan(Size::new(180.0, 90.0), &policy));

        assert_eq!(pool.len(), 72);
        assert_eq!(surface.sprites.len(), 72);
        assert_eq!(surface.clears, 2);
        assert!(pool.iter().all(|i| i.handle < 72));
    }

    #[test]
    fn test_clear_empties_pool() {
        let mut surface = RecordingSurface::default();
        let mut pool = IndicatorPool::default();
        pool.rebuild(
            &mut surface,
            &geometry::plan(Size::new(180.0, 90.0), &DensityPolicy::default()),
        );

        pool.clear(&mut surface);

        assert!(pool.is_empty());
        assert!(surface.sprites.is_empty());
    }
}
