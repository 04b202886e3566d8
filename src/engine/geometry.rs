use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// Most indicators any policy lays out.
pub const MAX_INDICATORS: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Mobile,
    Desktop,
}

/// How many indicators a container gets.
///
/// `Capped` fills the container at a fixed pitch and thins the grid by stride
/// sampling once the cell count passes the size class cap. `Fixed` always lays
/// out `columns * rows` indicators spread evenly over the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum DensityPolicy {
    Capped {
        #[serde(default = "defaults::breakpoint")]
        breakpoint: f64,
        #[serde(default = "defaults::mobile_size")]
        mobile_size: f64,
        #[serde(default = "defaults::desktop_size")]
        desktop_size: f64,
        #[serde(default = "defaults::spacing_multiplier")]
        spacing_multiplier: f64,
        #[serde(default = "defaults::mobile_cap")]
        mobile_cap: usize,
        #[serde(default = "defaults::desktop_cap")]
        desktop_cap: usize,
    },
    Fixed {
        #[serde(default = "defaults::columns")]
        columns: usize,
        #[serde(default = "defaults::rows")]
        rows: usize,
        #[serde(default = "defaults::fixed_size")]
        indicator_size: f64,
    },
}

mod defaults {
    pub fn breakpoint() -> f64 {
        768.0
    }
    pub fn mobile_size() -> f64 {
        10.0
    }
    pub fn desktop_size() -> f64 {
        12.0
    }
    pub fn spacing_multiplier() -> f64 {
        1.5
    }
    pub fn mobile_cap() -> usize {
        800
    }
    pub fn desktop_cap() -> usize {
        3000
    }
    pub fn columns() -> usize {
        20
    }
    pub fn rows() -> usize {
        15
    }
    pub fn fixed_size() -> f64 {
        16.0
    }
}

impl Default for DensityPolicy {
    fn default() -> Self {
        Self::Capped {
            breakpoint: defaults::breakpoint(),
            mobile_size: defaults::mobile_size(),
            desktop_size: defaults::desktop_size(),
            spacing_multiplier: defaults::spacing_multiplier(),
            mobile_cap: defaults::mobile_cap(),
            desktop_cap: defaults::desktop_cap(),
        }
    }
}

impl DensityPolicy {
    pub fn size_class(&self, size: Size) -> SizeClass {
        match self {
            Self::Capped { breakpoint, .. } if size.width < *breakpoint => SizeClass::Mobile,
            _ => SizeClass::Desktop,
        }
    }

    /// Upper bound on the indicator count for a container of this size.
    pub fn cap(&self, size: Size) -> usize {
        match self {
            Self::Capped {
                mobile_cap,
                desktop_cap,
                ..
            } => match self.size_class(size) {
                SizeClass::Mobile => (*mobile_cap).min(MAX_INDICATORS),
                SizeClass::Desktop => (*desktop_cap).min(MAX_INDICATORS),
            },
            Self::Fixed { columns, rows, .. } => columns.saturating_mul(*rows).min(MAX_INDICATORS),
        }
    }

    pub fn indicator_size(&self, size: Size) -> f64 {
        match self {
            Self::Capped {
                mobile_size,
                desktop_size,
                ..
            } => match self.size_class(size) {
                SizeClass::Mobile => *mobile_size,
                SizeClass::Desktop => *desktop_size,
            },
            Self::Fixed { indicator_size, .. } => *indicator_size,
        }
    }

    /// Replaces sizes and counts the planner cannot lay out, logging each one.
    pub fn validated(self) -> Self {
        match self {
            Self::Capped {
                breakpoint,
                mobile_size,
                desktop_size,
                spacing_multiplier,
                mobile_cap,
                desktop_cap,
            } => Self::Capped {
                breakpoint,
                mobile_size: at_least_one("mobile_size", mobile_size),
                desktop_size: at_least_one("desktop_size", desktop_size),
                spacing_multiplier: at_least_one("spacing_multiplier", spacing_multiplier),
                mobile_cap: at_most_max("mobile_cap", mobile_cap),
                desktop_cap: at_most_max("desktop_cap", desktop_cap),
            },
            Self::Fixed {
                columns,
                rows,
                indicator_size,
            } => {
                let (columns, rows) = if fixed_cells(columns, rows).is_some() {
                    (columns, rows)
                } else {
                    log::warn!(
                        "grid {}x{} exceeds {} indicators, using {}x{}",
                        columns,
                        rows,
                        MAX_INDICATORS,
                        defaults::columns(),
                        defaults::rows()
                    );
                    (defaults::columns(), defaults::rows())
                };
                Self::Fixed {
                    columns,
                    rows,
                    indicator_size: at_least_one("indicator_size", indicator_size),
                }
            }
        }
    }
}

fn at_least_one(name: &str, value: f64) -> f64 {
    if value.is_finite() && value >= 1.0 {
        value
    } else {
        log::warn!("grid.{} {} is not usable, using 1", name, value);
        1.0
    }
}

fn at_most_max(name: &str, value: usize) -> usize {
    if value > MAX_INDICATORS {
        log::warn!("grid.{} {} is above {}, using {}", name, value, MAX_INDICATORS, MAX_INDICATORS);
        MAX_INDICATORS
    } else {
        value
    }
}

fn fixed_cells(columns: usize, rows: usize) -> Option<usize> {
    columns.checked_mul(rows).filter(|&n| n <= MAX_INDICATORS)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub columns: usize,
    pub rows: usize,
    pub spacing_x: f64,
    pub spacing_y: f64,
    pub indicator_size: f64,
    pub size_class: SizeClass,
    pub cap: usize,
}

impl GridConfig {
    pub fn total_possible(&self) -> usize {
        self.columns.saturating_mul(self.rows)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridPlan {
    pub config: GridConfig,
    pub skip: usize,
    pub anchors: Vec<Point>,
}

impl GridPlan {
    fn empty(size: Size, policy: &DensityPolicy) -> Self {
        Self {
            config: GridConfig {
                columns: 0,
                rows: 0,
                spacing_x: 0.0,
                spacing_y: 0.0,
                indicator_size: policy.indicator_size(size),
                size_class: policy.size_class(size),
                cap: policy.cap(size),
            },
            skip: 1,
            anchors: Vec::new(),
        }
    }
}

/// Stride that keeps `ceil(total / skip) <= cap`.
pub fn skip_factor(total: usize, cap: usize) -> usize {
    if cap == 0 || total <= cap {
        return 1;
    }
    total.div_ceil(cap).max(1)
}

pub fn plan(size: Size, policy: &DensityPolicy) -> GridPlan {
    if size.is_degenerate() {
        return GridPlan::empty(size, policy);
    }

    match policy {
        DensityPolicy::Capped {
            spacing_multiplier,
            ..
        } => plan_capped(size, policy, policy.indicator_size(size) * spacing_multiplier),
        DensityPolicy::Fixed { columns, rows, .. } => plan_fixed(size, policy, *columns, *rows),
    }
}

fn plan_capped(size: Size, policy: &DensityPolicy, spacing: f64) -> GridPlan {
    if !spacing.is_finite() || spacing <= 0.0 {
        return GridPlan::empty(size, policy);
    }

    let columns = (size.width / spacing).floor() as usize;
    let rows = (size.height / spacing).floor() as usize;
    let cap = policy.cap(size);
    let Some(total) = columns.checked_mul(rows) else {
        log::warn!("{}x{} cells cannot be planned", columns, rows);
        return GridPlan::empty(size, policy);
    };
    let skip = skip_factor(total, cap);

    let anchors = if cap == 0 {
        Vec::new()
    } else {
        (0..total)
            .step_by(skip)
            .map(|i| {
                let (row, col) = (i / columns, i % columns);
                Point::new(
                    col as f64 * spacing + spacing / 2.0,
                    row as f64 * spacing + spacing / 2.0,
                )
            })
            .collect()
    };

    GridPlan {
        config: GridConfig {
            columns,
            rows,
            spacing_x: spacing,
            spacing_y: spacing,
            indicator_size: policy.indicator_size(size),
            size_class: policy.size_class(size),
            cap,
        },
        skip,
        anchors,
    }
}

fn plan_fixed(size: Size, policy: &DensityPolicy, columns: usize, rows: usize) -> GridPlan {
    if fixed_cells(columns, rows).is_none() {
        log::warn!("{}x{} grid exceeds {} indicators", columns, rows, MAX_INDICATORS);
        return GridPlan::empty(size, policy);
    }

    let spacing_x = size.width / (columns + 1) as f64;
    let spacing_y = size.height / (rows + 1) as f64;

    let anchors = (0..rows)
        .flat_map(|row| {
            (0..columns).map(move |col| {
                Point::new((col + 1) as f64 * spacing_x, (row + 1) as f64 * spacing_y)
            })
        })
        .collect();

    GridPlan {
        config: GridConfig {
            columns,
            rows,
            spacing_x,
            spacing_y,
            indicator_size: policy.indicator_size(size),
            size_class: policy.size_class(size),
            cap: policy.cap(size),
        },
        skip: 1,
        anchors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capped(mobile_cap: usize, desktop_cap: usize) -> DensityPolicy {
        DensityPolicy::Capped {
            breakpoint: 768.0,
            mobile_size: 10.0,
            desktop_size: 12.0,
            spacing_multiplier: 1.5,
            mobile_cap,
            desktop_cap,
        }
    }

    #[test]
    fn test_desktop_reference_grid() {
        let plan = plan(Size::new(1024.0, 768.0), &DensityPolicy::default());

        assert_eq!(plan.config.spacing_x, 18.0);
        assert_eq!(plan.config.columns, 56);
        assert_eq!(plan.config.rows, 42);
        assert_eq!(plan.config.total_possible(), 2352);
        assert_eq!(plan.config.size_class, SizeClass::Desktop);
        assert_eq!(plan.skip, 1);
        assert_eq!(plan.anchors.len(), 2352);
        assert_eq!(plan.anchors[0], Point::new(9.0, 9.0));
        assert_eq!(plan.anchors[2351], Point::new(999.0, 747.0));
    }

    #[test]
    fn test_pre_skip_counts_match_floor() {
        let policy = capped(usize::MAX, usize::MAX);
        for (w, h) in [(1.0, 1.0), (17.9, 18.0), (500.0, 333.0), (1920.0, 1080.0)] {
            let size = Size::new(w, h);
            let spacing = policy.indicator_size(size) * 1.5;
            let plan = plan(size, &policy);
            let expected = (w / spacing).floor() as usize * (h / spacing).floor() as usize;
            assert_eq!(plan.config.total_possible(), expected, "{w}x{h}");
        }
    }

    #[test]
    fn test_stride_keeps_count_between_half_cap_and_cap() {
        for cap in [1, 7, 100, 800, 1000, 1175, 2351, 3000] {
            let plan = plan(Size::new(1024.0, 768.0), &capped(cap, cap));
            let count = plan.anchors.len();
            assert!(count <= cap, "cap {cap}: {count} over cap");
            assert!(count * 2 >= cap.min(2352), "cap {cap}: {count} too sparse");
        }
    }

    #[test]
    fn test_mobile_uses_mobile_cap() {
        let plan = plan(Size::new(400.0, 900.0), &capped(800, 3000));

        assert_eq!(plan.config.size_class, SizeClass::Mobile);
        assert_eq!(plan.config.indicator_size, 10.0);
        assert_eq!(plan.config.total_possible(), 26 * 60);
        assert_eq!(plan.skip, 2);
        assert!(plan.anchors.len() <= 800);
    }

    #[test]
    fn test_stride_sampling_is_deterministic() {
        let policy = capped(800, 1000);
        let a = plan(Size::new(1024.0, 768.0), &policy);
        let b = plan(Size::new(1024.0, 768.0), &policy);

        assert_eq!(a.skip, 3);
        assert_eq!(a.anchors, b.anchors);
        // linear index 3 is row 0, col 3
        assert_eq!(a.anchors[1], Point::new(3.0 * 18.0 + 9.0, 9.0));
    }

    #[test]
    fn test_degenerate_sizes_yield_empty_grid() {
        let policy = DensityPolicy::default();
        for size in [
            Size::new(0.0, 0.0),
            Size::new(1024.0, 0.0),
            Size::new(-5.0, 100.0),
            Size::new(f64::NAN, 100.0),
        ] {
            let plan = plan(size, &policy);
            assert!(plan.anchors.is_empty());
            assert_eq!(plan.config.total_possible(), 0);
        }

        let zero_pitch = DensityPolicy::Capped {
            breakpoint: 768.0,
            mobile_size: 0.0,
            desktop_size: 0.0,
            spacing_multiplier: 1.5,
            mobile_cap: 800,
            desktop_cap: 3000,
        };
        assert!(plan(Size::new(1024.0, 768.0), &zero_pitch).anchors.is_empty());
    }

    #[test]
    fn test_fixed_policy_spreads_evenly() {
        let policy = DensityPolicy::Fixed {
            columns: 20,
            rows: 15,
            indicator_size: 16.0,
        };
        let plan = plan(Size::new(2100.0, 1600.0), &policy);

        assert_eq!(plan.anchors.len(), 300);
        assert_eq!(plan.config.spacing_x, 100.0);
        assert_eq!(plan.config.spacing_y, 100.0);
        assert_eq!(plan.anchors[0], Point::new(100.0, 100.0));
        assert_eq!(plan.anchors[299], Point::new(2000.0, 1500.0));
        assert_eq!(plan.config.cap, 300);
    }

    #[test]
    fn test_tiny_pitch_never_overflows() {
        let policy = |desktop_size| DensityPolicy::Capped {
            breakpoint: 768.0,
            mobile_size: 10.0,
            desktop_size,
            spacing_multiplier: 1.5,
            mobile_cap: 800,
            desktop_cap: 3000,
        };
        let size = Size::new(1024.0, 768.0);

        let unbounded = plan(size, &policy(1e-9));
        assert!(unbounded.anchors.is_empty());

        let huge = plan(size, &policy(1e-4));
        assert!(huge.config.total_possible() > 3000);
        assert!(huge.anchors.len() <= 3000);
        assert!(huge.anchors.len() >= 1500);
    }

    #[test]
    fn test_oversized_fixed_grid_is_refused() {
        let policy = DensityPolicy::Fixed {
            columns: 1_000_000,
            rows: 1_000_000,
            indicator_size: 16.0,
        };
        let plan = plan(Size::new(1024.0, 768.0), &policy);

        assert!(plan.anchors.is_empty());
        assert!(plan.config.cap <= MAX_INDICATORS);

        let overflow = DensityPolicy::Fixed {
            columns: usize::MAX,
            rows: 2,
            indicator_size: 16.0,
        };
        assert!(super::plan(Size::new(1024.0, 768.0), &overflow).anchors.is_empty());
    }

    #[test]
    fn test_validated_clamps_unplannable_policies() {
        let capped = DensityPolicy::Capped {
            breakpoint: 768.0,
            mobile_size: 0.0,
            desktop_size: 1e-9,
            spacing_multiplier: f64::NAN,
            mobile_cap: 800,
            desktop_cap: usize::MAX,
        }
        .validated();
        assert_eq!(
            capped,
            DensityPolicy::Capped {
                breakpoint: 768.0,
                mobile_size: 1.0,
                desktop_size: 1.0,
                spacing_multiplier: 1.0,
                mobile_cap: 800,
                desktop_cap: MAX_INDICATORS,
            }
        );

        let fixed = DensityPolicy::Fixed {
            columns: 1_000_000,
            rows: 1_000_000,
            indicator_size: 16.0,
        }
        .validated();
        assert_eq!(
            fixed,
            DensityPolicy::Fixed {
                columns: 20,
                rows: 15,
                indicator_size: 16.0,
            }
        );

        assert_eq!(DensityPolicy::default().validated(), DensityPolicy::default());
    }

    #[test]
    fn test_skip_factor() {
        assert_eq!(skip_factor(2352, 3000), 1);
        assert_eq!(skip_factor(6000, 3000), 2);
        assert_eq!(skip_factor(5999, 3000), 2);
        assert_eq!(skip_factor(6001, 3000), 3);
        assert_eq!(skip_factor(10, 0), 1);
    }
}
