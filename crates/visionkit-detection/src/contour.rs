use crate::geometry::Rect;
use ndarray::{Array2, ArrayView2};
use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct Contour {
    pub points: Vec<(i32, i32)>,
    pub area: f32,
    pub perimeter: f32,
    pub is_hole: bool,
}

/// Which boundaries [`find_contours`] reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Outer boundaries of components that are not enclosed by another component.
    External,
    /// Every outer boundary plus the boundary around every hole.
    List,
}

/// How boundary points are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainApprox {
    /// Every boundary pixel.
    None,
    /// Only the endpoints of horizontal, vertical and diagonal runs.
    Simple,
}

// Clockwise in image coordinates (y grows downward), starting east.
const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const WEST: usize = 4;
const SOUTH: usize = 2;

impl Contour {
    pub fn new(points: Vec<(i32, i32)>, is_hole: bool) -> Self {
        let area = polygon_area(&points);
        let perimeter = closed_length(&points);
        Self {
            points,
            area,
            perimeter,
            is_hole,
        }
    }

    /// Smallest upright rectangle containing every point.
    pub fn bounding_rect(&self) -> Rect {
        let mut xs = self.points.iter().map(|p| p.0);
        let mut ys = self.points.iter().map(|p| p.1);
        let (Some(x0), Some(y0)) = (xs.next(), ys.next()) else {
            return Rect::default();
        };
        let (min_x, max_x) = xs.fold((x0, x0), |(lo, hi), x| (lo.min(x), hi.max(x)));
        let (min_y, max_y) = ys.fold((y0, y0), |(lo, hi), y| (lo.min(y), hi.max(y)));
        Rect::new(
            min_x.max(0) as u32,
            min_y.max(0) as u32,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        )
    }
}

// Shoelace formula over the closed polygon.
fn polygon_area(points: &[(i32, i32)]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.0 as i64 * b.1 as i64 - b.0 as i64 * a.1 as i64)
        .sum();
    (twice.abs() as f32) / 2.0
}

fn closed_length(points: &[(i32, i32)]) -> f32 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| {
            let dx = (b.0 - a.0) as f32;
            let dy = (b.1 - a.1) as f32;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}

struct Grid<'a> {
    mask: ArrayView2<'a, u8>,
    width: i32,
    height: i32,
}

impl Grid<'_> {
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn is_foreground(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.mask[(y as usize, x as usize)] != 0
    }
}

// Moore-neighbour tracing. `backtrack` is the direction from `start` to a
// background pixel of the region being walked around. Stops when the walk
// leaves `start` in the same direction it first did.
fn trace_boundary(grid: &Grid, start: (i32, i32), backtrack: usize) -> Vec<(i32, i32)> {
    let mut points = vec![start];
    let mut current = start;
    let mut backtrack = backtrack;
    let mut first_move = None;
    let max_steps = (grid.width as usize * grid.height as usize)
        .saturating_mul(8)
        .max(32);

    for _ in 0..max_steps {
        let next = (1..=8)
            .map(|step| (backtrack + step) % 8)
            .find(|&k| {
                let (dx, dy) = NEIGHBORS[k];
                grid.is_foreground(current.0 + dx, current.1 + dy)
            });
        let Some(k) = next else { break };

        if current == start {
            match first_move {
                None => first_move = Some(k),
                Some(first) if first == k => break,
                Some(_) => {}
            }
        }

        let (dx, dy) = NEIGHBORS[k];
        current = (current.0 + dx, current.1 + dy);
        backtrack = if k % 2 == 0 { (k + 6) % 8 } else { (k + 5) % 8 };
        points.push(current);
    }

    if points.len() > 1 && points.last() == Some(&start) {
        points.pop();
    }
    points
}

// Drops points that continue the previous run in the same direction.
fn compress_runs(points: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    let n = points.len();
    if n < 3 {
        return points;
    }
    let step = |a: (i32, i32), b: (i32, i32)| ((b.0 - a.0).signum(), (b.1 - a.1).signum());
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            step(prev, cur) != step(cur, next)
        })
        .map(|i| points[i])
        .collect()
}

// Breadth-first fill from `seed`; returns every pixel it labelled.
fn flood<F>(
    labels: &mut Array2<u32>,
    seed: (usize, usize),
    label: u32,
    connect8: bool,
    mut accept: F,
) -> Vec<(usize, usize)>
where
    F: FnMut(usize, usize) -> bool,
{
    let (height, width) = labels.dim();
    let mut queue = VecDeque::from([seed]);
    let mut visited = Vec::new();
    labels[seed] = label;
    while let Some((y, x)) = queue.pop_front() {
        visited.push((y, x));
        for (dx, dy) in NEIGHBORS {
            if !connect8 && dx != 0 && dy != 0 {
                continue;
            }
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                continue;
            }
            let n = (ny as usize, nx as usize);
            if labels[n] == 0 && accept(n.0, n.1) {
                labels[n] = label;
                queue.push_back(n);
            }
        }
    }
    visited
}

/// Traces the boundaries of the non-zero regions of `mask`.
///
/// Foreground is 8-connected, background 4-connected. Contours come back in
/// raster order of their first pixel, outer boundaries before holes.
pub fn find_contours(mask: ArrayView2<u8>, mode: RetrievalMode, approx: ChainApprox) -> Vec<Contour> {
    let (height, width) = mask.dim();
    let grid = Grid {
        mask,
        width: width as i32,
        height: height as i32,
    };

    // Background reachable from the image border.
    let mut outside = Array2::<u32>::zeros((height, width));
    for y in 0..height {
        for x in 0..width {
            let on_border = y == 0 || x == 0 || y + 1 == height || x + 1 == width;
            if on_border && mask[(y, x)] == 0 && outside[(y, x)] == 0 {
                flood(&mut outside, (y, x), 1, false, |yy, xx| mask[(yy, xx)] == 0);
            }
        }
    }

    let mut components = Array2::<u32>::zeros((height, width));
    let mut holes = Array2::<u32>::zeros((height, width));
    let mut outer = Vec::new();
    let mut inner = Vec::new();
    let mut next_label = 1;

    for y in 0..height {
        for x in 0..width {
            if mask[(y, x)] != 0 && components[(y, x)] == 0 {
                let label = next_label;
                next_label += 1;
                let pixels = flood(&mut components, (y, x), label, true, |yy, xx| {
                    mask[(yy, xx)] != 0
                });
                // Outermost iff some pixel sits on the border or 4-touches outside background.
                let touches_outside = pixels.iter().any(|&(cy, cx)| {
                    let edge = cy == 0 || cx == 0 || cy + 1 == height || cx + 1 == width;
                    edge || [(0i32, -1i32), (-1, 0), (1, 0), (0, 1)].iter().any(|(dx, dy)| {
                        let nx = cx as i32 + dx;
                        let ny = cy as i32 + dy;
                        grid.in_bounds(nx, ny) && outside[(ny as usize, nx as usize)] != 0
                    })
                });
                if mode == RetrievalMode::List || touches_outside {
                    let points = trace_boundary(&grid, (x as i32, y as i32), WEST);
                    outer.push(points);
                }
            } else if mode == RetrievalMode::List
                && mask[(y, x)] == 0
                && outside[(y, x)] == 0
                && holes[(y, x)] == 0
            {
                flood(&mut holes, (y, x), 1, false, |yy, xx| mask[(yy, xx)] == 0);
                // The raster-first hole pixel always has foreground directly above it.
                let start = (x as i32, y as i32 - 1);
                inner.push(trace_boundary(&grid, start, SOUTH));
            }
        }
    }

    let finish = |points: Vec<(i32, i32)>| match approx {
        ChainApprox::None => points,
        ChainApprox::Simple => compress_runs(points),
    };

    let mut contours: Vec<Contour> = outer
        .into_iter()
        .map(|p| Contour::new(finish(p), false))
        .collect();
    contours.extend(inner.into_iter().map(|p| Contour::new(finish(p), true)));
    tracing::trace!(count = contours.len(), ?mode, "contours traced");
    contours
}

/// Tight box around every non-zero pixel, `None` for an empty mask.
pub fn mask_bbox(mask: ArrayView2<u8>) -> Option<Rect> {
    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    for ((y, x), &v) in mask.indexed_iter() {
        if v == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds.map(|(x0, y0, x1, y1)| Rect::from_corners(x0 as u32, y0 as u32, x1 as u32 + 1, y1 as u32 + 1))
}
