use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::color::{rgb_to_u8, unit_to_u8};
use crate::config::ConversionOptions;
use crate::raster::{PixelSpace, RasterImage};
use crate::{VectraError, VectraResult};

/// Centers closer than this (squared) between iterations count as converged.
const CONVERGENCE_SHIFT: f64 = 1e-20;

/// One representative color and the number of pixels assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorCluster<const N: usize> {
    pub center: [f64; N],
    pub population: usize,
}

/// Clusters found for an image, tagged with the pixel space they live in.
///
/// Clusters are ordered by descending population, ties broken by color.
#[derive(Debug, Clone, PartialEq)]
pub enum Palette {
    Grayscale(Vec<ColorCluster<1>>),
    Rgb(Vec<ColorCluster<3>>),
}

impl Palette {
    pub fn space(&self) -> PixelSpace {
        match self {
            Palette::Grayscale(_) => PixelSpace::Grayscale,
            Palette::Rgb(_) => PixelSpace::Rgb,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Palette::Grayscale(clusters) => clusters.len(),
            Palette::Rgb(clusters) => clusters.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cluster centers as 0-255 RGB, grayscale replicated across channels.
    pub fn display_colors(&self) -> Vec<[u8; 3]> {
        match self {
            Palette::Grayscale(clusters) => clusters
                .iter()
                .map(|c| [unit_to_u8(c.center[0]); 3])
                .collect(),
            Palette::Rgb(clusters) => clusters.iter().map(|c| rgb_to_u8(c.center)).collect(),
        }
    }

    /// Pixel counts per cluster, in palette order.
    pub fn populations(&self) -> Vec<usize> {
        match self {
            Palette::Grayscale(clusters) => clusters.iter().map(|c| c.population).collect(),
            Palette::Rgb(clusters) => clusters.iter().map(|c| c.population).collect(),
        }
    }
}

/// Cluster the image's colors into at most `options.n_colors` groups.
///
/// The count is capped at the number of distinct colors. Results depend only
/// on the image and `options` (seed included).
pub fn quantize(image: &RasterImage, options: &ConversionOptions) -> VectraResult<Palette> {
    let palette = match image {
        RasterImage::Grayscale(pixels) => {
            Palette::Grayscale(cluster_colors(pixels.iter().map(|&v| [v]), options)?)
        }
        RasterImage::Rgb(pixels) => Palette::Rgb(cluster_colors(pixels.iter().copied(), options)?),
    };
    Ok(palette)
}

#[derive(Debug, Clone, Copy)]
struct WeightedColor<const N: usize> {
    color: [f64; N],
    weight: usize,
}

fn cluster_colors<const N: usize>(
    samples: impl Iterator<Item = [f64; N]>,
    options: &ConversionOptions,
) -> VectraResult<Vec<ColorCluster<N>>> {
    let points = distinct_colors(samples);
    if points.is_empty() {
        return Err(VectraError::EmptyImage);
    }

    let k = options.n_colors.min(points.len());
    if k < options.n_colors {
        warn!(
            requested = options.n_colors,
            effective = k,
            "reduced n_colors to the number of distinct colors"
        );
    }

    let mut clusters = if k == points.len() {
        points
            .iter()
            .map(|p| ColorCluster {
                center: p.color,
                population: p.weight,
            })
            .collect()
    } else {
        best_of_restarts(&points, k, options)
    };

    clusters.sort_by(|a, b| {
        b.population
            .cmp(&a.population)
            .then_with(|| compare_colors(&a.center, &b.center))
    });
    debug!(clusters = clusters.len(), "quantization finished");
    Ok(clusters)
}

/// Deduplicate samples into weighted colors, in a deterministic order.
fn distinct_colors<const N: usize>(
    samples: impl Iterator<Item = [f64; N]>,
) -> Vec<WeightedColor<N>> {
    let mut counts: BTreeMap<[u64; N], usize> = BTreeMap::new();
    for sample in samples {
        // `+ 0.0` folds -0.0 into 0.0
        let key = sample.map(|c| (c + 0.0).to_bits());
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(key, weight)| WeightedColor {
            color: key.map(f64::from_bits),
            weight,
        })
        .collect()
}

fn best_of_restarts<const N: usize>(
    points: &[WeightedColor<N>],
    k: usize,
    options: &ConversionOptions,
) -> Vec<ColorCluster<N>> {
    let mut best: Option<(f64, Vec<ColorCluster<N>>)> = None;
    for run in 0..options.n_init {
        let seed = options
            .seed
            .wrapping_add((run as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let (inertia, clusters) = lloyd(points, k, seed, options.max_iterations);
        let improves = best
            .as_ref()
            .is_none_or(|(best_inertia, _)| inertia < *best_inertia);
        if improves {
            best = Some((inertia, clusters));
        }
    }
    best.map(|(_, clusters)| clusters).unwrap_or_default()
}

/// One seeded k-means run: k-means++ initialization followed by Lloyd iterations.
fn lloyd<const N: usize>(
    points: &[WeightedColor<N>],
    k: usize,
    seed: u64,
    max_iterations: usize,
) -> (f64, Vec<ColorCluster<N>>) {
    let mut rng = Lcg::new(seed);
    let mut centers = kmeans_plus_plus(points, k, &mut rng);
    let mut assignment = assign(points, &centers);

    for _ in 0..max_iterations {
        let updated = update_centers(points, &assignment, &centers);
        let shift = centers
            .iter()
            .zip(&updated)
            .map(|(a, b)| distance_sq(a, b))
            .fold(0.0, f64::max);
        centers = updated;
        assignment = assign(points, &centers);
        if shift <= CONVERGENCE_SHIFT {
            break;
        }
    }

    let mut populations = vec![0usize; k];
    let mut inertia = 0.0;
    for (point, &(cluster, d2)) in points.iter().zip(&assignment) {
        populations[cluster] += point.weight;
        inertia += point.weight as f64 * d2;
    }

    let clusters = centers
        .into_iter()
        .zip(populations)
        .map(|(center, population)| ColorCluster { center, population })
        .collect();
    (inertia, clusters)
}

fn kmeans_plus_plus<const N: usize>(
    points: &[WeightedColor<N>],
    k: usize,
    rng: &mut Lcg,
) -> Vec<[f64; N]> {
    let total: f64 = points.iter().map(|p| p.weight as f64).sum();
    let first = pick_weighted(points.iter().map(|p| p.weight as f64), total, rng);
    let mut centers = vec![points[first].color];
    let mut nearest: Vec<f64> = points
        .iter()
        .map(|p| distance_sq(&p.color, &centers[0]))
        .collect();

    while centers.len() < k {
        let potential: f64 = points
            .iter()
            .zip(&nearest)
            .map(|(p, d2)| p.weight as f64 * d2)
            .sum();
        let next = if potential > 0.0 {
            pick_weighted(
                points.iter().zip(&nearest).map(|(p, d2)| p.weight as f64 * d2),
                potential,
                rng,
            )
        } else {
            farthest(&nearest)
        };
        let center = points[next].color;
        for (d2, point) in nearest.iter_mut().zip(points) {
            *d2 = d2.min(distance_sq(&point.color, &center));
        }
        centers.push(center);
    }
    centers
}

/// Sample an index proportionally to `weights`, which sum to `total`.
fn pick_weighted(weights: impl Iterator<Item = f64>, total: f64, rng: &mut Lcg) -> usize {
    let target = rng.next_unit() * total;
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, weight) in weights.enumerate() {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = i;
        if cumulative > target {
            return i;
        }
    }
    last_positive
}

fn farthest(distances: &[f64]) -> usize {
    let mut best = 0;
    for (i, d) in distances.iter().enumerate() {
        if *d > distances[best] {
            best = i;
        }
    }
    best
}

/// Nearest center and squared distance per point; ties go to the lower index.
fn assign<const N: usize>(points: &[WeightedColor<N>], centers: &[[f64; N]]) -> Vec<(usize, f64)> {
    points
        .iter()
        .map(|p| {
            let mut best = (0, distance_sq(&p.color, &centers[0]));
            for (i, center) in centers.iter().enumerate().skip(1) {
                let d2 = distance_sq(&p.color, center);
                if d2 < best.1 {
                    best = (i, d2);
                }
            }
            best
        })
        .collect()
}

fn update_centers<const N: usize>(
    points: &[WeightedColor<N>],
    assignment: &[(usize, f64)],
    centers: &[[f64; N]],
) -> Vec<[f64; N]> {
    let k = centers.len();
    let mut sums = vec![[0.0; N]; k];
    let mut weights = vec![0.0; k];
    let mut members = vec![0usize; k];
    let mut sole_member = vec![0usize; k];

    for (index, (point, &(cluster, _))) in points.iter().zip(assignment).enumerate() {
        let w = point.weight as f64;
        for (sum, c) in sums[cluster].iter_mut().zip(point.color) {
            *sum += w * c;
        }
        weights[cluster] += w;
        members[cluster] += 1;
        sole_member[cluster] = index;
    }

    let mut updated = Vec::with_capacity(k);
    for cluster in 0..k {
        let center = match members[cluster] {
            0 => reseat(points, assignment, &updated, centers),
            1 => points[sole_member[cluster]].color,
            _ => sums[cluster].map(|sum| sum / weights[cluster]),
        };
        updated.push(center);
    }
    updated
}

/// Move an empty cluster onto the point worst served by its current center.
fn reseat<const N: usize>(
    points: &[WeightedColor<N>],
    assignment: &[(usize, f64)],
    taken: &[[f64; N]],
    centers: &[[f64; N]],
) -> [f64; N] {
    let mut best: Option<(usize, f64)> = None;
    for (i, (point, &(_, d2))) in points.iter().zip(assignment).enumerate() {
        if taken.contains(&point.color) || centers.contains(&point.color) {
            continue;
        }
        if best.is_none_or(|(_, best_d2)| d2 > best_d2) {
            best = Some((i, d2));
        }
    }
    best.map(|(i, _)| points[i].color).unwrap_or(points[0].color)
}

fn distance_sq<const N: usize>(a: &[f64; N], b: &[f64; N]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn compare_colors<const N: usize>(a: &[f64; N], b: &[f64; N]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Small linear congruential generator, enough for reproducible seeding.
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        let mut rng = Self { state: seed };
        rng.next_u32();
        rng
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.state >> 32) as u32
    }

    /// Uniform sample in [0, 1).
    fn next_unit(&mut self) -> f64 {
        f64::from(self.next_u32()) / (f64::from(u32::MAX) + 1.0)
    }
}
