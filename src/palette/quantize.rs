//! Dominant-color clustering
//!
//! k-means in Lab space via `kmeans_colors`. Images that already have no more
//! distinct colors than requested skip clustering and keep their exact colors.

use ::palette::{FromColor, Lab, Srgb};
use kmeans_colors::get_kmeans;
use std::collections::{BTreeMap, HashMap};

use super::Color;

const MAX_ITERATIONS: usize = 20;
const CONVERGENCE: f32 = 1e-4;
const SEED: u64 = 0;

/// Cluster membership is reported as `u8`
const MAX_CLUSTERS: usize = u8::MAX as usize + 1;

/// Larger images are sampled with a fixed stride before clustering
const MAX_SAMPLES: usize = 100_000;

fn to_lab([r, g, b]: [u8; 3]) -> Lab {
    Lab::from_color(Srgb::new(r, g, b).into_format::<f32>())
}

/// Reduce `pixels` to at most `max_colors` representative colors.
///
/// Each representative is the mean RGB of the pixels in its cluster and comes
/// with the number of (sampled) pixels it stands for. Order is unspecified.
pub fn dominant_colors(pixels: &[[u8; 3]], max_colors: usize) -> Vec<(Color, u64)> {
    if pixels.is_empty() || max_colors == 0 {
        return Vec::new();
    }

    let mut histogram: HashMap<[u8; 3], u64> = HashMap::new();
    for pixel in pixels {
        *histogram.entry(*pixel).or_insert(0) += 1;
    }
    if histogram.len() <= max_colors {
        return histogram
            .into_iter()
            .map(|(rgb, count)| (Color::from(rgb), count))
            .collect();
    }

    let step = pixels.len().div_ceil(MAX_SAMPLES).max(1);
    let samples: Vec<[u8; 3]> = pixels.iter().step_by(step).copied().collect();
    let lab: Vec<Lab> = samples.iter().copied().map(to_lab).collect();

    let k = max_colors.min(MAX_CLUSTERS);
    let result = get_kmeans(k, MAX_ITERATIONS, CONVERGENCE, false, &lab, SEED);

    let mut sums = vec![[0u64; 3]; result.centroids.len()];
    let mut counts = vec![0u64; result.centroids.len()];
    for (rgb, &cluster) in samples.iter().zip(&result.indices) {
        let cluster = usize::from(cluster);
        let (Some(sum), Some(count)) = (sums.get_mut(cluster), counts.get_mut(cluster)) else {
            continue;
        };
        for (total, channel) in sum.iter_mut().zip(rgb) {
            *total += u64::from(*channel);
        }
        *count += 1;
    }

    // Clusters whose means round to the same color are merged
    let mut merged: BTreeMap<Color, u64> = BTreeMap::new();
    for (sum, count) in sums.into_iter().zip(counts) {
        if count == 0 {
            continue;
        }
        let mean = sum.map(|total| ((total + count / 2) / count) as u8);
        *merged.entry(Color::from(mean)).or_insert(0) += count;
    }
    merged.into_iter().collect()
}
