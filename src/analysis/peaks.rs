//! Topological peak detection shared by the spectral and color analyzers.
//!
//! The field is flooded from its highest value downwards. Every new local
//! maximum starts a component; when two components touch, the one with the
//! lower peak dies and its persistence is the drop from its peak to the
//! meeting level. Equal values are visited in ascending index order, so among
//! tied peaks the one with the lowest index survives.

use std::cmp::Ordering;

use ndarray::Array2;

/// A local maximum and how long it survived the flooding sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Flat index of the peak (row-major for 2D fields).
    pub index: usize,
    /// Field value at the peak.
    pub value: f64,
    /// Value drop survived before merging into a higher peak.
    pub persistence: f64,
}

/// All peaks of a 1D sequence (neighbours are `i - 1` and `i + 1`).
pub fn persistent_peaks_1d(values: &[f64]) -> Vec<Peak> {
    let len = values.len();
    sweep(values, |idx, out| {
        if idx > 0 {
            out.push(idx - 1);
        }
        if idx + 1 < len {
            out.push(idx + 1);
        }
    })
}

/// All peaks of a 2D grid with 8-connectivity.
pub fn persistent_peaks_2d(field: &Array2<f64>) -> Vec<Peak> {
    let (rows, cols) = field.dim();
    let values: Vec<f64> = field.iter().copied().collect();
    sweep(&values, |idx, out| {
        let (row, col) = (idx / cols, idx % cols);
        for dr in -1isize..=1 {
            for dc in -1isize..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let r = row as isize + dr;
                let c = col as isize + dc;
                if r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols {
                    out.push(r as usize * cols + c as usize);
                }
            }
        }
    })
}

/// Count 1D peaks whose persistence exceeds `threshold`.
///
/// A flat sequence has exactly one peak.
pub fn count_peaks_1d(values: &[f64], threshold: f64) -> usize {
    if is_flat(values.iter().copied()) {
        return usize::from(!values.is_empty());
    }
    significant(persistent_peaks_1d(values), threshold).count()
}

/// Count 2D peaks whose persistence exceeds `threshold`.
///
/// A flat grid has exactly one peak.
pub fn count_peaks_2d(field: &Array2<f64>, threshold: f64) -> usize {
    if is_flat(field.iter().copied()) {
        return usize::from(!field.is_empty());
    }
    significant(persistent_peaks_2d(field), threshold).count()
}

/// Peaks above `threshold`, most persistent first.
pub fn significant(peaks: Vec<Peak>, threshold: f64) -> impl Iterator<Item = Peak> {
    peaks.into_iter().filter(move |peak| peak.persistence > threshold)
}

fn is_flat(mut values: impl Iterator<Item = f64>) -> bool {
    let Some(first) = values.next() else {
        return true;
    };
    values.all(|v| v == first)
}

struct Components {
    parent: Vec<usize>,
    birth: Vec<usize>,
}

impl Components {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            birth: (0..len).collect(),
        }
    }

    fn find(&mut self, mut idx: usize) -> usize {
        while self.parent[idx] != idx {
            self.parent[idx] = self.parent[self.parent[idx]];
            idx = self.parent[idx];
        }
        idx
    }
}

fn sweep(values: &[f64], mut neighbours: impl FnMut(usize, &mut Vec<usize>)) -> Vec<Peak> {
    if values.is_empty() {
        return Vec::new();
    }
    let values: Vec<f64> = values
        .iter()
        .map(|&v| if v.is_finite() { v } else { f64::MIN })
        .collect();
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));
    let mut rank = vec![0usize; values.len()];
    for (pos, &idx) in order.iter().enumerate() {
        rank[idx] = pos;
    }

    let mut visited = vec![false; values.len()];
    let mut components = Components::new(values.len());
    let mut peaks: Vec<Peak> = Vec::new();
    let mut peak_slot = vec![usize::MAX; values.len()];
    let mut adjacent = Vec::with_capacity(8);
    let mut roots = Vec::with_capacity(8);

    for &idx in &order {
        adjacent.clear();
        neighbours(idx, &mut adjacent);
        roots.clear();
        for &n in &adjacent {
            if visited[n] {
                let root = components.find(n);
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
        }
        visited[idx] = true;

        if roots.is_empty() {
            peak_slot[idx] = peaks.len();
            peaks.push(Peak {
                index: idx,
                value: values[idx],
                persistence: f64::INFINITY,
            });
            continue;
        }

        // The component whose peak was reached first is the elder and survives.
        roots.sort_by_key(|&root| rank[components.birth[root]]);
        let elder = roots[0];
        components.parent[idx] = elder;
        for &younger in &roots[1..] {
            let born = components.birth[younger];
            if let Some(peak) = peaks.get_mut(peak_slot[born]) {
                peak.persistence = values[born] - values[idx];
            }
            components.parent[younger] = elder;
        }
    }

    let floor = values[order[order.len() - 1]];
    for peak in peaks.iter_mut() {
        if peak.persistence.is_infinite() {
            peak.persistence = peak.value - floor;
        }
    }
    peaks.sort_by(|a, b| {
        b.persistence
            .partial_cmp(&a.persistence)
            .unwrap_or(Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_hump_has_one_peak() {
        let values = [0.0, 0.2, 0.6, 1.0, 0.7, 0.3, 0.1];
        assert_eq!(count_peaks_1d(&values, 0.5), 1);
        let peaks = persistent_peaks_1d(&values);
        assert_eq!(peaks[0].index, 3);
        assert!((peaks[0].persistence - 1.0).abs() < 1e-12);
    }

    #[test]
    fn flat_sequence_counts_as_one_peak() {
        assert_eq!(count_peaks_1d(&[0.3; 12], 0.5), 1);
        assert_eq!(count_peaks_2d(&Array2::from_elem((5, 5), 7.0), 30.0), 1);
    }

    #[test]
    fn empty_input_has_no_peaks() {
        assert_eq!(count_peaks_1d(&[], 0.5), 0);
        assert!(persistent_peaks_1d(&[]).is_empty());
    }

    #[test]
    fn second_peak_persistence_is_drop_to_saddle() {
        let values = [0.0, 1.0, 0.2, 0.8, 0.0];
        let peaks = persistent_peaks_1d(&values);
        let second = peaks.iter().find(|p| p.index == 3).unwrap();
        assert!((second.persistence - 0.6).abs() < 1e-12);
        assert_eq!(count_peaks_1d(&values, 0.5), 2);
        assert_eq!(count_peaks_1d(&values, 0.7), 1);
    }

    #[test]
    fn shallow_bumps_are_filtered() {
        let values = [1.0, 0.9, 0.95, 0.9, 0.0];
        assert_eq!(count_peaks_1d(&values, 0.5), 1);
    }

    #[test]
    fn endpoints_can_be_peaks() {
        let values = [1.0, 0.0, 0.0, 0.0, 0.9];
        let peaks: Vec<usize> = significant(persistent_peaks_1d(&values), 0.5)
            .map(|p| p.index)
            .collect();
        assert_eq!(peaks.len(), 2);
        assert!(peaks.contains(&0));
        assert!(peaks.contains(&4));
    }

    #[test]
    fn tied_maxima_keep_the_lowest_index() {
        let values = [1.0, 0.0, 1.0];
        let peaks = persistent_peaks_1d(&values);
        assert_eq!(peaks[0].index, 0);
        assert!((peaks[1].persistence - 1.0).abs() < 1e-12);
    }

    #[test]
    fn two_blobs_in_a_grid() {
        let mut field = Array2::<f64>::zeros((9, 9));
        field[(2, 2)] = 200.0;
        field[(6, 6)] = 120.0;
        field[(6, 7)] = 10.0;
        assert_eq!(count_peaks_2d(&field, 30.0), 2);
        assert_eq!(count_peaks_2d(&field, 150.0), 1);
    }

    #[test]
    fn diagonal_neighbours_are_connected() {
        let mut field = Array2::<f64>::zeros((3, 3));
        field[(0, 0)] = 5.0;
        field[(1, 1)] = 4.0;
        let peaks = persistent_peaks_2d(&field);
        let significant: Vec<_> = significant(peaks, 0.5).collect();
        assert_eq!(significant.len(), 1);
        assert_eq!(significant[0].index, 0);
    }
}
