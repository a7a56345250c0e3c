/// Objective (dissimilarity) function selector.
///
/// All variants are lower-is-better. The sum-based kinds are normalized by
/// the sample count so that scores stay comparable across resolution levels
/// and template sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveKind {
    /// Sum of absolute differences.
    Sad,
    /// Sum of squared differences.
    Ssd,
    /// Zero-mean SSD: insensitive to intensity offsets.
    Zssd,
    /// SSD normalized by the reference intensity range: insensitive to
    /// intensity scale.
    Nssd,
    /// Zero-mean normalized SSD: insensitive to offset and scale. The most
    /// robust and most expensive kind, and the recommended default.
    Znssd,
}

/// Scores a candidate subvolume against the reference subvolume.
///
/// Both slices must have equal length. Returns `f32::INFINITY` when the
/// statistics required by the kind are degenerate (flat reference or
/// candidate), which marks the candidate as non-evaluable rather than
/// aborting the search.
pub fn score(kind: ObjectiveKind, reference: &[f32], candidate: &[f32]) -> f32 {
    debug_assert_eq!(reference.len(), candidate.len());
    if reference.is_empty() {
        return f32::INFINITY;
    }
    let n = reference.len() as f32;

    match kind {
        ObjectiveKind::Sad => {
            let mut acc = 0.0f32;
            for (&r, &c) in reference.iter().zip(candidate) {
                acc += (r - c).abs();
            }
            acc / n
        }
        ObjectiveKind::Ssd => ssd(reference, candidate) / n,
        ObjectiveKind::Zssd => {
            let rm = mean(reference);
            let cm = mean(candidate);
            let mut acc = 0.0f32;
            for (&r, &c) in reference.iter().zip(candidate) {
                let d = (r - rm) - (c - cm);
                acc += d * d;
            }
            acc / n
        }
        ObjectiveKind::Nssd => {
            let (lo, hi) = min_max(reference);
            let range = hi - lo;
            if range <= f32::EPSILON {
                return f32::INFINITY;
            }
            ssd(reference, candidate) / (n * range * range)
        }
        ObjectiveKind::Znssd => {
            let rm = mean(reference);
            let cm = mean(candidate);
            let mut rvar = 0.0f32;
            let mut cvar = 0.0f32;
            for (&r, &c) in reference.iter().zip(candidate) {
                rvar += (r - rm) * (r - rm);
                cvar += (c - cm) * (c - cm);
            }
            let rsig = (rvar / n).sqrt();
            let csig = (cvar / n).sqrt();
            if rsig <= f32::EPSILON || csig <= f32::EPSILON {
                return f32::INFINITY;
            }
            let mut acc = 0.0f32;
            for (&r, &c) in reference.iter().zip(candidate) {
                let d = (r - rm) / rsig - (c - cm) / csig;
                acc += d * d;
            }
            acc / n
        }
    }
}

fn ssd(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = 0.0f32;
    for (&x, &y) in a.iter().zip(b) {
        let d = x - y;
        acc += d * d;
    }
    acc
}

fn mean(v: &[f32]) -> f32 {
    v.iter().sum::<f32>() / v.len() as f32
}

fn min_max(v: &[f32]) -> (f32, f32) {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &x in v {
        lo = lo.min(x);
        hi = hi.max(x);
    }
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::{ObjectiveKind, score};

    const ALL: [ObjectiveKind; 5] = [
        ObjectiveKind::Sad,
        ObjectiveKind::Ssd,
        ObjectiveKind::Zssd,
        ObjectiveKind::Nssd,
        ObjectiveKind::Znssd,
    ];

    #[test]
    fn identical_samples_score_zero() {
        let r = [1.0f32, 5.0, 9.0, 2.0, 7.0];
        for kind in ALL {
            let s = score(kind, &r, &r);
            assert!(s.abs() < 1e-6, "{kind:?} scored {s}");
        }
    }

    #[test]
    fn zssd_ignores_intensity_offset() {
        let r = [1.0f32, 5.0, 9.0, 2.0];
        let c: Vec<f32> = r.iter().map(|v| v + 40.0).collect();

        assert!(score(ObjectiveKind::Ssd, &r, &c) > 1.0);
        assert!(score(ObjectiveKind::Zssd, &r, &c).abs() < 1e-4);
        assert!(score(ObjectiveKind::Znssd, &r, &c).abs() < 1e-4);
    }

    #[test]
    fn znssd_ignores_intensity_scale() {
        let r = [1.0f32, 5.0, 9.0, 2.0];
        let c: Vec<f32> = r.iter().map(|v| v * 3.0 + 10.0).collect();

        assert!(score(ObjectiveKind::Zssd, &r, &c) > 1.0);
        assert!(score(ObjectiveKind::Znssd, &r, &c).abs() < 1e-4);
    }

    #[test]
    fn degenerate_statistics_are_worst_score() {
        let flat = [3.0f32; 4];
        let varied = [1.0f32, 2.0, 3.0, 4.0];

        assert_eq!(score(ObjectiveKind::Nssd, &flat, &varied), f32::INFINITY);
        assert_eq!(score(ObjectiveKind::Znssd, &flat, &varied), f32::INFINITY);
        assert_eq!(score(ObjectiveKind::Znssd, &varied, &flat), f32::INFINITY);
        assert_eq!(score(ObjectiveKind::Sad, &[], &[]), f32::INFINITY);
    }

    #[test]
    fn worse_match_scores_higher() {
        let r = [1.0f32, 5.0, 9.0, 2.0, 7.0, 4.0];
        let near: Vec<f32> = r.iter().map(|v| v + 0.1).collect();
        let far: Vec<f32> = r.iter().rev().copied().collect();

        for kind in ALL {
            assert!(score(kind, &r, &near) < score(kind, &r, &far), "{kind:?}");
        }
    }
}
