use std::cmp::Ordering;

use crate::pose::{clamp01, Pose, CHANNELS};

/// Samples a pose at time `t` from irregularly spaced frames using a
/// Catmull-Rom spline.
///
/// `times` must be non-decreasing. Edge frames are repeated as control
/// points, so the curve is flat beyond both ends instead of overshooting.
/// Queries outside the axis return the nearest edge frame.
pub fn sample(times: &[f64], frames: &[Pose], t: f64) -> Pose {
    let len = times.len().min(frames.len());
    match len {
        0 => return frames.first().copied().unwrap_or_default(),
        1 => return frames[0],
        _ => {}
    }
    if t.is_nan() {
        return frames[0];
    }
    let times = &times[..len];

    // First index whose time is strictly after `t`.
    let upper = times.partition_point(|sample| {
        sample.partial_cmp(&t).unwrap_or(Ordering::Less) != Ordering::Greater
    });
    match upper {
        0 => return frames[0],
        u if u == len => return frames[len - 1],
        _ => {}
    }
    let at = |index: isize| frames[index.clamp(0, len as isize - 1) as usize];
    let i = upper as isize;
    let (p0, p1, p2, p3) = (at(i - 2), at(i - 1), at(i), at(i + 1));

    let start = times[(i - 1) as usize];
    let end = times[i as usize];
    let width = end - start;
    let u = if width > 0.0 && t.is_finite() {
        ((t - start) / width).clamp(0.0, 1.0) as f32
    } else {
        0.0
    };

    let mut out = [0.0; CHANNELS];
    for (channel, slot) in out.iter_mut().enumerate() {
        *slot = clamp01(catmull_rom(
            p0.channel(channel),
            p1.channel(channel),
            p2.channel(channel),
            p3.channel(channel),
            u,
        ));
    }
    Pose::new(out)
}

/// Uniform Catmull-Rom segment between `p1` (u = 0) and `p2` (u = 1).
pub fn catmull_rom(p0: f32, p1: f32, p2: f32, p3: f32, u: f32) -> f32 {
    let u2 = u * u;
    let u3 = u2 * u;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * u
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * u2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * u3)
}
