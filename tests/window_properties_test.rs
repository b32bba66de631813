//! Randomised properties of the input window
//!
//! Sample streams are split into random chunk sizes; the windows that come
//! out must not depend on how the stream was chunked.

use gesture_engine::input::{FeedStatus, Window, WindowConfig, WindowMode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const AXES: usize = 3;

fn config(mode: WindowMode, window_size: usize, window_shift: usize) -> WindowConfig {
    WindowConfig {
        mode,
        unique_num: AXES,
        window_size,
        window_shift,
        usage_mask: None,
    }
}

/// Stream of `vectors` vectors where axis `a` of vector `t` is `t * 10 + a`
fn ramp(vectors: usize) -> Vec<f32> {
    (0..vectors)
        .flat_map(|t| (0..AXES).map(move |a| (t * 10 + a) as f32))
        .collect()
}

/// Feed `stream` in random whole-vector chunks, collecting every window
fn windows_of(window: &mut Window<f32>, stream: &[f32], rng: &mut StdRng) -> Vec<Vec<f32>> {
    let mut windows = Vec::new();
    let mut rest = stream;
    while !rest.is_empty() {
        let vectors = rng.gen_range(1..=rest.len() / AXES);
        let (chunk, tail) = rest.split_at(vectors * AXES);
        let mut chunk = chunk;
        while !chunk.is_empty() {
            match window.feed(chunk).unwrap() {
                FeedStatus::Ready { consumed } => {
                    windows.push(window.data().to_vec());
                    chunk = &chunk[consumed..];
                }
                FeedStatus::InProgress => break,
            }
        }
        rest = tail;
    }
    windows
}

#[test]
fn test_short_streams_never_complete() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let size = rng.gen_range(2..16);
        let mut window = Window::<f32>::new(&config(WindowMode::Discrete, size, 0)).unwrap();
        let short = ramp(rng.gen_range(1..size));
        assert!(windows_of(&mut window, &short, &mut rng).is_empty());
        assert!(!window.is_ready());
        assert_eq!(window.filled() * AXES, short.len());
    }
}

#[test]
fn test_discrete_windows_independent_of_chunking() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..50 {
        let size = rng.gen_range(1..12);
        let count = rng.gen_range(1..5);
        let stream = ramp(size * count);

        let mut window = Window::<f32>::new(&config(WindowMode::Discrete, size, 0)).unwrap();
        let windows = windows_of(&mut window, &stream, &mut rng);
        assert_eq!(windows.len(), count);

        for (n, data) in windows.iter().enumerate() {
            for a in 0..AXES {
                let axis = &data[a * size..(a + 1) * size];
                let expected: Vec<f32> = (0..size)
                    .map(|i| ((n * size + i) * 10 + a) as f32)
                    .collect();
                assert_eq!(axis, expected.as_slice());
            }
        }
    }
}

#[test]
fn test_sliding_windows_overlap() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..50 {
        let size = rng.gen_range(2..12);
        let shift = rng.gen_range(1..=size);
        let extra = rng.gen_range(0..4);
        let stream = ramp(size + extra * shift);

        let mut window = Window::<f32>::new(&config(WindowMode::Sliding, size, shift)).unwrap();
        let windows = windows_of(&mut window, &stream, &mut rng);
        assert_eq!(windows.len(), 1 + extra);

        for pair in windows.windows(2) {
            for a in 0..AXES {
                let prev = &pair[0][a * size..(a + 1) * size];
                let next = &pair[1][a * size..(a + 1) * size];
                assert_eq!(&prev[shift..], &next[..size - shift]);
            }
        }
        // window k starts at vector k * shift
        for (k, data) in windows.iter().enumerate() {
            assert_eq!(data[0], (k * shift * 10) as f32);
        }
    }
}

#[test]
fn test_no_window_completes_on_every_vector() {
    let mut rng = StdRng::seed_from_u64(31);
    let mut window = Window::<f32>::new(&config(WindowMode::NoWindow, 1, 0)).unwrap();
    let stream = ramp(20);
    let windows = windows_of(&mut window, &stream, &mut rng);
    assert_eq!(windows.len(), 20);
    for (t, data) in windows.iter().enumerate() {
        assert_eq!(data.as_slice(), &stream[t * AXES..(t + 1) * AXES]);
    }
}
