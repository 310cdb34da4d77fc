use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::Zipf;
use ringsketch::sketch::RingSketch;

fn zipf_stream(len: usize, diversity: f64, exponent: f64, seed: u64) -> Vec<u64> {
    let dist = Zipf::new(diversity, exponent).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.sample(dist) as u64).collect()
}

fn are_top_k(sketch: &RingSketch, freqs: &HashMap<u64, u64>, k: usize) -> f64 {
    let mut items: Vec<(u64, u64)> = freqs.iter().map(|(&i, &c)| (i, c)).collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));
    items
        .iter()
        .take(k)
        .map(|&(item, count)| (sketch.estimate(item) - count as f64).abs() / count as f64)
        .sum::<f64>()
        / k as f64
}

fn main() {
    // A sketch sized for the first phase of a stream, grown mid-flight when
    // the workload outlives its budget, compared against a sketch that was
    // sized for the full stream from the start.
    let stream = zipf_stream(1_000_000, 10_000.0, 1.1, 7);
    let (first_half, second_half) = stream.split_at(500_000);

    let mut freqs: HashMap<u64, u64> = HashMap::new();
    for &item in &stream {
        *freqs.entry(item).or_insert(0) += 1;
    }

    println!("Building sketch with width=128 (depth=4, kll_k=30)...");
    let mut grown = RingSketch::builder()
        .depth(4)
        .width(128)
        .kll_k(30)
        .seed(1)
        .build()
        .unwrap();
    for &item in first_half {
        grown.update(item);
    }
    println!(
        "Ingested {} items, memory budget {} KiB",
        first_half.len(),
        grown.get_max_memory_usage() / 1024
    );

    println!("\nExpanding live sketch to width=512...");
    grown.expand(512).unwrap();
    println!(
        "New memory budget {} KiB; earlier estimates carried over",
        grown.get_max_memory_usage() / 1024
    );
    for &item in second_half {
        grown.update(item);
    }

    println!("\nBuilding reference sketch with width=512 over the full stream...");
    let mut fresh = RingSketch::builder()
        .depth(4)
        .width(512)
        .kll_k(30)
        .seed(1)
        .build()
        .unwrap();
    for &item in &stream {
        fresh.update(item);
    }

    let grown_are = are_top_k(&grown, &freqs, 100);
    let fresh_are = are_top_k(&fresh, &freqs, 100);
    println!("\nTop-100 average relative error:");
    println!("  expanded mid-stream: {grown_are:.4}");
    println!("  sized up front:      {fresh_are:.4}");

    println!("\nShrinking the expanded sketch back to width=128...");
    grown.shrink(128).unwrap();
    let shrunk_are = are_top_k(&grown, &freqs, 100);
    println!(
        "  after shrink:        {shrunk_are:.4} ({} KiB)",
        grown.get_max_memory_usage() / 1024
    );
}
