use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::Zipf;
use ringsketch::sketch::RingSketch;

fn main() {
    // Split a sketch into two children that partition the key domain, keep
    // feeding each child its own share of the stream, then merge them back
    // and compare against the unsplit original.
    let dist = Zipf::new(5_000.0, 1.1).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let stream: Vec<u64> = (0..500_000).map(|_| rng.sample(dist) as u64).collect();
    let (first_half, second_half) = stream.split_at(250_000);

    let build = || {
        RingSketch::builder()
            .depth(4)
            .width(256)
            .kll_k(30)
            .seed(11)
            .build()
            .unwrap()
    };

    let mut parent = build();
    for &item in first_half {
        parent.update(item);
    }

    println!("Splitting width-256 sketch into 128 + 128...");
    let (mut left, mut right) = RingSketch::split(&parent, 128, 128).unwrap();
    println!("left owns {} arc(s):", left.get_partition_ranges().len());
    for arc in left.get_partition_ranges() {
        println!("  ({:#018x}, {:#018x}]", arc.lo, arc.hi);
    }

    let mut to_left = 0u64;
    let mut to_right = 0u64;
    for &item in second_half {
        if left.is_responsible_for(item) {
            left.update(item);
            to_left += 1;
        } else {
            right.update(item);
            to_right += 1;
        }
    }
    println!("\nRouted {to_left} items to the left child, {to_right} to the right");

    println!("\nMerging the children back together...");
    let merged = RingSketch::merge(&left, &right).unwrap();

    let mut reference = build();
    for &item in &stream {
        reference.update(item);
    }

    let mut freqs: HashMap<u64, u64> = HashMap::new();
    for &item in &stream {
        *freqs.entry(item).or_insert(0) += 1;
    }
    let mut items: Vec<(u64, u64)> = freqs.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));

    println!("\n{:>6} {:>10} {:>12} {:>12}", "rank", "true", "merged", "unsplit");
    for (rank, &(item, count)) in items.iter().take(10).enumerate() {
        println!(
            "{:>6} {:>10} {:>12.1} {:>12.1}",
            rank + 1,
            count,
            merged.estimate(item),
            reference.estimate(item)
        );
    }
}
